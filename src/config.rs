use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Root configuration for an annotation deployment
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Model identifiers under evaluation; each one names a directory under `outputs_dir`
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// Dataset positions shown to every rater, in order
    #[serde(default = "default_eval_indices")]
    pub eval_indices: Vec<usize>,
    /// JSON file holding the samples
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
    /// Base directory for relative input image paths in the dataset
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    /// Directory holding `<model>/<sample_index>.png`
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: PathBuf,
    /// Directory receiving the finished CSV files
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Address the HTTP server listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Page heading
    #[serde(default = "default_title")]
    pub title: String,
    /// Question the best/worst picker answers
    #[serde(default = "default_question")]
    pub question: String,
    /// Add a "none of them is the worst" option to the worst picker
    #[serde(default)]
    pub offer_no_worst: bool,
    /// Fixed shuffle seed shared by every session (random per session when unset)
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
    /// Idle time after which a session is discarded
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

fn default_models() -> Vec<String> {
    ["pixinstruct", "got", "chameleon-sft", "chameleon-unsup-sft"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_eval_indices() -> Vec<usize> {
    vec![
        0, 1, 2, 3, 50, 51, 52, 53, 54, 55, 100, 101, 102, 103, 104, 105, 106, 200, 201, 202, 203,
        204, 350, 351, 352, 353, 354,
    ]
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("test.json")
}

fn default_data_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_outputs_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_bind_addr() -> String {
    "127.0.0.1:8501".to_string()
}

fn default_title() -> String {
    "Anonymous Human Evaluation for Image Editing Models".to_string()
}

fn default_question() -> String {
    "1. Did the model correctly perform the editing?".to_string()
}

fn default_session_ttl() -> u64 {
    4 * 60 * 60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: default_models(),
            eval_indices: default_eval_indices(),
            dataset_path: default_dataset_path(),
            data_root: default_data_root(),
            outputs_dir: default_outputs_dir(),
            results_dir: default_results_dir(),
            bind_addr: default_bind_addr(),
            title: default_title(),
            question: default_question(),
            offer_no_worst: false,
            shuffle_seed: None,
            session_ttl_secs: default_session_ttl(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Check the structural constraints the evaluation flow relies on
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            bail!("at least one model is required");
        }
        let mut seen = HashSet::new();
        for model in &self.models {
            if model.trim().is_empty() {
                bail!("model names must not be empty");
            }
            if !seen.insert(model.as_str()) {
                bail!("duplicate model: {model}");
            }
        }

        if self.eval_indices.is_empty() {
            bail!("eval_indices must not be empty");
        }
        // Going back purges by sample index, so a repeated index would lose records.
        let mut seen = HashSet::new();
        for index in &self.eval_indices {
            if !seen.insert(*index) {
                bail!("duplicate evaluation index: {index}");
            }
        }
        Ok(())
    }
}
