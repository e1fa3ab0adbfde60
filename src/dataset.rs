use crate::models::{InputImage, Sample};
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Static sample collection, loaded once at startup and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// Load a JSON array of `{"instruction", "input"}` objects
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

        let samples: Vec<Sample> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dataset JSON: {}", path.display()))?;

        Ok(Self::new(samples))
    }

    /// Build from samples in dataset order; each sample's index is its position
    pub fn new(mut samples: Vec<Sample>) -> Self {
        for (index, sample) in samples.iter_mut().enumerate() {
            sample.index = index;
        }
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Fail if any evaluation index points past the end of the dataset
    pub fn check_indices(&self, indices: &[usize]) -> Result<()> {
        let missing: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|index| *index >= self.samples.len())
            .collect();

        if !missing.is_empty() {
            bail!(
                "evaluation indices {:?} are outside the dataset ({} samples)",
                missing,
                self.samples.len()
            );
        }
        Ok(())
    }
}

/// Resolve a sample's input reference against the data root
pub fn input_image(sample: &Sample, data_root: &Path) -> InputImage {
    if sample.input.starts_with("http://") || sample.input.starts_with("https://") {
        InputImage::Url(sample.input.clone())
    } else {
        InputImage::File(data_root.join(&sample.input))
    }
}
