use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One image-editing task from the dataset
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Sample {
    /// Position in the dataset
    #[serde(skip)]
    pub index: usize,
    /// Editing instruction shown to the rater
    pub instruction: String,
    /// Input image: a path relative to the data root, or an http(s) URL
    pub input: String,
}

/// A scored judgment of one model's output on one sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationRecord {
    pub user_id: String,
    pub sample_index: usize,
    pub model: String,
    /// 1 for best, -1 for worst, 0 otherwise
    pub edit_score: i8,
}

/// One anonymized output as displayed to the rater
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    /// 1-based display position
    pub slot: usize,
    /// Anonymous label, `Model <slot>`
    pub tag: String,
    /// Backing model identifier, never sent to the browser
    pub model: String,
    /// Pre-rendered output image on disk
    pub image_path: PathBuf,
}

/// Where the browser should fetch a sample's input image from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputImage {
    Url(String),
    File(PathBuf),
}

/// Everything needed to render the sample under the cursor
#[derive(Debug, Clone)]
pub struct SampleView {
    /// Cursor position, 0-based
    pub position: usize,
    /// Number of samples in the evaluation list
    pub total: usize,
    pub sample: Sample,
    pub input_image: InputImage,
    pub entries: Vec<DisplayEntry>,
}
