//! On-disk fixtures shared by the unit tests

use crate::config::Config;
use crate::dataset::Dataset;
use crate::models::Sample;
use crate::presenter::output_image_path;
use tempfile::TempDir;

/// Temp directory holding `samples` inputs and one output per model per sample.
///
/// The evaluation list covers every sample in order and the shuffle seed is fixed.
pub fn fixture(models: &[&str], samples: usize) -> (TempDir, Config, Dataset) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let config = Config {
        models: models.iter().map(|m| m.to_string()).collect(),
        eval_indices: (0..samples).collect(),
        data_root: root.to_path_buf(),
        outputs_dir: root.join("outputs"),
        results_dir: root.join("results"),
        shuffle_seed: Some(1),
        ..Config::default()
    };

    std::fs::create_dir_all(root.join("inputs")).unwrap();
    let mut dataset_samples = Vec::new();
    for index in 0..samples {
        let input = format!("inputs/{index}.png");
        std::fs::write(root.join(&input), format!("input-{index}")).unwrap();
        for model in models {
            let path = output_image_path(&config.outputs_dir, model, index);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, format!("{model}-{index}")).unwrap();
        }
        dataset_samples.push(Sample {
            index,
            instruction: format!("edit number {index}"),
            input,
        });
    }
    (temp_dir, config, Dataset::new(dataset_samples))
}
