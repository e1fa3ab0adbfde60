use crate::config::Config;
use crate::dataset::{self, Dataset};
use crate::error::{AppError, Result};
use crate::models::{DisplayEntry, InputImage, Sample, SampleView};
use crate::session::SessionState;
use std::path::{Path, PathBuf};

/// Location of a model's pre-rendered output for a sample
pub fn output_image_path(outputs_dir: &Path, model: &str, sample_index: usize) -> PathBuf {
    outputs_dir.join(model).join(format!("{sample_index}.png"))
}

/// Anonymized display list for a frozen model order: `Model 1..N` in that order
pub fn display_list(outputs_dir: &Path, sample_index: usize, order: &[String]) -> Vec<DisplayEntry> {
    order
        .iter()
        .enumerate()
        .map(|(i, model)| DisplayEntry {
            slot: i + 1,
            tag: format!("Model {}", i + 1),
            model: model.clone(),
            image_path: output_image_path(outputs_dir, model, sample_index),
        })
        .collect()
}

/// Resolves the sample under a session's cursor into what the page shows
pub struct SamplePresenter<'a> {
    config: &'a Config,
    dataset: &'a Dataset,
}

impl<'a> SamplePresenter<'a> {
    pub fn new(config: &'a Config, dataset: &'a Dataset) -> Self {
        Self { config, dataset }
    }

    /// Sample index at a cursor position, `None` once the list is exhausted
    pub fn sample_index_at(&self, position: usize) -> Option<usize> {
        self.config.eval_indices.get(position).copied()
    }

    pub fn sample(&self, index: usize) -> Option<&'a Sample> {
        self.dataset.get(index)
    }

    /// Display list for a sample, freezing its shuffle order in the session
    pub fn entries(&self, session: &mut SessionState, sample_index: usize) -> Vec<DisplayEntry> {
        let order = session.shuffle_order(sample_index, &self.config.models);
        display_list(&self.config.outputs_dir, sample_index, order)
    }

    /// Build the view for the current cursor; `Ok(None)` when every sample is done.
    ///
    /// Every image the page references must exist on disk.
    pub fn present(&self, session: &mut SessionState) -> Result<Option<SampleView>> {
        let position = session.cursor();
        let Some(sample_index) = self.sample_index_at(position) else {
            return Ok(None);
        };
        let sample = self
            .sample(sample_index)
            .ok_or(AppError::SampleNotFound(sample_index))?
            .clone();

        let input_image = dataset::input_image(&sample, &self.config.data_root);
        if let InputImage::File(path) = &input_image {
            ensure_exists(path)?;
        }

        let entries = self.entries(session, sample_index);
        for entry in &entries {
            ensure_exists(&entry.image_path)?;
        }

        Ok(Some(SampleView {
            position,
            total: self.config.eval_indices.len(),
            sample,
            input_image,
            entries,
        }))
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AppError::MissingImage(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture;

    #[test]
    fn test_output_image_path() {
        assert_eq!(
            output_image_path(Path::new("outputs"), "got", 52),
            PathBuf::from("outputs/got/52.png")
        );
    }

    #[test]
    fn test_display_list_tags_follow_order() {
        let order = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        let entries = display_list(Path::new("out"), 4, &order);

        let tags: Vec<(&str, &str)> = entries.iter().map(|e| (e.tag.as_str(), e.model.as_str())).collect();
        assert_eq!(tags, vec![("Model 1", "c"), ("Model 2", "a"), ("Model 3", "b")]);
        assert_eq!(entries[0].slot, 1);
        assert_eq!(entries[2].image_path, PathBuf::from("out/b/4.png"));
    }

    #[test]
    fn test_present_current_sample() {
        let (_temp_dir, config, dataset) = fixture(&["a", "b", "c", "d"], 2);
        let presenter = SamplePresenter::new(&config, &dataset);
        let mut session = SessionState::new(3);
        session.advance();

        let view = presenter.present(&mut session).unwrap().unwrap();
        assert_eq!(view.position, 1);
        assert_eq!(view.total, 2);
        assert_eq!(view.sample.index, 1);
        assert_eq!(view.sample.instruction, "edit number 1");
        assert_eq!(view.entries.len(), 4);
        assert!(matches!(view.input_image, InputImage::File(_)));
    }

    #[test]
    fn test_present_is_stable_across_visits() {
        let (_temp_dir, config, dataset) = fixture(&["a", "b", "c", "d", "e"], 2);
        let presenter = SamplePresenter::new(&config, &dataset);
        let mut session = SessionState::new(99);

        let first = presenter.present(&mut session).unwrap().unwrap();
        session.advance();
        presenter.present(&mut session).unwrap();
        session.retreat();
        let again = presenter.present(&mut session).unwrap().unwrap();

        assert_eq!(first.entries, again.entries);
    }

    #[test]
    fn test_present_past_the_end() {
        let (_temp_dir, config, dataset) = fixture(&["a"], 1);
        let presenter = SamplePresenter::new(&config, &dataset);
        let mut session = SessionState::new(0);
        session.advance();

        assert!(presenter.present(&mut session).unwrap().is_none());
    }

    #[test]
    fn test_present_missing_output_image() {
        let (_temp_dir, config, dataset) = fixture(&["a", "b"], 1);
        let missing = output_image_path(&config.outputs_dir, "b", 0);
        std::fs::remove_file(&missing).unwrap();

        let presenter = SamplePresenter::new(&config, &dataset);
        let mut session = SessionState::new(0);
        let err = presenter.present(&mut session).unwrap_err();
        assert!(matches!(err, AppError::MissingImage(path) if path == missing));
    }
}
