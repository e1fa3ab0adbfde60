use crate::config::Config;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::evaluation::{NEUTRAL_SCORE, PreferenceCollector, Selection};
use crate::models::{AnnotationRecord, SampleView};
use crate::output;
use crate::presenter::SamplePresenter;
use crate::session::{Notice, SessionState};
use chrono::Local;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Submitted best/worst form for one sample
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    /// Sample the form was rendered for
    pub sample_index: usize,
    #[serde(default)]
    pub best: Option<String>,
    #[serde(default)]
    pub worst: Option<String>,
}

/// Back button form
#[derive(Debug, Clone, Deserialize)]
pub struct BackRequest {
    /// Sample the page was showing when the button was pressed
    pub sample_index: usize,
}

/// What a session page shows
#[derive(Debug)]
pub enum Page {
    /// No user id yet
    UserGate,
    /// The sample under the cursor
    Sample {
        view: SampleView,
        selection: Selection,
        can_go_back: bool,
    },
    /// All samples done and written to disk
    Complete { path: PathBuf },
}

/// Result of a submit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Recorded { sample_index: usize },
    Ignored,
}

/// Main runner that drives a session through the evaluation list
pub struct Runner {
    config: Config,
    dataset: Dataset,
    collector: PreferenceCollector,
}

impl Runner {
    /// Create a new runner with the given configuration and dataset
    pub fn new(config: Config, dataset: Dataset) -> Self {
        let collector = PreferenceCollector::new(config.offer_no_worst);
        Self {
            config,
            dataset,
            collector,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn collector(&self) -> &PreferenceCollector {
        &self.collector
    }

    pub fn presenter(&self) -> SamplePresenter<'_> {
        SamplePresenter::new(&self.config, &self.dataset)
    }

    /// Set or change the rater's id; ignored once the session is finished
    pub fn set_user_id(&self, session: &mut SessionState, user_id: &str) {
        if session.is_finalized() {
            return;
        }
        session.set_user_id(user_id);
        if session.user_id().is_empty() {
            session.set_notice(Notice::Warning("Please enter a user ID to begin.".to_string()));
        } else {
            info!("Session user id set to {:?}", session.user_id());
        }
    }

    /// Record one sample's judgments and move to the next sample.
    ///
    /// Submissions for any sample other than the one under the cursor are
    /// dropped, so a resent form never counts a sample twice.
    pub fn submit(&self, session: &mut SessionState, submission: &Submission) -> SubmitOutcome {
        if session.is_finalized() {
            debug!("Ignoring submission on a finished session");
            return SubmitOutcome::Ignored;
        }
        if session.user_id().is_empty() {
            session.set_notice(Notice::Warning("Please enter a user ID to begin.".to_string()));
            return SubmitOutcome::Ignored;
        }

        let presenter = self.presenter();
        let Some(sample_index) = presenter.sample_index_at(session.cursor()) else {
            return SubmitOutcome::Ignored;
        };
        if submission.sample_index != sample_index {
            debug!(
                "Ignoring stale submission for sample {} (current is {})",
                submission.sample_index, sample_index
            );
            return SubmitOutcome::Ignored;
        }

        let entries = presenter.entries(session, sample_index);
        let selection = self.collector.parse_selection(
            submission.best.as_deref(),
            submission.worst.as_deref(),
            entries.len(),
        );
        if selection.is_conflicting() {
            warn!(
                "Sample {}: same output chosen as best and worst ({:?}); recording it as best",
                sample_index, selection.best
            );
            session.set_notice(Notice::Info(
                "The previous sample had the same model selected as best and worst; it was recorded as best."
                    .to_string(),
            ));
        }

        let scores = self.collector.encode_scores(&entries, &selection);
        let user_id = session.user_id().to_string();
        let records: Vec<AnnotationRecord> = self
            .config
            .models
            .iter()
            .map(|model| AnnotationRecord {
                user_id: user_id.clone(),
                sample_index,
                model: model.clone(),
                edit_score: scores.get(model).copied().unwrap_or(NEUTRAL_SCORE),
            })
            .collect();

        session.purge_records(sample_index);
        session.append_records(records);
        session.remember_selection(sample_index, selection);
        session.advance();

        info!(
            "Recorded sample {} for {:?} ({}/{})",
            sample_index,
            user_id,
            session.cursor(),
            self.config.eval_indices.len()
        );
        SubmitOutcome::Recorded { sample_index }
    }

    /// Return to the previous sample, discarding its records so it can be redone.
    ///
    /// `from_sample` is the sample the back button was rendered on. A resent or
    /// double-clicked back form no longer matches the cursor and is dropped, so
    /// each press steps back exactly once.
    pub fn go_back(&self, session: &mut SessionState, from_sample: usize) -> bool {
        if session.is_finalized() {
            return false;
        }
        let presenter = self.presenter();
        let Some(current) = presenter.sample_index_at(session.cursor()) else {
            return false;
        };
        if from_sample != current {
            debug!(
                "Ignoring stale back request from sample {} (current is {})",
                from_sample, current
            );
            return false;
        }
        let Some(position) = session.retreat() else {
            return false;
        };
        let Some(sample_index) = presenter.sample_index_at(position) else {
            return false;
        };

        let purged = session.purge_records(sample_index);
        info!(
            "Returned to sample {} for {:?}, purged {} record(s)",
            sample_index,
            session.user_id(),
            purged
        );
        true
    }

    /// Resolve what the session should see now, finishing it when the list is exhausted
    pub async fn page(&self, session: &mut SessionState) -> Result<Page> {
        if let Some(path) = session.output_path() {
            return Ok(Page::Complete {
                path: path.to_path_buf(),
            });
        }
        if session.user_id().is_empty() {
            return Ok(Page::UserGate);
        }

        match self.presenter().present(session)? {
            Some(view) => {
                let selection = session
                    .selection(view.sample.index)
                    .unwrap_or_else(|| self.collector.default_selection());
                Ok(Page::Sample {
                    view,
                    selection,
                    can_go_back: session.cursor() > 0,
                })
            }
            None => {
                let path = self.finalize(session).await?;
                Ok(Page::Complete { path })
            }
        }
    }

    /// Write the session's records to CSV and make the session terminal.
    ///
    /// The file write runs on the blocking pool; the caller's session lock is
    /// held throughout, so a concurrent reload waits and then sees the result.
    async fn finalize(&self, session: &mut SessionState) -> Result<PathBuf> {
        let records = session.records().to_vec();
        let results_dir = self.config.results_dir.clone();
        let user_id = session.user_id().to_string();
        let finished_at = Local::now();

        let path = tokio::task::spawn_blocking(move || {
            output::write_annotations(&records, &results_dir, &user_id, finished_at)
        })
        .await??;
        session.mark_finalized(path.clone());
        Ok(path)
    }
}
