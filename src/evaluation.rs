use crate::models::DisplayEntry;
use std::collections::HashMap;

/// Label of the "no best" sentinel option
pub const NO_BEST_LABEL: &str = "None of them is the best";
/// Label of the "no worst" sentinel option, only offered when enabled
pub const NO_WORST_LABEL: &str = "None of them is the worst";

const NONE_VALUE: &str = "none";

pub const BEST_SCORE: i8 = 1;
pub const WORST_SCORE: i8 = -1;
pub const NEUTRAL_SCORE: i8 = 0;

/// One radio selection: the sentinel or a 1-based display slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    None,
    Slot(usize),
}

impl Choice {
    /// Value carried by the radio input
    pub fn form_value(&self) -> String {
        match self {
            Choice::None => NONE_VALUE.to_string(),
            Choice::Slot(slot) => slot.to_string(),
        }
    }

    /// Parse a submitted radio value; `None` when it names no offered option
    fn parse(value: &str, slots: usize, allow_none: bool) -> Option<Self> {
        if value == NONE_VALUE {
            return allow_none.then_some(Choice::None);
        }
        match value.parse::<usize>() {
            Ok(slot) if (1..=slots).contains(&slot) => Some(Choice::Slot(slot)),
            _ => None,
        }
    }
}

/// The rater's best/worst pair for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub best: Choice,
    pub worst: Choice,
}

impl Selection {
    /// Best and worst name the same output
    pub fn is_conflicting(&self) -> bool {
        matches!((self.best, self.worst), (Choice::Slot(b), Choice::Slot(w)) if b == w)
    }
}

/// One radio option as rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOption {
    pub choice: Choice,
    pub label: String,
}

/// Best/worst picker and the score encoding behind it
#[derive(Debug, Clone)]
pub struct PreferenceCollector {
    offer_no_worst: bool,
}

impl PreferenceCollector {
    pub fn new(offer_no_worst: bool) -> Self {
        Self { offer_no_worst }
    }

    /// Options for the best picker: the sentinel, then every tag
    pub fn best_options(&self, entries: &[DisplayEntry]) -> Vec<PickerOption> {
        let mut options = vec![PickerOption {
            choice: Choice::None,
            label: NO_BEST_LABEL.to_string(),
        }];
        options.extend(Self::tag_options(entries));
        options
    }

    /// Options for the worst picker: every tag, preceded by the sentinel if enabled
    pub fn worst_options(&self, entries: &[DisplayEntry]) -> Vec<PickerOption> {
        let mut options = Vec::new();
        if self.offer_no_worst {
            options.push(PickerOption {
                choice: Choice::None,
                label: NO_WORST_LABEL.to_string(),
            });
        }
        options.extend(Self::tag_options(entries));
        options
    }

    fn tag_options(entries: &[DisplayEntry]) -> impl Iterator<Item = PickerOption> + '_ {
        entries.iter().map(|entry| PickerOption {
            choice: Choice::Slot(entry.slot),
            label: entry.tag.clone(),
        })
    }

    /// Each picker starts on its first option
    pub fn default_selection(&self) -> Selection {
        Selection {
            best: Choice::None,
            worst: if self.offer_no_worst {
                Choice::None
            } else {
                Choice::Slot(1)
            },
        }
    }

    /// Interpret submitted radio values, falling back to the defaults for anything unrecognized
    pub fn parse_selection(&self, best: Option<&str>, worst: Option<&str>, slots: usize) -> Selection {
        let defaults = self.default_selection();
        Selection {
            best: best
                .and_then(|value| Choice::parse(value, slots, true))
                .unwrap_or(defaults.best),
            worst: worst
                .and_then(|value| Choice::parse(value, slots, self.offer_no_worst))
                .unwrap_or(defaults.worst),
        }
    }

    /// Score every displayed model.
    ///
    /// Both sentinels zero everything. Otherwise the best slot scores 1, the worst
    /// slot -1 and the rest 0, with the best check taking precedence: a slot chosen
    /// as both best and worst scores 1.
    pub fn encode_scores(&self, entries: &[DisplayEntry], selection: &Selection) -> HashMap<String, i8> {
        entries
            .iter()
            .map(|entry| (entry.model.clone(), Self::score_entry(entry, selection)))
            .collect()
    }

    fn score_entry(entry: &DisplayEntry, selection: &Selection) -> i8 {
        if selection.best == Choice::None && selection.worst == Choice::None {
            NEUTRAL_SCORE
        } else if selection.best == Choice::Slot(entry.slot) {
            BEST_SCORE
        } else if selection.worst == Choice::Slot(entry.slot) {
            WORST_SCORE
        } else {
            NEUTRAL_SCORE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entries(models: &[&str]) -> Vec<DisplayEntry> {
        models
            .iter()
            .enumerate()
            .map(|(i, model)| DisplayEntry {
                slot: i + 1,
                tag: format!("Model {}", i + 1),
                model: model.to_string(),
                image_path: PathBuf::from(format!("outputs/{model}/0.png")),
            })
            .collect()
    }

    #[test]
    fn test_best_and_worst_scores() {
        let collector = PreferenceCollector::new(false);
        let entries = entries(&["a", "b", "c", "d"]);
        let selection = Selection {
            best: Choice::Slot(2),
            worst: Choice::Slot(3),
        };

        let scores = collector.encode_scores(&entries, &selection);
        assert_eq!(scores["a"], 0);
        assert_eq!(scores["b"], 1);
        assert_eq!(scores["c"], -1);
        assert_eq!(scores["d"], 0);
    }

    #[test]
    fn test_no_best_still_scores_worst() {
        let collector = PreferenceCollector::new(false);
        let entries = entries(&["a", "b", "c", "d"]);
        let selection = collector.parse_selection(Some("none"), None, entries.len());
        assert_eq!(selection.worst, Choice::Slot(1));

        let scores = collector.encode_scores(&entries, &selection);
        assert_eq!(scores["a"], -1);
        assert_eq!(scores.values().filter(|s| **s == 1).count(), 0);
        assert_eq!(scores.values().filter(|s| **s == 0).count(), 3);
    }

    #[test]
    fn test_both_sentinels_zero_everything() {
        let collector = PreferenceCollector::new(true);
        let entries = entries(&["a", "b", "c"]);
        let selection = collector.parse_selection(Some("none"), Some("none"), entries.len());

        let scores = collector.encode_scores(&entries, &selection);
        assert!(scores.values().all(|s| *s == 0));
    }

    #[test]
    fn test_same_slot_best_and_worst_scores_best() {
        let collector = PreferenceCollector::new(false);
        let entries = entries(&["a", "b", "c"]);
        let selection = Selection {
            best: Choice::Slot(2),
            worst: Choice::Slot(2),
        };
        assert!(selection.is_conflicting());

        let scores = collector.encode_scores(&entries, &selection);
        assert_eq!(scores["b"], 1);
        assert!(scores.values().all(|s| *s >= 0));
    }

    #[test]
    fn test_parse_selection_falls_back_to_defaults() {
        let collector = PreferenceCollector::new(false);
        let selection = collector.parse_selection(Some("7"), Some("none"), 4);
        assert_eq!(selection, collector.default_selection());

        let selection = collector.parse_selection(Some("4"), Some("0"), 4);
        assert_eq!(selection.best, Choice::Slot(4));
        assert_eq!(selection.worst, Choice::Slot(1));
    }

    #[test]
    fn test_options() {
        let entries = entries(&["a", "b"]);

        let collector = PreferenceCollector::new(false);
        let best: Vec<String> = collector.best_options(&entries).into_iter().map(|o| o.label).collect();
        assert_eq!(best, vec![NO_BEST_LABEL, "Model 1", "Model 2"]);
        let worst: Vec<String> = collector.worst_options(&entries).into_iter().map(|o| o.label).collect();
        assert_eq!(worst, vec!["Model 1", "Model 2"]);

        let collector = PreferenceCollector::new(true);
        let worst = collector.worst_options(&entries);
        assert_eq!(worst[0].choice, Choice::None);
        assert_eq!(worst[0].label, NO_WORST_LABEL);
        assert_eq!(collector.default_selection().worst, Choice::None);
    }

    #[test]
    fn test_form_values() {
        assert_eq!(Choice::None.form_value(), "none");
        assert_eq!(Choice::Slot(3).form_value(), "3");
    }
}
