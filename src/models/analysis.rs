use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::review::ReviewSet;

/// One classifier result, positionally matched to its input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    #[serde(alias = "score")]
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentimentTally(BTreeMap<String, usize>);

impl SentimentTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: impl Into<String>) {
        *self.0.entry(label.into()).or_insert(0) += 1;
    }

    pub fn get(&self, label: &str) -> usize {
        self.0.get(label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Highest count first, label order among equal counts.
    pub fn by_count(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> =
            self.0.iter().map(|(label, count)| (label.as_str(), *count)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

impl<S: Into<String>> FromIterator<S> for SentimentTally {
    fn from_iter<I: IntoIterator<Item = S>>(labels: I) -> Self {
        let mut tally = SentimentTally::new();
        for label in labels {
            tally.record(label);
        }
        tally
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
    pub num_beams: usize,
    pub length_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 128,
            min_length: 30,
            num_beams: 4,
            length_penalty: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub input_tokens: usize,
    pub input_truncated: bool,
}

/// How the scroll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    CapReached,
    Stalled,
    RoundLimit,
    ReviewSectionMissing,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionRun {
    pub reviews: ReviewSet,
    pub stop: StopReason,
    pub scroll_rounds: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum StageOutcome<T> {
    Completed(T),
    Skipped(String),
    Failed(String),
}

impl<T> StageOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            StageOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub product_url: String,
    pub reviews: ReviewSet,
    pub stop: StopReason,
    pub scroll_rounds: usize,
    pub sentiment: StageOutcome<SentimentTally>,
    pub summary: StageOutcome<Summary>,
    pub finished_at: DateTime<Utc>,
}
