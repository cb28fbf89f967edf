use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::llm::Classifier;
use crate::models::{ReviewSet, SentimentTally};

/// Runs the whole review set through a classifier in one call and counts
/// the labels.
#[derive(Clone)]
pub struct SentimentAggregator {
    classifier: Arc<dyn Classifier>,
    label_map: BTreeMap<String, String>,
}

impl SentimentAggregator {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            label_map: BTreeMap::new(),
        }
    }

    /// Renames raw model labels (e.g. `LABEL_0`) before counting.
    pub fn with_label_map(mut self, label_map: BTreeMap<String, String>) -> Self {
        self.label_map = label_map;
        self
    }

    pub async fn analyze(&self, reviews: &ReviewSet) -> Result<SentimentTally> {
        if reviews.is_empty() {
            return Ok(SentimentTally::new());
        }

        let texts = reviews.texts();
        let results = self.classifier.classify(&texts).await?;
        if results.len() != texts.len() {
            return Err(AppError::Classification(format!(
                "Classifier returned {} labels for {} reviews",
                results.len(),
                texts.len()
            )));
        }

        let tally: SentimentTally = results
            .into_iter()
            .map(|result| {
                self.label_map
                    .get(&result.label)
                    .cloned()
                    .unwrap_or(result.label)
            })
            .collect();

        tracing::info!(reviews = texts.len(), labels = tally.len(), "sentiment tallied");
        Ok(tally)
    }
}
