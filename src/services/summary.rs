use std::sync::Arc;

use crate::config::SummarizerConfig;
use crate::error::{AppError, Result};
use crate::llm::{InputTruncator, Summarizer};
use crate::models::{GenerationParams, ReviewSet, Summary};

/// Joins the reviews into one document, cuts it to the input token budget
/// and asks the summarizer for a bounded-length summary.
#[derive(Clone)]
pub struct SummaryRequester {
    summarizer: Arc<dyn Summarizer>,
    truncator: Arc<InputTruncator>,
    max_input_tokens: usize,
    params: GenerationParams,
}

impl SummaryRequester {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        truncator: Arc<InputTruncator>,
        max_input_tokens: usize,
        params: GenerationParams,
    ) -> Self {
        Self {
            summarizer,
            truncator,
            max_input_tokens,
            params,
        }
    }

    pub fn from_config(
        summarizer: Arc<dyn Summarizer>,
        truncator: Arc<InputTruncator>,
        config: &SummarizerConfig,
    ) -> Self {
        Self::new(
            summarizer,
            truncator,
            config.max_input_tokens,
            GenerationParams {
                max_length: config.max_length,
                min_length: config.min_length,
                num_beams: config.num_beams,
                length_penalty: config.length_penalty,
            },
        )
    }

    pub async fn summarize(&self, reviews: &ReviewSet) -> Result<Summary> {
        if reviews.is_empty() {
            return Err(AppError::EmptyInput("no reviews to summarize".into()));
        }

        let document = reviews.joined();
        let input = self.truncator.truncate(&document, self.max_input_tokens)?;
        if input.truncated {
            tracing::info!(
                kept_tokens = input.tokens,
                budget = self.max_input_tokens,
                "summary input truncated"
            );
        }

        let text = self.summarizer.summarize(&input.text, &self.params).await?;
        if text.trim().is_empty() {
            return Err(AppError::Generation("summarizer returned empty text".into()));
        }

        Ok(Summary {
            text,
            input_tokens: input.tokens,
            input_truncated: input.truncated,
        })
    }
}
