use crate::{
    browser_ai::{BrowserLauncher, ChromeLauncher, ReviewCollector},
    config::{Config, InferenceProvider},
    error::{AppError, Result},
    llm::{Classifier, HuggingFaceModel, InputTruncator, LlmClient, Summarizer},
    services::{ReviewPipeline, SentimentAggregator, SummaryRequester},
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Long-lived service handles, built once per process and passed explicitly.
pub struct AppServices {
    pub config: Config,
    pub launcher: Arc<dyn BrowserLauncher>,
    pub classifier: Arc<dyn Classifier>,
    pub summarizer: Arc<dyn Summarizer>,
    pub truncator: Arc<InputTruncator>,
}

impl AppServices {
    pub async fn initialize(config: Config) -> Result<Self> {
        if let Err(errors) = config.validate() {
            return Err(AppError::Configuration(errors.join("; ")));
        }

        let classifier = build_classifier(&config)?;
        let summarizer = build_summarizer(&config)?;

        let truncator = match &config.summarizer.tokenizer {
            Some(repo_id) => match InputTruncator::load(
                repo_id,
                Path::new(&config.services.model_cache_dir),
                config.services.hf_api_token.clone(),
            )
            .await
            {
                Ok(truncator) => {
                    tracing::info!(tokenizer = %repo_id, "tokenizer loaded");
                    truncator
                }
                Err(e) => {
                    tracing::warn!(error = %e, "falling back to whitespace tokens for summary input");
                    InputTruncator::Whitespace
                }
            },
            None => InputTruncator::Whitespace,
        };

        tracing::info!(
            sentiment = ?config.sentiment.provider,
            summarizer = ?config.summarizer.provider,
            "inference services initialized"
        );

        Ok(Self {
            launcher: Arc::new(ChromeLauncher::new()),
            classifier,
            summarizer,
            truncator: Arc::new(truncator),
            config,
        })
    }

    /// Assembles services from already-built parts.
    pub fn from_parts(
        config: Config,
        launcher: Arc<dyn BrowserLauncher>,
        classifier: Arc<dyn Classifier>,
        summarizer: Arc<dyn Summarizer>,
        truncator: InputTruncator,
    ) -> Self {
        Self {
            config,
            launcher,
            classifier,
            summarizer,
            truncator: Arc::new(truncator),
        }
    }

    pub fn pipeline(&self) -> ReviewPipeline {
        let sentiment = SentimentAggregator::new(self.classifier.clone())
            .with_label_map(self.config.sentiment.label_map.clone());
        let summary = SummaryRequester::from_config(
            self.summarizer.clone(),
            self.truncator.clone(),
            &self.config.summarizer,
        );

        ReviewPipeline::new(
            self.launcher.clone(),
            self.config.browser.clone(),
            ReviewCollector::new(self.config.collector.clone()),
            sentiment,
            summary,
        )
    }

    pub fn shutdown(self) {
        tracing::debug!("releasing inference services");
        drop(self);
    }
}

fn request_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.services.request_timeout_secs)
}

fn build_classifier(config: &Config) -> Result<Arc<dyn Classifier>> {
    Ok(match config.sentiment.provider {
        InferenceProvider::HuggingFace => Arc::new(HuggingFaceModel::new(
            &config.services.hf_api_url,
            &config.sentiment.model,
            config.services.hf_api_token.clone(),
            request_timeout(config),
        )?),
        InferenceProvider::Llm => {
            let mut labels: Vec<String> = config.sentiment.label_map.values().cloned().collect();
            labels.sort();
            labels.dedup();
            let client = LlmClient::new(config.services.llm_model.clone());
            if labels.is_empty() {
                Arc::new(client)
            } else {
                Arc::new(client.with_labels(labels))
            }
        }
    })
}

fn build_summarizer(config: &Config) -> Result<Arc<dyn Summarizer>> {
    Ok(match config.summarizer.provider {
        InferenceProvider::HuggingFace => Arc::new(HuggingFaceModel::new(
            &config.services.hf_api_url,
            &config.summarizer.model,
            config.services.hf_api_token.clone(),
            request_timeout(config),
        )?),
        InferenceProvider::Llm => Arc::new(LlmClient::new(config.services.llm_model.clone())),
    })
}
