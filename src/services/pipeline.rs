use std::sync::Arc;

use chrono::Utc;
use url::Url;

use super::sentiment::SentimentAggregator;
use super::summary::SummaryRequester;
use crate::browser_ai::{BrowserLauncher, BrowserSession, ReviewCollector};
use crate::config::BrowserConfig;
use crate::error::{AppError, Result};
use crate::models::{AnalysisReport, CollectionRun, StageOutcome};

/// Collect, then analyze. Stages run one after another; the browser session
/// is released before any inference starts.
pub struct ReviewPipeline {
    launcher: Arc<dyn BrowserLauncher>,
    browser: BrowserConfig,
    collector: ReviewCollector,
    sentiment: SentimentAggregator,
    summary: SummaryRequester,
}

impl ReviewPipeline {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        browser: BrowserConfig,
        collector: ReviewCollector,
        sentiment: SentimentAggregator,
        summary: SummaryRequester,
    ) -> Self {
        Self {
            launcher,
            browser,
            collector,
            sentiment,
            summary,
        }
    }

    pub fn validate_url(product_url: &str) -> Result<Url> {
        let url = Url::parse(product_url.trim())
            .map_err(|e| AppError::InvalidInput(format!("'{}' is not a URL: {}", product_url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(AppError::InvalidInput(format!(
                "unsupported URL scheme '{}'",
                other
            ))),
        }
    }

    /// Acquires a browser, collects reviews and releases the browser on every
    /// path out of collection.
    pub async fn collect(&self, product_url: &str, max_reviews: usize) -> Result<CollectionRun> {
        let url = Self::validate_url(product_url)?;

        let mut session = BrowserSession::acquire(self.launcher.as_ref(), &self.browser).await?;
        let collected = match session.driver() {
            Ok(driver) => self.collector.collect(driver, url.as_str(), max_reviews).await,
            Err(e) => Err(e),
        };

        if let Err(e) = session.release().await {
            tracing::warn!(error = %e, "ignoring browser shutdown error");
        }

        collected
    }

    pub async fn run(&self, product_url: &str, max_reviews: usize) -> Result<AnalysisReport> {
        let run = self.collect(product_url, max_reviews).await?;
        let reviews = &run.reviews;
        tracing::info!(reviews = reviews.len(), stop = ?run.stop, "collected reviews");

        let sentiment = match self.sentiment.analyze(reviews).await {
            Ok(tally) => StageOutcome::Completed(tally),
            Err(e) => {
                tracing::error!(error = %e, "sentiment stage failed");
                StageOutcome::Failed(e.to_string())
            }
        };

        let summary = match self.summary.summarize(reviews).await {
            Ok(summary) => StageOutcome::Completed(summary),
            Err(AppError::EmptyInput(reason)) => {
                tracing::info!(%reason, "summary skipped");
                StageOutcome::Skipped(reason)
            }
            Err(e) => {
                tracing::error!(error = %e, "summary stage failed");
                StageOutcome::Failed(e.to_string())
            }
        };

        Ok(AnalysisReport {
            product_url: product_url.trim().to_string(),
            reviews: run.reviews,
            stop: run.stop,
            scroll_rounds: run.scroll_rounds,
            sentiment,
            summary,
            finished_at: Utc::now(),
        })
    }
}
