//! Scroll-driven review collection against a lazily rendered product page.
//!
//! The loop stops on the first of: the review cap is reached, the page height
//! stays unchanged for `stall_rounds` consecutive rounds, or
//! `max_scroll_rounds` rounds have run. Every wait is a bounded readiness poll.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::driver::BrowserDriver;
use super::readiness::wait_until;
use crate::config::CollectorConfig;
use crate::error::{AppError, Result};
use crate::models::{CollectionRun, ReviewSet, StopReason};

/// Transient loop state, alive for one `collect` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollState {
    pub last_height: u64,
    pub stalled_rounds: usize,
    pub round: usize,
}

impl ScrollState {
    pub fn new(initial_height: u64) -> Self {
        Self {
            last_height: initial_height,
            stalled_rounds: 0,
            round: 0,
        }
    }

    /// Records the height measured after a round. Returns true when the
    /// height has now been flat for `stall_limit` consecutive rounds.
    pub fn observe(&mut self, height: u64, stall_limit: usize) -> bool {
        self.round += 1;
        if height == self.last_height {
            self.stalled_rounds += 1;
        } else {
            self.stalled_rounds = 0;
            self.last_height = height;
        }
        self.stalled_rounds >= stall_limit
    }
}

#[derive(Debug, Clone)]
pub struct ReviewCollector {
    config: CollectorConfig,
}

impl ReviewCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms.max(1))
    }

    /// Navigates to `product_url`, opens the review section and scrolls until
    /// a stop condition holds. A page without a review section yields an
    /// empty set with [`StopReason::ReviewSectionMissing`].
    pub async fn collect(
        &self,
        driver: &dyn BrowserDriver,
        product_url: &str,
        max_reviews: usize,
    ) -> Result<CollectionRun> {
        driver.navigate(product_url).await?;

        match self.open_review_section(driver, product_url).await {
            Ok(()) => {}
            Err(AppError::ReviewSectionNotFound(url)) => {
                tracing::warn!(url = %url, "no review section, returning zero reviews");
                return Ok(CollectionRun {
                    reviews: ReviewSet::with_capacity(max_reviews),
                    stop: StopReason::ReviewSectionMissing,
                    scroll_rounds: 0,
                });
            }
            Err(e) => return Err(e),
        }

        self.scroll_and_extract(driver, max_reviews).await
    }

    async fn open_review_section(&self, driver: &dyn BrowserDriver, product_url: &str) -> Result<()> {
        let tab_selector = self.config.review_tab_selector.as_str();

        // The tab is rendered client-side; poll for it instead of sleeping.
        let looked_up = AtomicBool::new(false);
        let last_error: Mutex<Option<AppError>> = Mutex::new(None);
        let (looked_up_ref, last_error_ref) = (&looked_up, &last_error);
        let tab_visible = wait_until(
            Duration::from_millis(self.config.page_settle_ms),
            self.poll_interval(),
            || async move {
                match driver.find(tab_selector).await {
                    Ok(found) => {
                        looked_up_ref.store(true, Ordering::Relaxed);
                        !found.is_empty()
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "review tab lookup failed, retrying");
                        if let Ok(mut slot) = last_error_ref.lock() {
                            *slot = Some(e);
                        }
                        false
                    }
                }
            },
        )
        .await;

        // A page whose scripts never ran is broken, not missing a section.
        if !tab_visible && !looked_up.load(Ordering::Relaxed) {
            let last_error = last_error.into_inner().unwrap_or_else(|p| p.into_inner());
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let tab = if tab_visible {
            driver.find(tab_selector).await?.into_iter().next()
        } else {
            None
        };
        let Some(tab) = tab else {
            return Err(AppError::ReviewSectionNotFound(product_url.to_string()));
        };

        tracing::debug!(href = ?tab.href, "activating review section");
        driver.click(&tab).await?;

        let review_selector = self.config.review_selector.as_str();
        let rendered = wait_until(
            Duration::from_millis(self.config.tab_settle_ms),
            self.poll_interval(),
            || async move {
                driver
                    .find(review_selector)
                    .await
                    .map(|nodes| !nodes.is_empty())
                    .unwrap_or(false)
            },
        )
        .await;
        if !rendered {
            tracing::debug!("no review nodes after opening the section yet");
        }

        Ok(())
    }

    async fn scroll_and_extract(
        &self,
        driver: &dyn BrowserDriver,
        max_reviews: usize,
    ) -> Result<CollectionRun> {
        let review_selector = self.config.review_selector.as_str();
        let mut reviews = ReviewSet::with_capacity(max_reviews);
        let mut state = ScrollState::new(driver.page_height().await?);
        // Nodes rendered by opening the section must not satisfy round 1's wait.
        let mut visible_nodes = driver.find(review_selector).await?.len();

        let stop = loop {
            if reviews.len() >= max_reviews {
                break StopReason::CapReached;
            }
            if state.round >= self.config.max_scroll_rounds {
                break StopReason::RoundLimit;
            }

            driver.scroll_to_bottom().await?;

            // Lazy loading shows up as page growth or more review nodes.
            let last_height = state.last_height;
            let baseline_nodes = visible_nodes;
            wait_until(
                Duration::from_millis(self.config.scroll_wait_ms),
                self.poll_interval(),
                || async move {
                    let grew = matches!(driver.page_height().await, Ok(h) if h != last_height);
                    let more = matches!(
                        driver.find(review_selector).await,
                        Ok(nodes) if nodes.len() > baseline_nodes
                    );
                    grew || more
                },
            )
            .await;

            let nodes = driver.find(review_selector).await?;
            visible_nodes = nodes.len();
            let added = reviews.extend_from_texts(nodes.iter().map(|n| n.text.as_str()));

            let height = driver.page_height().await?;
            let stalled = state.observe(height, self.config.stall_rounds);
            tracing::debug!(
                round = state.round,
                height,
                nodes = visible_nodes,
                added,
                total = reviews.len(),
                "scroll round finished"
            );

            if reviews.len() >= max_reviews {
                break StopReason::CapReached;
            }
            if stalled {
                break StopReason::Stalled;
            }
        };

        reviews.truncate(max_reviews);
        tracing::info!(
            reviews = reviews.len(),
            rounds = state.round,
            stop = ?stop,
            "review collection finished"
        );

        Ok(CollectionRun {
            reviews,
            stop,
            scroll_rounds: state.round,
        })
    }
}
