#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use reviewanalyzer_lib::browser_ai::{BrowserDriver, BrowserLauncher, ElementHandle};
use reviewanalyzer_lib::config::{BrowserConfig, CollectorConfig};
use reviewanalyzer_lib::error::{AppError, Result};
use reviewanalyzer_lib::llm::{Classifier, Summarizer};
use reviewanalyzer_lib::models::{Classification, GenerationParams};

pub const TAB_SELECTOR: &str = "#review-tab";
pub const REVIEW_SELECTOR: &str = ".review";

/// Page content after the n-th scroll. Scrolls past the last stage keep
/// showing the last stage.
#[derive(Debug, Clone)]
pub struct Stage {
    pub reviews: Vec<String>,
    pub height: u64,
}

impl Stage {
    pub fn new(reviews: &[&str], height: u64) -> Self {
        Self {
            reviews: reviews.iter().map(|r| r.to_string()).collect(),
            height,
        }
    }
}

#[derive(Debug, Default)]
pub struct PageCounters {
    pub navigations: usize,
    pub clicks: usize,
    pub scrolls: usize,
    pub quits: usize,
    pub scrolled_at: Vec<Instant>,
}

/// A fake product page that reveals more reviews as it is scrolled.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    pub stages: Vec<Stage>,
    pub has_review_tab: bool,
    pub fail_navigation: bool,
    pub broken_scripts: bool,
    pub fail_scroll_at: Option<usize>,
    /// How long after a scroll the next batch shows up.
    pub load_delay: Duration,
    pub counters: Arc<Mutex<PageCounters>>,
}

impl ScriptedPage {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            has_review_tab: true,
            fail_navigation: false,
            broken_scripts: false,
            fail_scroll_at: None,
            load_delay: Duration::ZERO,
            counters: Arc::new(Mutex::new(PageCounters::default())),
        }
    }

    pub fn without_review_tab(mut self) -> Self {
        self.has_review_tab = false;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// Every DOM lookup fails, as when page scripts cannot be evaluated.
    pub fn with_broken_scripts(mut self) -> Self {
        self.broken_scripts = true;
        self
    }

    /// The n-th scroll (1-based) fails with a browser error.
    pub fn failing_scroll_at(mut self, n: usize) -> Self {
        self.fail_scroll_at = Some(n);
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn scrolls(&self) -> usize {
        self.counters.lock().unwrap().scrolls
    }

    pub fn quits(&self) -> usize {
        self.counters.lock().unwrap().quits
    }

    pub fn clicks(&self) -> usize {
        self.counters.lock().unwrap().clicks
    }

    pub fn driver(&self) -> ScriptedDriver {
        ScriptedDriver { page: self.clone() }
    }

    fn current(&self) -> &Stage {
        let loaded = self
            .counters
            .lock()
            .unwrap()
            .scrolled_at
            .iter()
            .filter(|at| at.elapsed() >= self.load_delay)
            .count();
        let last = self.stages.len().saturating_sub(1);
        &self.stages[loaded.min(last)]
    }
}

pub struct ScriptedDriver {
    page: ScriptedPage,
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page.counters.lock().unwrap().navigations += 1;
        if self.page.fail_navigation {
            return Err(AppError::Navigation(format!("{}: net::ERR_NAME_NOT_RESOLVED", url)));
        }
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        if self.page.broken_scripts {
            return Err(AppError::Browser("Failed to execute script: target closed".into()));
        }
        let found = match selector {
            TAB_SELECTOR if self.page.has_review_tab => vec![ElementHandle {
                selector: selector.to_string(),
                index: 0,
                text: "상품평".to_string(),
                href: Some("#sdpReview".to_string()),
            }],
            REVIEW_SELECTOR if self.page.clicks() > 0 => self
                .page
                .current()
                .reviews
                .iter()
                .enumerate()
                .map(|(index, text)| ElementHandle {
                    selector: selector.to_string(),
                    index,
                    text: text.clone(),
                    href: None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(found)
    }

    async fn click(&self, _element: &ElementHandle) -> Result<()> {
        self.page.counters.lock().unwrap().clicks += 1;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        let mut counters = self.page.counters.lock().unwrap();
        counters.scrolls += 1;
        if self.page.fail_scroll_at == Some(counters.scrolls) {
            return Err(AppError::Browser("Failed to execute script: page crashed".into()));
        }
        counters.scrolled_at.push(Instant::now());
        Ok(())
    }

    async fn page_height(&self) -> Result<u64> {
        Ok(self.page.current().height)
    }

    async fn quit(&mut self) -> Result<()> {
        self.page.counters.lock().unwrap().quits += 1;
        Ok(())
    }
}

pub struct ScriptedLauncher {
    pub page: ScriptedPage,
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self, _config: &BrowserConfig) -> Result<Box<dyn BrowserDriver>> {
        Ok(Box::new(self.page.driver()))
    }
}

pub struct BrokenLauncher;

#[async_trait]
impl BrowserLauncher for BrokenLauncher {
    async fn launch(&self, _config: &BrowserConfig) -> Result<Box<dyn BrowserDriver>> {
        Err(AppError::Launch("chrome executable not found".into()))
    }
}

/// Labels reviews by a keyword, or fails every call.
pub struct KeywordClassifier {
    pub fail: bool,
    pub calls: Mutex<usize>,
}

impl KeywordClassifier {
    pub fn working() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(AppError::Classification("503 model is loading".into()));
        }
        Ok(texts
            .iter()
            .map(|text| Classification {
                label: if text.contains("별로") { "LABEL_0" } else { "LABEL_1" }.to_string(),
                confidence: 0.9,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingSummarizer {
    pub documents: Mutex<Vec<String>>,
}

impl RecordingSummarizer {
    pub fn calls(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize(&self, document: &str, _params: &GenerationParams) -> Result<String> {
        self.documents.lock().unwrap().push(document.to_string());
        Ok("전반적으로 만족스럽다는 평이 많습니다.".to_string())
    }
}

pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(&self, _document: &str, _params: &GenerationParams) -> Result<String> {
        Err(AppError::Generation("503 model is loading".into()))
    }
}

pub fn fast_collector_config(max_reviews: usize) -> CollectorConfig {
    CollectorConfig {
        max_reviews,
        review_tab_selector: TAB_SELECTOR.to_string(),
        review_selector: REVIEW_SELECTOR.to_string(),
        page_settle_ms: 20,
        tab_settle_ms: 20,
        scroll_wait_ms: 5,
        poll_interval_ms: 1,
        ..CollectorConfig::default()
    }
}
