use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Upper bound accepted for `collector.max_reviews`.
pub const MAX_REVIEWS_LIMIT: usize = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub collector: CollectorConfig,
    pub sentiment: SentimentConfig,
    pub summarizer: SummarizerConfig,
    pub services: ServicesConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub chrome_executable: Option<String>,
    pub user_agent: String,
    pub extra_args: Vec<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub launch_attempts: u32,
    pub launch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub max_reviews: usize,
    pub review_tab_selector: String,
    pub review_selector: String,
    pub max_scroll_rounds: usize,
    pub stall_rounds: usize,
    pub page_settle_ms: u64,
    pub tab_settle_ms: u64,
    pub scroll_wait_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProvider {
    HuggingFace,
    Llm,
}

impl FromStr for InferenceProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(InferenceProvider::HuggingFace),
            "llm" | "genai" => Ok(InferenceProvider::Llm),
            other => Err(AppError::Configuration(format!(
                "Unknown inference provider: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub provider: InferenceProvider,
    pub model: String,
    /// Raw model label -> display label.
    pub label_map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub provider: InferenceProvider,
    pub model: String,
    /// Tokenizer repo used for input truncation. Falls back to whitespace
    /// tokens when unset.
    pub tokenizer: Option<String>,
    pub max_input_tokens: usize,
    pub max_length: usize,
    pub min_length: usize,
    pub num_beams: usize,
    pub length_penalty: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub hf_api_url: String,
    pub hf_api_token: Option<String>,
    pub llm_model: String,
    pub request_timeout_secs: u64,
    pub model_cache_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub preview_count: usize,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            user_agent: "Mozilla/5.0".to_string(),
            extra_args: vec![
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-blink-features=AutomationControlled".to_string(),
            ],
            window_width: 1280,
            window_height: 1024,
            launch_attempts: 3,
            launch_timeout_secs: 20,
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_reviews: 30,
            review_tab_selector: r#"a[href*="review"]"#.to_string(),
            review_selector: ".sdp-review__article__list__review__content".to_string(),
            max_scroll_rounds: 10,
            stall_rounds: 2,
            page_settle_ms: 3000,
            tab_settle_ms: 3000,
            scroll_wait_ms: 2000,
            poll_interval_ms: 100,
        }
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            provider: InferenceProvider::HuggingFace,
            model: "beomi/KcELECTRA-base".to_string(),
            label_map: BTreeMap::new(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: InferenceProvider::HuggingFace,
            model: "digit82/kobart-summarization".to_string(),
            tokenizer: Some("digit82/kobart-summarization".to_string()),
            max_input_tokens: 1024,
            max_length: 128,
            min_length: 30,
            num_beams: 4,
            length_penalty: 2.0,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            hf_api_url: "https://api-inference.huggingface.co/models".to_string(),
            hf_api_token: None,
            llm_model: "llama3.2:1b".to_string(),
            request_timeout_secs: 120,
            model_cache_dir: dirs::cache_dir()
                .map(|d| d.join("huggingface").join("hub").to_string_lossy().to_string())
                .unwrap_or_else(|| "./models".to_string()),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { preview_count: 5 }
    }
}

fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!(key, value = %raw, "ignoring unparsable environment override"),
        }
    }
}

fn env_override_opt(key: &str, target: &mut Option<String>) {
    if let Ok(raw) = std::env::var(key) {
        *target = if raw.trim().is_empty() { None } else { Some(raw) };
    }
}

impl Config {
    /// Defaults, then the TOML file if one is given and exists, then
    /// environment variables. Environment always wins.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                Config::default()
            }
            None => Config::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str::<Config>(&contents).map_err(|e| {
            AppError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn apply_env_overrides(&mut self) {
        env_override("BROWSER_HEADLESS", &mut self.browser.headless);
        env_override_opt("CHROME_EXECUTABLE", &mut self.browser.chrome_executable);
        env_override("BROWSER_USER_AGENT", &mut self.browser.user_agent);

        env_override("REVIEW_MAX_REVIEWS", &mut self.collector.max_reviews);
        env_override("REVIEW_TAB_SELECTOR", &mut self.collector.review_tab_selector);
        env_override("REVIEW_SELECTOR", &mut self.collector.review_selector);

        env_override("SENTIMENT_PROVIDER", &mut self.sentiment.provider);
        env_override("SENTIMENT_MODEL", &mut self.sentiment.model);

        env_override("SUMMARIZER_PROVIDER", &mut self.summarizer.provider);
        env_override("SUMMARIZER_MODEL", &mut self.summarizer.model);
        env_override_opt("SUMMARIZER_TOKENIZER", &mut self.summarizer.tokenizer);

        env_override("HF_API_URL", &mut self.services.hf_api_url);
        env_override_opt("HF_API_TOKEN", &mut self.services.hf_api_token);
        env_override("LLM_MODEL", &mut self.services.llm_model);
        env_override("MODEL_CACHE_DIR", &mut self.services.model_cache_dir);
        env_override("INFERENCE_TIMEOUT_SECS", &mut self.services.request_timeout_secs);
    }

    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.services.hf_api_url.starts_with("http://")
            && !self.services.hf_api_url.starts_with("https://")
        {
            errors.push("Invalid Hugging Face API URL format".to_string());
        }

        if self.browser.launch_attempts == 0 {
            errors.push("Browser launch attempts must be greater than 0".to_string());
        }

        let collector = &self.collector;
        if collector.max_reviews == 0 || collector.max_reviews > MAX_REVIEWS_LIMIT {
            errors.push(format!(
                "max_reviews must be between 1 and {}",
                MAX_REVIEWS_LIMIT
            ));
        }
        if collector.review_tab_selector.trim().is_empty() {
            errors.push("Review tab selector must not be empty".to_string());
        }
        if collector.review_selector.trim().is_empty() {
            errors.push("Review selector must not be empty".to_string());
        }
        if collector.max_scroll_rounds == 0 {
            errors.push("Scroll rounds must be greater than 0".to_string());
        }
        if collector.stall_rounds == 0 {
            errors.push("Stall rounds must be greater than 0".to_string());
        }
        if collector.poll_interval_ms == 0 {
            errors.push("Poll interval must be greater than 0".to_string());
        }

        let summarizer = &self.summarizer;
        if summarizer.max_input_tokens == 0 {
            errors.push("Summarizer input token budget must be greater than 0".to_string());
        }
        if summarizer.min_length > summarizer.max_length {
            errors.push("Summary min_length must not exceed max_length".to_string());
        }
        if summarizer.num_beams == 0 {
            errors.push("Beam count must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| AppError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)?;
        Ok(())
    }
}
