use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Classification, GenerationParams};

mod client;
mod huggingface;
mod tokenizer;

pub use client::LlmClient;
pub use huggingface::HuggingFaceModel;
pub use tokenizer::{InputTruncator, TruncatedInput};

/// Text classification service. Returns exactly one result per input, in
/// input order. Failures are `AppError::Classification`.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>>;
}

/// Abstractive summarization service. Failures are `AppError::Generation`.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, document: &str, params: &GenerationParams) -> Result<String>;
}
