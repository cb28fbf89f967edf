use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{Classifier, Summarizer};
use crate::error::{AppError, Result};
use crate::models::{Classification, GenerationParams};

/// A model served behind the Hugging Face inference HTTP contract
/// (`POST {base}/{model}` with `{"inputs", "parameters"}`).
#[derive(Clone)]
pub struct HuggingFaceModel {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationRow {
    Single(Classification),
    TopK(Vec<Classification>),
}

impl ClassificationRow {
    fn best(self) -> Option<Classification> {
        match self {
            ClassificationRow::Single(c) => Some(c),
            ClassificationRow::TopK(candidates) => candidates
                .into_iter()
                .max_by(|a, b| a.confidence.total_cmp(&b.confidence)),
        }
    }
}

#[derive(Deserialize)]
struct SummaryRow {
    #[serde(alias = "generated_text")]
    summary_text: String,
}

impl HuggingFaceModel {
    pub fn new(base_url: &str, model: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), model),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, body: &Value) -> std::result::Result<Value, String> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {}", self.endpoint, e))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| format!("invalid response body ({}): {}", status, e))?;

        if !status.is_success() {
            let message = payload
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| payload.to_string());
            return Err(format!("{} returned {}: {}", self.endpoint, status, message));
        }

        Ok(payload)
    }
}

fn parse_classifications(payload: Value, expected: usize) -> Result<Vec<Classification>> {
    let rows: Vec<ClassificationRow> = serde_json::from_value(payload)
        .map_err(|e| AppError::Classification(format!("Unexpected response shape: {}", e)))?;

    if rows.len() != expected {
        return Err(AppError::Classification(format!(
            "Expected {} results, got {}",
            expected,
            rows.len()
        )));
    }

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            row.best()
                .ok_or_else(|| AppError::Classification(format!("No label for input {}", i)))
        })
        .collect()
}

fn parse_summary(payload: Value) -> Result<String> {
    let rows: Vec<SummaryRow> = match payload {
        Value::Array(_) => serde_json::from_value(payload),
        other => serde_json::from_value(other).map(|row| vec![row]),
    }
    .map_err(|e| AppError::Generation(format!("Unexpected response shape: {}", e)))?;

    rows.into_iter()
        .next()
        .map(|row| row.summary_text.trim().to_string())
        .ok_or_else(|| AppError::Generation("Empty response from summarizer".into()))
}

#[async_trait]
impl Classifier for HuggingFaceModel {
    async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>> {
        tracing::debug!(endpoint = %self.endpoint, inputs = texts.len(), "classifying");
        let body = json!({
            "inputs": texts,
            "options": { "wait_for_model": true },
        });

        let payload = self.post(&body).await.map_err(AppError::Classification)?;
        parse_classifications(payload, texts.len())
    }
}

#[async_trait]
impl Summarizer for HuggingFaceModel {
    async fn summarize(&self, document: &str, params: &GenerationParams) -> Result<String> {
        tracing::debug!(endpoint = %self.endpoint, chars = document.len(), "summarizing");
        let body = json!({
            "inputs": document,
            "parameters": {
                "max_length": params.max_length,
                "min_length": params.min_length,
                "num_beams": params.num_beams,
                "length_penalty": params.length_penalty,
            },
            "options": { "wait_for_model": true },
        });

        let payload = self.post(&body).await.map_err(AppError::Generation)?;
        parse_summary(payload)
    }
}
