use async_trait::async_trait;
use genai::chat::{ChatMessage, ChatRequest};
use genai::Client;

use super::{Classifier, Summarizer};
use crate::error::{AppError, Result};
use crate::models::{Classification, GenerationParams};

/// Chat-model backend reached through `genai` (Ollama by default, or any
/// provider genai resolves from the model name).
pub struct LlmClient {
    client: Client,
    model_name: String,
    labels: Vec<String>,
}

impl LlmClient {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model_name: model_name.into(),
            labels: vec!["긍정".to_string(), "부정".to_string()],
        }
    }

    /// Label vocabulary the classifier prompt allows.
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        if !labels.is_empty() {
            self.labels = labels;
        }
        self
    }

    async fn send_request(&self, system: &str, prompt: &str) -> std::result::Result<String, String> {
        let chat_req = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(prompt)]);

        let chat_response = self
            .client
            .exec_chat(&self.model_name, chat_req, None)
            .await
            .map_err(|e| format!("LLM request failed: {}", e))?;

        chat_response
            .content_text_as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| "Empty response from LLM".to_string())
    }

    fn classification_prompt(&self, texts: &[String]) -> String {
        let numbered = texts
            .iter()
            .enumerate()
            .map(|(i, text)| format!("{}. {}", i + 1, text.replace('\n', " ")))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Classify the sentiment of each of the following {} product reviews.\n\
            Allowed labels: {}\n\n\
            {}\n\n\
            Respond with only a JSON array of {} label strings, one per review, in order.",
            texts.len(),
            serde_json::to_string(&self.labels).unwrap_or_default(),
            numbered,
            texts.len()
        )
    }
}

/// Pulls the JSON payload out of a reply that may wrap it in a markdown fence.
fn extract_json(text: &str) -> std::result::Result<serde_json::Value, String> {
    let cleaned = if text.contains("```json") {
        text.split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(text)
    } else if text.contains("```") {
        text.split("```").nth(1).unwrap_or(text)
    } else {
        text
    };

    serde_json::from_str(cleaned.trim()).map_err(|e| format!("Failed to parse JSON response: {}", e))
}

#[async_trait]
impl Classifier for LlmClient {
    async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>> {
        tracing::debug!(model = %self.model_name, inputs = texts.len(), "classifying with LLM");
        let response = self
            .send_request(
                "You are a sentiment classifier for e-commerce reviews.",
                &self.classification_prompt(texts),
            )
            .await
            .map_err(AppError::Classification)?;

        let json_response = extract_json(&response).map_err(AppError::Classification)?;
        let labels: Vec<String> = json_response
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        if labels.len() != texts.len() {
            return Err(AppError::Classification(format!(
                "Expected {} labels from LLM, got {}",
                texts.len(),
                labels.len()
            )));
        }

        // Chat models report no calibrated score.
        Ok(labels
            .into_iter()
            .map(|label| Classification {
                label,
                confidence: 1.0,
            })
            .collect())
    }
}

#[async_trait]
impl Summarizer for LlmClient {
    async fn summarize(&self, document: &str, params: &GenerationParams) -> Result<String> {
        tracing::debug!(
            model = %self.model_name,
            num_beams = params.num_beams,
            length_penalty = params.length_penalty,
            "beam settings do not apply to chat models"
        );

        let prompt = format!(
            "Summarize the following product reviews in the language they are written in. \
            Use between {} and {} tokens. Mention the most common praise and complaints.\n\n\
            Reviews:\n{}",
            params.min_length, params.max_length, document
        );

        let summary = self
            .send_request("You write concise summaries of customer reviews.", &prompt)
            .await
            .map_err(AppError::Generation)?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(AppError::Generation("Empty summary from LLM".into()));
        }
        Ok(summary.to_string())
    }
}
