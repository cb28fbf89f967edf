use hf_hub::api::tokio::ApiBuilder;
use hf_hub::{Cache, Repo};
use std::path::Path;
use tokenizers::Tokenizer;

use crate::error::{AppError, Result};

/// Input text cut to a token budget.
#[derive(Debug, Clone, PartialEq)]
pub struct TruncatedInput {
    pub text: String,
    /// Tokens kept.
    pub tokens: usize,
    pub truncated: bool,
}

/// Cuts summarizer input at token boundaries.
pub enum InputTruncator {
    Pretrained(Box<Tokenizer>),
    Whitespace,
}

impl InputTruncator {
    /// Loads `tokenizer.json` for `repo_id`, from the local hub cache when
    /// present, otherwise from the hub.
    pub async fn load(repo_id: &str, cache_dir: &Path, token: Option<String>) -> Result<Self> {
        let cached = Cache::new(cache_dir.to_path_buf())
            .repo(Repo::model(repo_id.to_string()))
            .get("tokenizer.json");

        let path = match cached {
            Some(path) => {
                tracing::debug!(repo = repo_id, path = %path.display(), "tokenizer found in cache");
                path
            }
            None => {
                tracing::info!(repo = repo_id, "downloading tokenizer");
                let api = ApiBuilder::new()
                    .with_cache_dir(cache_dir.to_path_buf())
                    .with_token(token)
                    .build()
                    .map_err(|e| AppError::Tokenizer(format!("Failed to build hub client: {}", e)))?;
                api.model(repo_id.to_string())
                    .get("tokenizer.json")
                    .await
                    .map_err(|e| AppError::Tokenizer(format!("Failed to fetch tokenizer for {}: {}", repo_id, e)))?
            }
        };

        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| AppError::Tokenizer(format!("Failed to load {}: {}", path.display(), e)))?;
        Ok(InputTruncator::Pretrained(Box::new(tokenizer)))
    }

    pub fn truncate(&self, text: &str, max_tokens: usize) -> Result<TruncatedInput> {
        match self {
            InputTruncator::Pretrained(tokenizer) => truncate_pretrained(tokenizer, text, max_tokens),
            InputTruncator::Whitespace => Ok(truncate_whitespace(text, max_tokens)),
        }
    }
}

fn truncate_pretrained(tokenizer: &Tokenizer, text: &str, max_tokens: usize) -> Result<TruncatedInput> {
    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| AppError::Tokenizer(format!("Failed to encode input: {}", e)))?;

    let total = encoding.get_ids().len();
    if total <= max_tokens {
        return Ok(TruncatedInput {
            text: text.to_string(),
            tokens: total,
            truncated: false,
        });
    }

    // Prefer slicing the original text at the last kept token's byte offset;
    // decode the ids when the offset is unusable.
    let by_offset = max_tokens
        .checked_sub(1)
        .and_then(|last| encoding.get_offsets().get(last))
        .and_then(|&(_, end)| text.get(..end))
        .map(str::to_string);

    let kept = match by_offset {
        Some(kept) => kept,
        None => tokenizer
            .decode(&encoding.get_ids()[..max_tokens], true)
            .map_err(|e| AppError::Tokenizer(format!("Failed to decode input: {}", e)))?,
    };

    Ok(TruncatedInput {
        text: kept,
        tokens: max_tokens,
        truncated: true,
    })
}

fn truncate_whitespace(text: &str, max_tokens: usize) -> TruncatedInput {
    let words: Vec<&str> = text.split_whitespace().collect();
    let truncated = words.len() > max_tokens;
    let kept = &words[..words.len().min(max_tokens)];

    TruncatedInput {
        text: kept.join(" "),
        tokens: kept.len(),
        truncated,
    }
}
