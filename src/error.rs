use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Review section not found on {0}")]
    ReviewSectionNotFound(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Browser session already released")]
    SessionReleased,

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Collection failures that abort the whole run, as opposed to per-stage
    /// inference failures that only fail their own stage.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Launch(_)
                | AppError::Navigation(_)
                | AppError::Browser(_)
                | AppError::SessionReleased
                | AppError::InvalidInput(_)
                | AppError::Configuration(_)
        )
    }
}

impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.to_string()
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
