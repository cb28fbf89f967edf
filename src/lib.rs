pub mod browser_ai;
pub mod config;
pub mod error;
pub mod init;
pub mod llm;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use init::AppServices;
