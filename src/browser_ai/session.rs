use super::driver::{BrowserDriver, BrowserLauncher};
use crate::config::BrowserConfig;
use crate::error::{AppError, Result};

/// Exclusive owner of one launched browser. Release it explicitly with
/// [`BrowserSession::release`]; dropping an unreleased session schedules the
/// shutdown on the current tokio runtime instead.
pub struct BrowserSession {
    driver: Option<Box<dyn BrowserDriver>>,
}

impl BrowserSession {
    pub async fn acquire(launcher: &dyn BrowserLauncher, config: &BrowserConfig) -> Result<Self> {
        tracing::debug!(headless = config.headless, "acquiring browser session");
        let driver = launcher.launch(config).await?;
        tracing::info!("browser session acquired");
        Ok(Self::from_driver(driver))
    }

    pub fn from_driver(driver: Box<dyn BrowserDriver>) -> Self {
        Self { driver: Some(driver) }
    }

    pub fn driver(&self) -> Result<&dyn BrowserDriver> {
        self.driver.as_deref().ok_or(AppError::SessionReleased)
    }

    pub fn is_released(&self) -> bool {
        self.driver.is_none()
    }

    /// Quits the browser. Safe to call repeatedly; only the first call
    /// reaches the driver.
    pub async fn release(&mut self) -> Result<()> {
        let Some(mut driver) = self.driver.take() else {
            tracing::debug!("browser session already released");
            return Ok(());
        };

        match driver.quit().await {
            Ok(()) => {
                tracing::info!("browser session released");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "browser did not shut down cleanly");
                Err(e)
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let Some(mut driver) = self.driver.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("browser session dropped without release, scheduling shutdown");
                handle.spawn(async move {
                    if let Err(e) = driver.quit().await {
                        tracing::error!(error = %e, "deferred browser shutdown failed");
                    }
                });
            }
            Err(_) => {
                tracing::error!("browser session dropped outside a runtime, process may linger");
            }
        }
    }
}
