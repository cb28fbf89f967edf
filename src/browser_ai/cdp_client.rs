use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::driver::{BrowserDriver, BrowserLauncher, ElementHandle};
use crate::config::BrowserConfig;
use crate::error::{AppError, Result};

const SESSION_DIR_PREFIX: &str = "chromiumoxide-session-";
const STALE_SESSION_SECS: u64 = 3600;

/// Launches Chromium over the DevTools protocol.
#[derive(Debug, Default, Clone)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    pub fn new() -> Self {
        Self
    }

    fn build_config(config: &BrowserConfig, user_data_dir: &Path) -> Result<CdpConfig> {
        let mut builder = CdpConfig::builder()
            .window_size(config.window_width, config.window_height)
            .user_data_dir(user_data_dir)
            .launch_timeout(Duration::from_secs(config.launch_timeout_secs))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg(format!("--user-agent={}", config.user_agent));

        for arg in &config.extra_args {
            builder = builder.arg(arg.clone());
        }

        if let Some(executable) = &config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }

        builder = if config.headless {
            builder.new_headless_mode().arg("--disable-gpu")
        } else {
            builder.with_head()
        };

        builder
            .build()
            .map_err(|e| AppError::Launch(format!("Failed to build browser config: {}", e)))
    }

    async fn cleanup_old_sessions() {
        let Ok(entries) = std::fs::read_dir(std::env::temp_dir()) else {
            return;
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(SESSION_DIR_PREFIX) {
                continue;
            }

            let stale = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .map(|age| age.as_secs() > STALE_SESSION_SECS)
                .unwrap_or(false);

            if stale {
                match std::fs::remove_dir_all(entry.path()) {
                    Ok(()) => tracing::debug!(dir = name, "removed stale browser profile"),
                    Err(e) => tracing::debug!(dir = name, error = %e, "failed to remove stale browser profile"),
                }
            }
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, config: &BrowserConfig) -> Result<Box<dyn BrowserDriver>> {
        Self::cleanup_old_sessions().await;

        let user_data_dir = std::env::temp_dir().join(format!(
            "{}{}",
            SESSION_DIR_PREFIX,
            chrono::Utc::now().timestamp_millis()
        ));
        let cdp_config = Self::build_config(config, &user_data_dir)?;

        let attempts = config.launch_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            tracing::info!(attempt, headless = config.headless, "launching Chrome");

            match Browser::launch(cdp_config.clone()).await {
                Ok((browser, mut handler)) => {
                    let handler_task = tokio::spawn(async move {
                        while let Some(event) = handler.next().await {
                            if let Err(e) = event {
                                let error_str = format!("{:?}", e);
                                // Unknown CDP events fail to deserialize; they are harmless.
                                if !error_str.contains("data did not match any variant") {
                                    tracing::debug!(error = %e, "browser handler error");
                                }
                            }
                        }
                    });

                    let page = match browser.new_page("about:blank").await {
                        Ok(page) => page,
                        Err(e) => {
                            let mut driver = CdpDriver::new(browser, None, handler_task, user_data_dir);
                            let _ = driver.quit().await;
                            return Err(AppError::Launch(format!("Failed to create new page: {}", e)));
                        }
                    };

                    tracing::info!("Chrome launched, page created");
                    return Ok(Box::new(CdpDriver::new(
                        browser,
                        Some(page),
                        handler_task,
                        user_data_dir,
                    )));
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Chrome launch attempt failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_millis(1000 * attempt as u64)).await;
                    }
                }
            }
        }

        Err(AppError::Launch(format!(
            "Failed to launch browser after {} attempts: {}",
            attempts,
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string())
        )))
    }
}

pub struct CdpDriver {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    user_data_dir: Option<PathBuf>,
}

impl CdpDriver {
    fn new(
        browser: Browser,
        page: Option<Page>,
        handler_task: JoinHandle<()>,
        user_data_dir: PathBuf,
    ) -> Self {
        Self {
            browser: Some(browser),
            page,
            handler_task: Some(handler_task),
            user_data_dir: Some(user_data_dir),
        }
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| AppError::Browser("No page available".into()))
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .page()?
            .evaluate(script)
            .await
            .map_err(|e| AppError::Browser(format!("Failed to execute script: {}", e)))?;

        result
            .into_value()
            .map_err(|e| AppError::Browser(format!("Failed to get script result: {}", e)))
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        tracing::info!(url, "navigating");
        let page = self
            .page()
            .map_err(|e| AppError::Navigation(e.to_string()))?;

        page.goto(url)
            .await
            .map_err(|e| AppError::Navigation(format!("Failed to navigate to {}: {}", url, e)))?;

        match tokio::time::timeout(Duration::from_secs(5), page.wait_for_navigation()).await {
            Ok(Ok(_)) => tracing::debug!("navigation complete"),
            Ok(Err(e)) => tracing::debug!(error = %e, "navigation wait error, continuing"),
            Err(_) => tracing::debug!("navigation wait timed out, continuing"),
        }

        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let script = format!(
            r#"
            () => {{
                const selector = {selector};
                return Array.from(document.querySelectorAll(selector)).map((elem, index) => ({{
                    selector: selector,
                    index: index,
                    text: (elem.innerText || elem.textContent || '').trim(),
                    href: elem.getAttribute('href'),
                }}));
            }}
            "#,
            selector = js_string(selector)
        );

        let value = self.evaluate(&script).await?;
        let elements: Vec<ElementHandle> = serde_json::from_value(value)
            .map_err(|e| AppError::Browser(format!("Failed to parse elements: {}", e)))?;

        Ok(elements)
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        let script = format!(
            r#"
            () => {{
                const elements = document.querySelectorAll({selector});
                const target = elements[{index}];
                if (target) {{
                    target.click();
                    return true;
                }}
                return false;
            }}
            "#,
            selector = js_string(&element.selector),
            index = element.index
        );

        let clicked = self.evaluate(&script).await?;
        if !clicked.as_bool().unwrap_or(false) {
            return Err(AppError::Browser(format!(
                "Element {}[{}] not found",
                element.selector, element.index
            )));
        }

        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.evaluate("() => { window.scrollTo(0, document.body.scrollHeight); return true; }")
            .await?;
        Ok(())
    }

    async fn page_height(&self) -> Result<u64> {
        let value = self
            .evaluate("() => document.body ? document.body.scrollHeight : 0")
            .await?;

        value
            .as_f64()
            .map(|h| h.max(0.0).round() as u64)
            .ok_or_else(|| AppError::Browser(format!("Unexpected page height: {}", value)))
    }

    async fn quit(&mut self) -> Result<()> {
        tracing::debug!("closing browser");
        self.page = None;

        let mut outcome = Ok(());
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                outcome = Err(AppError::Browser(format!("Failed to close browser: {}", e)));
                let _ = browser.kill().await;
            }
            let _ = browser.wait().await;
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        if let Some(dir) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                tracing::debug!(dir = %dir.display(), error = %e, "failed to remove browser profile");
            }
        }

        outcome
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        // chromiumoxide kills the child process when `Browser` drops.
        if let Some(dir) = self.user_data_dir.take() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_selector() {
        assert_eq!(js_string(r#"a[href*="review"]"#), r#""a[href*=\"review\"]""#);
    }

    #[test]
    fn test_build_config_accepts_defaults() {
        let dir = std::env::temp_dir().join("chromiumoxide-session-test");
        let config = BrowserConfig {
            chrome_executable: Some("/usr/bin/chromium".to_string()),
            ..BrowserConfig::default()
        };
        assert!(ChromeLauncher::build_config(&config, &dir).is_ok());
    }
}
