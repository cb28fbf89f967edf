use std::future::Future;
use std::time::{Duration, Instant};

/// Polls `probe` every `interval` until it reports `true` or `timeout`
/// elapses. Returns whether the condition was met. The probe always runs at
/// least once, so a zero timeout is a single check.
pub async fn wait_until<F, Fut>(timeout: Duration, interval: Duration, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();

    loop {
        if probe().await {
            return true;
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return false;
        }

        tokio::time::sleep(interval.min(timeout - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_returns_as_soon_as_ready() {
        let calls = AtomicUsize::new(0);
        let start = Instant::now();

        let ready = wait_until(Duration::from_secs(5), Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { n >= 2 }
        })
        .await;

        assert!(ready);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_gives_up_after_timeout() {
        let start = Instant::now();
        let ready = wait_until(Duration::from_millis(30), Duration::from_millis(5), || async {
            false
        })
        .await;

        assert!(!ready);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_zero_timeout_checks_once() {
        let calls = AtomicUsize::new(0);
        let ready = wait_until(Duration::ZERO, Duration::from_millis(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;

        assert!(!ready);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
