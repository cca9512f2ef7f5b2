use std::time::Duration;

use anyhow::Result;
use log::warn;
use tokio::time::sleep;

/// Runs `op` until it succeeds or `max_attempts` is reached, doubling the
/// delay after every failure.
pub async fn with_backoff<T, F, Fut>(max_attempts: u32, initial_delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = initial_delay;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => {
                return Err(err.context(format!("giving up after {attempt} attempts")));
            }
            Err(err) => {
                warn!("[attempt {attempt}/{max_attempts}] {err:#}; retrying in {delay:?}");
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use anyhow::bail;

    use super::*;

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = with_backoff(5, Duration::from_millis(1), move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                bail!("rate limited");
            }
            Ok("committed")
        })
        .await;

        assert_eq!(result.unwrap(), "committed");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<()> = with_backoff(3, Duration::from_millis(1), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            bail!("rate limited")
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(format!("{err:#}").contains("giving up after 3 attempts"));
    }
}
