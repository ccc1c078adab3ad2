use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::error::WorkflowError;

/// Sleeps for `delay` unless `token` fires first, in which case
/// `WorkflowError::Cancelled` is returned.
pub async fn sleep_or_cancel(token: &CancellationToken, delay: Duration) -> Result<()> {
    if token.is_cancelled() {
        return Err(WorkflowError::Cancelled.into());
    }
    if delay.is_zero() {
        return Ok(());
    }

    tokio::select! {
        _ = tokio::time::sleep(delay) => Ok(()),
        _ = token.cancelled() => Err(WorkflowError::Cancelled.into()),
    }
}

/// Multiplies a millisecond constant by the configured delay scale.
pub fn scaled_ms(ms: u64, scale: f64) -> Duration {
    if !scale.is_finite() || scale <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_millis((ms as f64 * scale).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::workflow_error;

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_when_not_cancelled() {
        let token = CancellationToken::new();
        sleep_or_cancel(&token, Duration::from_millis(500))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let err = sleep_or_cancel(&token, Duration::from_secs(10))
            .await
            .unwrap_err();
        assert_eq!(workflow_error(&err), Some(&WorkflowError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_pending_sleep() {
        let token = CancellationToken::new();
        let child = token.clone();
        let handle =
            tokio::spawn(async move { sleep_or_cancel(&child, Duration::from_secs(60)).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        let result = handle.await.unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn scale_handles_zero_and_fractions() {
        assert_eq!(scaled_ms(1000, 0.0), Duration::ZERO);
        assert_eq!(scaled_ms(1000, 0.5), Duration::from_millis(500));
        assert_eq!(scaled_ms(300, 1.0), Duration::from_millis(300));
        assert_eq!(scaled_ms(300, f64::NAN), Duration::ZERO);
    }
}
