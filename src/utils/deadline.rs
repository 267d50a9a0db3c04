//! Deadlines for calls into durable stores.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use serde_json::json;

/// Runs `fut` with an upper bound of `limit`.
///
/// Dropping the inner future on expiry cancels the call; callers must only
/// mutate local state after this returns `Ok`.
///
/// # Errors
///
/// Returns [`AppError::Timeout`] when the deadline passes, otherwise whatever
/// `fut` returns.
pub async fn with_deadline<T, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{} timed out after {:?}", operation, limit);
            Err(AppError::timeout(
                format!("{operation} timed out"),
                json!({ "timeout_ms": limit.as_millis() as u64 }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_result() {
        let value = with_deadline(Duration::from_secs(1), "op", async { Ok::<_, AppError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let result = with_deadline(Duration::from_millis(50), "slow op", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, AppError>(())
        })
        .await;

        assert!(matches!(result, Err(AppError::Timeout { .. })));
    }
}
