// Bounded fan-out shared by prompt binding, team creation and group tasks

use std::future::Future;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

/// What a fan-out does when one item fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationPolicy {
    /// Keep going; every item's result is returned
    ContinueOnError,
    /// Stop at the first failure and drop whatever is still in flight
    #[default]
    AbortOnError,
}

/// Runs `items` with at most `limit` in flight, returning results in input order
///
/// Under [`IsolationPolicy::ContinueOnError`] this always returns `Ok` with one
/// result per item. Under [`IsolationPolicy::AbortOnError`] the first error
/// (in input order) is returned instead.
pub async fn gather<I, Fut, T, E>(
    items: I,
    limit: usize,
    policy: IsolationPolicy,
) -> Result<Vec<Result<T, E>>, E>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    let mut in_flight = stream::iter(items).buffered(limit.max(1));
    let mut results = Vec::new();

    while let Some(result) = in_flight.next().await {
        match (policy, result) {
            (IsolationPolicy::AbortOnError, Err(err)) => return Err(err),
            (_, result) => results.push(result),
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    async fn item(n: u32) -> Result<u32, String> {
        tokio::time::sleep(Duration::from_millis(u64::from(5 - n.min(5)))).await;
        if n == 2 {
            Err(format!("item {} failed", n))
        } else {
            Ok(n * 10)
        }
    }

    #[tokio::test]
    async fn continue_on_error_isolates_failures() {
        let results = gather((0..4).map(item), 4, IsolationPolicy::ContinueOnError)
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results[0], Ok(0));
        assert_eq!(results[1], Ok(10));
        assert!(results[2].is_err());
        assert_eq!(results[3], Ok(30));
    }

    #[tokio::test]
    async fn abort_on_error_returns_first_failure() {
        let err = gather((0..4).map(item), 4, IsolationPolicy::AbortOnError)
            .await
            .unwrap_err();

        assert_eq!(err, "item 2 failed");
    }

    #[tokio::test]
    async fn abort_on_error_succeeds_when_nothing_fails() {
        let results = gather([0, 1, 3].map(item), 2, IsolationPolicy::AbortOnError)
            .await
            .unwrap();

        assert_eq!(results, vec![Ok(0), Ok(10), Ok(30)]);
    }

    #[tokio::test]
    async fn respects_concurrency_limit() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs = (0..8).map(|_| {
            let active = active.clone();
            let peak = peak.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, ()>(())
            }
        });

        gather(jobs, 3, IsolationPolicy::ContinueOnError).await.unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
