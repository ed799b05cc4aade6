//! Concurrent fetch-and-join for views built from several independent reads.
//!
//! Every operation is started together and all of them are awaited. The first
//! failure in *declaration* order wins, whatever order the operations finished
//! in, so the outcome is reproducible. Nothing partial is returned on failure.

use std::future::Future;
use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use indexmap::IndexMap;

use crate::error::{AppError, AppResult};

/// A named read operation
pub type Operation<'a, T> = (&'static str, BoxFuture<'a, AppResult<T>>);

/// Runs aggregated reads under an optional overall deadline
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    timeout: Option<Duration>,
}

impl Aggregator {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run named operations of one result type and collect them by name,
    /// keeping declaration order.
    pub async fn aggregate<'a, T>(
        &self,
        operations: Vec<Operation<'a, T>>,
    ) -> AppResult<IndexMap<&'static str, T>> {
        self.within_deadline(aggregate(operations)).await
    }

    /// Two operations of different result types
    pub async fn join2<A, B, FA, FB>(&self, a: FA, b: FB) -> AppResult<(A, B)>
    where
        FA: Future<Output = AppResult<A>>,
        FB: Future<Output = AppResult<B>>,
    {
        self.within_deadline(async {
            let (a, b) = tokio::join!(a, b);
            Ok((a?, b?))
        })
        .await
    }

    /// Three operations of different result types
    pub async fn join3<A, B, C, FA, FB, FC>(&self, a: FA, b: FB, c: FC) -> AppResult<(A, B, C)>
    where
        FA: Future<Output = AppResult<A>>,
        FB: Future<Output = AppResult<B>>,
        FC: Future<Output = AppResult<C>>,
    {
        self.within_deadline(async {
            let (a, b, c) = tokio::join!(a, b, c);
            Ok((a?, b?, c?))
        })
        .await
    }

    async fn within_deadline<T, F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                AppError::Timeout(format!("aggregate fetch exceeded {} ms", limit.as_millis()))
            })?,
            None => fut.await,
        }
    }
}

/// Run named operations concurrently and join them without a deadline.
pub async fn aggregate<'a, T>(
    operations: Vec<Operation<'a, T>>,
) -> AppResult<IndexMap<&'static str, T>> {
    let (names, futures): (Vec<_>, Vec<_>) = operations.into_iter().unzip();
    let results = join_all(futures).await;

    let mut joined = IndexMap::with_capacity(names.len());
    for (name, result) in names.into_iter().zip(results) {
        joined.insert(name, result?);
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn after(ms: u64, value: AppResult<i64>) -> BoxFuture<'static, AppResult<i64>> {
        async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            value
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_results_keep_declared_names_and_order() {
        let joined = aggregate(vec![
            ("books", after(30, Ok(3))),
            ("authors", after(0, Ok(2))),
            ("genres", after(10, Ok(5))),
        ])
        .await
        .unwrap();

        let keys: Vec<_> = joined.keys().copied().collect();
        assert_eq!(keys, vec!["books", "authors", "genres"]);
        assert_eq!(joined["authors"], 2);
    }

    #[tokio::test]
    async fn test_second_failure_is_returned_without_partial_data() {
        let result = aggregate(vec![
            ("first", after(0, Ok(1))),
            ("second", after(20, Err(AppError::Storage("second broke".into())))),
            ("third", after(5, Ok(3))),
        ])
        .await;

        match result {
            Err(AppError::Storage(msg)) => assert_eq!(msg, "second broke"),
            other => panic!("expected the second failure, got {:?}", other.map(|m| m.len())),
        }
    }

    #[tokio::test]
    async fn test_first_declared_failure_wins_over_first_completed() {
        let result = aggregate(vec![
            ("slow", after(30, Err(AppError::NotFound("slow".into())))),
            ("fast", after(0, Err(AppError::Storage("fast".into())))),
        ])
        .await;

        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "slow"));
    }

    #[tokio::test]
    async fn test_all_operations_run_even_after_failure() {
        let finished = Arc::new(AtomicUsize::new(0));
        let tracked = |ms: u64, value: AppResult<i64>| {
            let finished = finished.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                value
            }
            .boxed()
        };

        let result = aggregate(vec![
            ("a", tracked(0, Err(AppError::Storage("a".into())))),
            ("b", tracked(10, Ok(1))),
            ("c", tracked(20, Ok(2))),
        ])
        .await;

        assert!(result.is_err());
        assert_eq!(finished.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_operations_overlap() {
        let started = std::time::Instant::now();
        aggregate(vec![
            ("a", after(50, Ok(1))),
            ("b", after(50, Ok(2))),
            ("c", after(50, Ok(3))),
        ])
        .await
        .unwrap();
        assert!(started.elapsed() < Duration::from_millis(140));
    }

    #[tokio::test]
    async fn test_join3_heterogeneous() {
        let aggregator = Aggregator::default();
        let (a, b, c) = aggregator
            .join3(
                async { Ok::<_, AppError>("author") },
                async { Ok::<_, AppError>(vec![1, 2]) },
                async { Ok::<_, AppError>(7_i64) },
            )
            .await
            .unwrap();
        assert_eq!((a, b.len(), c), ("author", 2, 7));
    }

    #[tokio::test]
    async fn test_join2_declared_order_failure() {
        let aggregator = Aggregator::default();
        let result: AppResult<(i64, i64)> = aggregator
            .join2(
                after(20, Err(AppError::NotFound("first".into()))),
                after(0, Err(AppError::Storage("second".into()))),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_timeout_wraps_whole_aggregate() {
        let aggregator = Aggregator::new(Some(Duration::from_millis(10)));
        let result = aggregator
            .aggregate(vec![("slow", after(200, Ok(1)))])
            .await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
    }
}
