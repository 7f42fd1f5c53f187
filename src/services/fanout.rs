//! Bounded fan-out with index-aligned results
//!
//! Every item gets its own task; a semaphore caps how many run at once. The
//! call returns only after every task has finished, and slot `i` of the
//! output always holds the outcome for input `i` regardless of completion
//! order.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};

/// Run `task` over `items` with at most `max_concurrent` in flight.
///
/// A task that panics yields `Err(JoinError)` in its own slot; its siblings
/// are unaffected.
pub async fn gather_indexed<T, F, Fut, R>(
    items: Vec<T>,
    max_concurrent: usize,
    task: F,
) -> Vec<Result<R, JoinError>>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

    let handles: Vec<JoinHandle<R>> = items
        .into_iter()
        .map(|item| {
            let sem = semaphore.clone();
            let task = task.clone();
            tokio::spawn(async move {
                // The semaphore is never closed, so acquisition only fails if that changes.
                let _permit = sem.acquire().await.ok();
                task(item).await
            })
        })
        .collect();

    join_all(handles).await
}
