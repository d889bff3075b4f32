//! Copy one index into another through the store's asynchronous re-index, then verify.

use crate::backend::SearchBackend;
use crate::config::PollPolicy;
use crate::error::{Error, Result};
use crate::index::Task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    pub task_id: String,
    pub polls: u32,
    pub documents: i64,
}

/// Copies every document of `src` into `dst`.
///
/// Both indices must already exist. After the re-index task completes the document counts of
/// both sides are compared; a mismatch is reported as [`Error::CountMismatch`] and neither
/// index is touched.
pub async fn copy_index<B>(
    backend: &B,
    src: &str,
    dst: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<CopyReport>
where
    B: SearchBackend + ?Sized,
{
    let indices = backend.list_index().await?;
    debug!(existing = indices.len(), src, dst, "checking copy endpoints");
    if !indices.contains(src) {
        return Err(Error::IndexNotFound { role: "source", index: src.to_string() });
    }
    if !indices.contains(dst) {
        return Err(Error::IndexNotFound { role: "destination", index: dst.to_string() });
    }

    let task = backend.copy_index(src, dst).await?;
    info!(task_id = %task.id, src, dst, "re-index started");
    let polls = wait_for_task(backend, &task, policy, cancel).await?;

    let src_count = backend.count_index(src).await?;
    let dst_count = backend.count_index(dst).await?;
    if src_count != dst_count {
        return Err(Error::CountMismatch {
            src_index: src.to_string(),
            src_count: src_count.num,
            dst_index: dst.to_string(),
            dst_count: dst_count.num,
        });
    }

    info!(src, dst, documents = src_count.num, "copy verified");
    Ok(CopyReport { task_id: task.id, polls, documents: src_count.num })
}

/// Polls `task` until the store reports it complete. Returns the number of polls made.
///
/// Attempt `n` first sleeps `policy.backoff(n)`. Cancellation is observed before the sleep,
/// during it, and again before the poll.
pub async fn wait_for_task<B>(
    backend: &B,
    task: &Task,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<u32>
where
    B: SearchBackend + ?Sized,
{
    if task.complete {
        return Ok(0);
    }
    let mut attempt: u32 = 0;
    loop {
        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            return Err(Error::TaskTimeout { task_id: task.id.clone(), attempts: attempt });
        }
        attempt += 1;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let wait = policy.backoff(attempt);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(wait) => {}
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        debug!(task_id = %task.id, attempt, waited = ?wait, "polling task");
        if backend.get_task(&task.id).await?.complete {
            return Ok(attempt);
        }
    }
}
