//! Replace the mapping behind an alias without interrupting readers.
//!
//! Only aliases bound to exactly one index are handled. Two runs against the same alias at the
//! same time are not excluded from each other: both can pass the cardinality check before
//! either repoints the alias.

use crate::backend::SearchBackend;
use crate::config::PollPolicy;
use crate::error::{Error, Result};
use crate::migrate::{copy_index, CopyReport};
use time::macros::format_description;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReport {
    pub alias: String,
    pub old_index: String,
    pub new_index: String,
    pub copy: CopyReport,
}

/// `alias` suffixed with a second-resolution UTC timestamp, e.g. `books_20240131_235959`.
pub fn versioned_index_name(alias: &str, at: OffsetDateTime) -> Result<String> {
    let suffix = at
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .map_err(|e| Error::Validation(format!("cannot format timestamp: {e}")))?;
    Ok(format!("{alias}_{suffix}"))
}

pub async fn update_mapping<B>(
    backend: &B,
    alias: &str,
    body: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<SwapReport>
where
    B: SearchBackend + ?Sized,
{
    update_mapping_at(backend, alias, body, OffsetDateTime::now_utc(), policy, cancel).await
}

/// Creates `<alias>_<timestamp>` with `body`, copies the current index into it, repoints the
/// alias in one request and deletes the old index.
///
/// If the copy fails the alias and the old index are left untouched and the new index is kept
/// for inspection.
pub async fn update_mapping_at<B>(
    backend: &B,
    alias: &str,
    body: &str,
    at: OffsetDateTime,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<SwapReport>
where
    B: SearchBackend + ?Sized,
{
    let bound = backend.list_alias(alias).await?;
    if bound.len() != 1 {
        return Err(Error::AliasCardinality { alias: alias.to_string(), found: bound.len() });
    }
    let old_index = bound.0[0].name.clone();
    let new_index = versioned_index_name(alias, at)?;
    if new_index == old_index {
        return Err(Error::NameCollision { alias: alias.to_string(), index: new_index });
    }

    info!(alias, %old_index, %new_index, "creating replacement index");
    backend.create_index(&new_index, Some(body)).await?;

    let copy = match copy_index(backend, &old_index, &new_index, policy, cancel).await {
        Ok(report) => report,
        Err(err) => {
            warn!(alias, %old_index, %new_index, error = %err, "copy failed; alias untouched, new index left in place");
            return Err(err);
        }
    };

    backend.swap_alias(alias, &old_index, &new_index).await?;
    info!(alias, from = %old_index, to = %new_index, "alias repointed");
    backend.delete_index(&old_index).await?;
    info!(index = %old_index, "old index deleted");

    Ok(SwapReport { alias: alias.to_string(), old_index, new_index, copy })
}
