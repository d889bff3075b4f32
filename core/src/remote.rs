//! Pull an index from another cluster into this one.

use crate::backend::SearchBackend;
use crate::dump::{DocumentPager, PAGE_SIZE};
use crate::error::{Error, Result};
use crate::interchange::bulk_body;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCopyReport {
    pub index: String,
    pub pages: usize,
    pub documents: i64,
}

/// Recreates `index` on `dest` from `source`'s mappings and settings, then copies its documents
/// page by page through bulk writes.
///
/// Counts are compared after a refresh. A mismatch returns [`Error::CountMismatch`] and the
/// destination index is kept.
pub async fn remote_copy<S, D>(
    source: &S,
    dest: &D,
    index: &str,
    cancel: &CancellationToken,
) -> Result<RemoteCopyReport>
where
    S: SearchBackend + ?Sized,
    D: SearchBackend + ?Sized,
{
    let detail = source.detail_index(index).await?;
    let body = detail.creation_body(index).to_string();
    dest.create_index(index, Some(&body)).await?;
    info!(index, "created destination index from remote detail");

    let mut pager = DocumentPager::new(source, index, PAGE_SIZE);
    let mut pages = 0usize;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(page) = pager.next_page().await? else { break };
        dest.bulk_index(bulk_body(&page.hits)?).await?;
        pages += 1;
        info!(index, page = pages, after = ?page.last_id(), "copied page");
    }

    dest.refresh_index(index).await?;
    let src_count = source.count_index(index).await?;
    let dst_count = dest.count_index(index).await?;
    if src_count != dst_count {
        return Err(Error::CountMismatch {
            src_index: format!("remote:{index}"),
            src_count: src_count.num,
            dst_index: index.to_string(),
            dst_count: dst_count.num,
        });
    }
    Ok(RemoteCopyReport { index: index.to_string(), pages, documents: src_count.num })
}
