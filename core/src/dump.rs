use crate::backend::SearchBackend;
use crate::error::{Error, Result};
use crate::index::{SearchPage, SearchQuery};
use crate::interchange::{write_header, write_record};
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const PAGE_SIZE: usize = 1000;

/// Walks an index with a `search_after` cursor on `_id`, newest id first.
pub struct DocumentPager<'a, B: ?Sized> {
    backend: &'a B,
    index: &'a str,
    page_size: usize,
    cursor: Option<String>,
    done: bool,
    requests: usize,
}

impl<'a, B: SearchBackend + ?Sized> DocumentPager<'a, B> {
    pub fn new(backend: &'a B, index: &'a str, page_size: usize) -> Self {
        Self { backend, index, page_size, cursor: None, done: false, requests: 0 }
    }

    /// Next non-empty page, or `None` once the store returns an empty one.
    pub async fn next_page(&mut self) -> Result<Option<SearchPage>> {
        if self.done {
            return Ok(None);
        }
        let query = match &self.cursor {
            Some(last) => SearchQuery::after(self.page_size, last.clone()),
            None => SearchQuery::first_page(self.page_size),
        };
        self.requests += 1;
        let page = self.backend.search_index(self.index, &query).await?;
        match page.last_id() {
            Some(last) => {
                debug!(index = self.index, after = ?self.cursor, hits = page.hits.len(), "page fetched");
                self.cursor = Some(last.to_string());
                Ok(Some(page))
            }
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }

    /// Search requests issued so far, including the final empty one.
    pub fn requests(&self) -> usize { self.requests }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub searches: usize,
    pub documents: usize,
}

/// Writes the detail header of `index` followed by every document as record pairs.
///
/// A failed page leaves a partial dump behind with no trailing marker.
pub async fn dump_index<B, W>(backend: &B, index: &str, out: &mut W, cancel: &CancellationToken) -> Result<DumpReport>
where
    B: SearchBackend + ?Sized,
    W: Write + Send,
{
    dump_with_page_size(backend, index, out, PAGE_SIZE, cancel).await
}

pub async fn dump_with_page_size<B, W>(
    backend: &B,
    index: &str,
    out: &mut W,
    page_size: usize,
    cancel: &CancellationToken,
) -> Result<DumpReport>
where
    B: SearchBackend + ?Sized,
    W: Write + Send,
{
    if page_size == 0 {
        return Err(Error::Validation("page size must be positive".into()));
    }
    let detail = backend.detail_index(index).await?;
    write_header(out, &detail)?;

    let mut pager = DocumentPager::new(backend, index, page_size);
    let mut documents = 0usize;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(page) = pager.next_page().await? else { break };
        for hit in &page.hits {
            write_record(out, hit)?;
        }
        documents += page.hits.len();
        if documents % (page_size * 10) < page.hits.len() {
            info!(index, documents, "dump progress");
        }
    }
    out.flush()?;

    info!(index, documents, searches = pager.requests(), "dump complete");
    Ok(DumpReport { searches: pager.requests(), documents })
}
