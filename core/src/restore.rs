use crate::backend::SearchBackend;
use crate::error::{Error, Result};
use crate::interchange::parse_header;
use std::io::{BufRead, Read};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Documents per bulk request. Each document is two lines.
pub const BATCH_SIZE: usize = 1000;

/// Longest accepted line; large documents need far more than a default line buffer.
pub const MAX_LINE_BYTES: usize = 65_536_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub batches: usize,
    pub documents: usize,
    pub skipped_header: bool,
}

/// Streams a dump back into the store in bulk batches of [`BATCH_SIZE`] documents.
///
/// A partially filled final batch is always sent. A failed bulk request stops the restore;
/// batches already sent stay applied.
pub async fn restore<B, R>(backend: &B, input: R, cancel: &CancellationToken) -> Result<RestoreReport>
where
    B: SearchBackend + ?Sized,
    R: BufRead + Send,
{
    restore_with_batch_size(backend, input, BATCH_SIZE, cancel).await
}

pub async fn restore_with_batch_size<B, R>(
    backend: &B,
    mut input: R,
    batch_size: usize,
    cancel: &CancellationToken,
) -> Result<RestoreReport>
where
    B: SearchBackend + ?Sized,
    R: BufRead + Send,
{
    if batch_size == 0 {
        return Err(Error::Validation("batch size must be positive".into()));
    }
    let capacity = batch_size * 2;
    let mut buf: Vec<String> = Vec::with_capacity(capacity);
    let mut report = RestoreReport::default();
    let mut line_no = 0usize;

    while let Some(line) = next_line(&mut input, line_no + 1)? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        if line_no == 1 && parse_header(&line).is_some() {
            debug!("skipping dump header");
            report.skipped_header = true;
            continue;
        }
        buf.push(line);
        if buf.len() == capacity {
            flush(backend, &mut buf, &mut report, cancel).await?;
        }
    }

    if buf.len() % 2 == 1 {
        let dangling = buf.pop();
        warn!(line = line_no, "input ends with an action line that has no document");
        if !buf.is_empty() {
            flush(backend, &mut buf, &mut report, cancel).await?;
        }
        return Err(Error::MalformedInput(format!(
            "truncated input: action line without document at the end ({})",
            dangling.unwrap_or_default()
        )));
    }
    if !buf.is_empty() {
        flush(backend, &mut buf, &mut report, cancel).await?;
    }

    info!(batches = report.batches, documents = report.documents, "restore complete");
    Ok(report)
}

async fn flush<B>(backend: &B, buf: &mut Vec<String>, report: &mut RestoreReport, cancel: &CancellationToken) -> Result<()>
where
    B: SearchBackend + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let mut body = buf.join("\n");
    body.push('\n');
    let documents = buf.len() / 2;
    backend.bulk_index(body).await?;
    buf.clear();
    report.batches += 1;
    report.documents += documents;
    info!(batch = report.batches, documents = report.documents, "restored batch");
    Ok(())
}

fn next_line<R: BufRead>(input: &mut R, line_no: usize) -> Result<Option<String>> {
    let mut raw = Vec::new();
    let read = input.by_ref().take(MAX_LINE_BYTES as u64 + 1).read_until(b'\n', &mut raw)?;
    if read == 0 {
        return Ok(None);
    }
    if raw.last() == Some(&b'\n') {
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
    } else if raw.len() > MAX_LINE_BYTES {
        return Err(Error::MalformedInput(format!("line {line_no} is longer than {MAX_LINE_BYTES} bytes")));
    }
    String::from_utf8(raw)
        .map(Some)
        .map_err(|_| Error::MalformedInput(format!("line {line_no} is not valid UTF-8")))
}
