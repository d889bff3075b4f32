use crate::index::DEFAULT_DOC_TYPE;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "http://localhost:9200";

/// Everything needed to reach one store. Passed explicitly to [`crate::EsClient::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL including scheme and port, e.g. `http://localhost:9200`
    pub host: String,
    /// Document type used in URLs and interchange metadata
    pub doc_type: String,
    pub user: Option<String>,
    pub pass: Option<String>,
    /// Skip TLS certificate verification (like `curl -k`)
    pub insecure: bool,
    /// Append `include_type_name=true` when creating indices
    pub include_type_name: bool,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            doc_type: DEFAULT_DOC_TYPE.to_string(),
            user: None,
            pass: None,
            insecure: false,
            include_type_name: false,
            timeout: None,
        }
    }
}

/// Back-off schedule for task polling: attempt `n` waits `unit * n^2` before polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub unit: Duration,
    /// `None` polls until the task completes.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(attempt.saturating_mul(attempt))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { unit: Duration::from_secs(1), max_attempts: Some(30) }
    }
}
