use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used by front-ends to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing arguments, detected before talking to the store.
    Validation,
    /// Input data that turned out unusable part way through, e.g. a truncated dump.
    MalformedInput,
    NotFound,
    Transport,
    /// The store answered with its own error payload.
    Backend,
    /// The operation ran but its outcome is unsatisfactory (count mismatch, alias cardinality).
    Verification,
    /// Cancelled or gave up waiting.
    Interrupted,
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid arguments: {0}")]
    Validation(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("{role} index is not found: {index}")]
    IndexNotFound { role: &'static str, index: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store at {0} did not answer ping")]
    Unreachable(String),

    #[error("backend error (status {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error(
        "copy verification failed, document count mismatch: {src_index}={src_count}, {dst_index}={dst_count}; \
         no index was deleted, inspect {dst_index} and clean up manually"
    )]
    CountMismatch {
        src_index: String,
        src_count: i64,
        dst_index: String,
        dst_count: i64,
    },

    #[error("only single-index aliases are supported: alias {alias} resolves to {found} indices")]
    AliasCardinality { alias: String, found: usize },

    #[error("alias {alias} already points at {index}; wait a second and retry")]
    NameCollision { alias: String, index: String },

    #[error("task {task_id} did not complete after {attempts} polls")]
    TaskTimeout { task_id: String, attempts: u32 },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::MalformedInput(_) => ErrorKind::MalformedInput,
            Error::IndexNotFound { .. } => ErrorKind::NotFound,
            Error::Transport(_) | Error::Unreachable(_) => ErrorKind::Transport,
            Error::Backend { .. } | Error::Decode(_) => ErrorKind::Backend,
            Error::CountMismatch { .. } | Error::AliasCardinality { .. } | Error::NameCollision { .. } => {
                ErrorKind::Verification
            }
            Error::TaskTimeout { .. } | Error::Cancelled => ErrorKind::Interrupted,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn decode(context: &str, err: serde_json::Error) -> Self {
        Error::Decode(format!("{context}: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}
