//! Index lifecycle engine: re-index with verification, dump, restore and alias swaps against an
//! Elasticsearch-compatible store.

pub mod backend;
pub mod client;
pub mod config;
pub mod dump;
pub mod error;
pub mod index;
pub mod interchange;
pub mod migrate;
pub mod remote;
pub mod restore;
pub mod swap;

pub use backend::SearchBackend;
pub use client::EsClient;
pub use config::{ClientConfig, PollPolicy};
pub use error::{Error, ErrorKind, Result};
pub use index::{
    AliasAction, Count, Detail, Hit, Index, Indices, RunningTask, SearchPage, SearchQuery, Task, Version,
};
