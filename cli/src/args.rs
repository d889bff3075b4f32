use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "escli", version)]
#[command(about = "Manage search indices and aliases over HTTP", long_about = None)]
pub struct Cli {
    /// Store URL, e.g. http://localhost:9200
    #[arg(long, global = true)]
    pub host: Option<String>,
    /// Document type written into dump metadata
    #[arg(short = 't', long = "type", global = true)]
    pub doc_type: Option<String>,
    #[arg(short, long, global = true)]
    pub user: Option<String>,
    #[arg(short, long, global = true)]
    pub pass: Option<String>,
    /// Skip TLS certificate verification
    #[arg(short = 'k', long, global = true)]
    pub insecure: bool,
    /// Profile to read from the config files
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,
    /// Read this config file instead of ~/.escli.json and ./.escli.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[arg(short, long, global = true)]
    pub debug: bool,
    /// Send include_type_name=true when creating indices
    #[arg(long, global = true)]
    pub include_type_name: bool,
    /// Give up on a copy task after this many polls (0 waits forever)
    #[arg(long, default_value_t = 30, global = true)]
    pub max_polls: u32,
    /// Base poll interval; attempt n waits n^2 units
    #[arg(long, default_value_t = 1000, global = true)]
    pub poll_unit_ms: u64,
    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Verb first, then the resource it acts on: `escli copy index a b`.
#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(subcommand)]
    List(ListTarget),
    #[command(subcommand)]
    Create(CreateTarget),
    #[command(subcommand)]
    Delete(DeleteTarget),
    #[command(subcommand)]
    Copy(CopyTarget),
    #[command(subcommand)]
    Count(CountTarget),
    #[command(subcommand)]
    Dump(DumpTarget),
    #[command(subcommand)]
    Restore(RestoreTarget),
    #[command(subcommand)]
    Get(GetTarget),
    #[command(subcommand)]
    Update(UpdateTarget),
    #[command(subcommand)]
    Add(AddTarget),
    #[command(subcommand)]
    Remove(RemoveTarget),
    #[command(subcommand)]
    Check(CheckTarget),
}

#[derive(Subcommand, Debug)]
pub enum ListTarget {
    Index,
    /// Indices bound to ALIAS
    Alias { alias: String },
    /// Tasks currently running on the store
    Task,
}

#[derive(Subcommand, Debug)]
pub enum CreateTarget {
    /// Create an index, with a settings/mappings body from FILE or stdin
    Index {
        name: String,
        file: Option<PathBuf>,
        /// Create with store defaults instead of reading a body
        #[arg(long, conflicts_with = "file")]
        empty: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeleteTarget {
    Index { name: String },
}

#[derive(Subcommand, Debug)]
pub enum CopyTarget {
    /// Re-index SRC into the existing DST and verify document counts
    Index { src: String, dst: String },
    /// Recreate INDEX from the source cluster on this one
    Remote {
        index: String,
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum CountTarget {
    Index { name: String },
}

#[derive(Subcommand, Debug)]
pub enum DumpTarget {
    /// Write the index detail and all documents to FILE or stdout
    Index { name: String, file: Option<PathBuf> },
}

#[derive(Subcommand, Debug)]
pub enum RestoreTarget {
    /// Bulk-load a dump from FILE or stdin
    Index { file: Option<PathBuf> },
}

#[derive(Subcommand, Debug)]
pub enum GetTarget {
    /// Settings, mappings and aliases of an index
    Detail { name: String },
    Task { id: String },
    /// Print the store version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum UpdateTarget {
    /// Move ALIAS onto a new index built from the body in FILE or stdin
    Detail { alias: String, file: Option<PathBuf> },
}

#[derive(Subcommand, Debug)]
pub enum AddTarget {
    Alias {
        alias: String,
        #[arg(required = true)]
        indices: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RemoveTarget {
    Alias {
        alias: String,
        #[arg(required = true)]
        indices: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CheckTarget {
    /// Check that the store answers
    Ping,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Source cluster URL
    #[arg(long)]
    pub src_host: String,
    #[arg(long)]
    pub src_user: Option<String>,
    #[arg(long)]
    pub src_pass: Option<String>,
    #[arg(long)]
    pub src_insecure: bool,
}
