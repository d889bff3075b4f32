use crate::args::{
    AddTarget, CheckTarget, Commands, CopyTarget, CountTarget, CreateTarget, DeleteTarget, DumpTarget, GetTarget,
    ListTarget, RemoveTarget, RestoreTarget, SourceArgs, UpdateTarget,
};
use crate::output::Output;
use escli_core::{dump, migrate, remote, restore, swap};
use escli_core::{ClientConfig, EsClient, Error, PollPolicy, Result, SearchBackend};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Per-run settings that are not part of the command itself.
pub struct Context {
    pub host: String,
    pub doc_type: String,
    pub timeout: Option<std::time::Duration>,
    pub policy: PollPolicy,
    pub cancel: CancellationToken,
}

/// Runs one parsed command against `backend`.
pub async fn dispatch<B>(backend: &B, command: Commands, ctx: &Context) -> Result<Output>
where
    B: SearchBackend + ?Sized,
{
    match command {
        Commands::List(ListTarget::Index) => Ok(Output::Indices(backend.list_index().await?)),
        Commands::List(ListTarget::Alias { alias }) => Ok(Output::Indices(backend.list_alias(&alias).await?)),
        Commands::List(ListTarget::Task) => Ok(Output::Tasks(backend.list_task().await?)),
        Commands::Create(CreateTarget::Index { name, file, empty }) => {
            let body = if empty { String::new() } else { read_body(file.as_deref())? };
            backend.create_index(&name, Some(&body)).await?;
            info!(index = %name, "index created");
            Ok(Output::Empty)
        }
        Commands::Delete(DeleteTarget::Index { name }) => {
            ensure_reachable(backend, ctx).await?;
            backend.delete_index(&name).await?;
            info!(index = %name, "index deleted");
            Ok(Output::Empty)
        }
        Commands::Copy(CopyTarget::Index { src, dst }) => {
            ensure_reachable(backend, ctx).await?;
            let report = migrate::copy_index(backend, &src, &dst, &ctx.policy, &ctx.cancel).await?;
            Ok(Output::Copied(report))
        }
        Commands::Copy(CopyTarget::Remote { index, source }) => {
            ensure_reachable(backend, ctx).await?;
            let source = EsClient::new(&source_config(&source, ctx))?;
            let report = remote::remote_copy(&source, backend, &index, &ctx.cancel).await?;
            Ok(Output::RemoteCopied(report))
        }
        Commands::Count(CountTarget::Index { name }) => Ok(Output::Count(backend.count_index(&name).await?)),
        Commands::Dump(DumpTarget::Index { name, file }) => dump_to(backend, &name, file.as_deref(), ctx).await,
        Commands::Restore(RestoreTarget::Index { file }) => {
            ensure_reachable(backend, ctx).await?;
            let report = match file {
                Some(path) => restore::restore(backend, BufReader::new(File::open(&path)?), &ctx.cancel).await?,
                None => restore::restore(backend, BufReader::new(io::stdin()), &ctx.cancel).await?,
            };
            Ok(Output::Restored(report))
        }
        Commands::Get(GetTarget::Detail { name }) => Ok(Output::Detail(backend.detail_index(&name).await?)),
        Commands::Get(GetTarget::Task { id }) => Ok(Output::Task(backend.get_task(&id).await?)),
        Commands::Get(GetTarget::Version) => Ok(Output::Version(backend.version().await?)),
        Commands::Update(UpdateTarget::Detail { alias, file }) => {
            let body = read_body(file.as_deref())?;
            if body.trim().is_empty() {
                return Err(Error::Validation("detail update needs a mapping body".into()));
            }
            ensure_reachable(backend, ctx).await?;
            let report = swap::update_mapping(backend, &alias, &body, &ctx.policy, &ctx.cancel).await?;
            Ok(Output::Swapped(report))
        }
        Commands::Add(AddTarget::Alias { alias, indices }) => {
            backend.add_alias(&alias, &indices).await?;
            Ok(Output::Empty)
        }
        Commands::Remove(RemoveTarget::Alias { alias, indices }) => {
            backend.remove_alias(&alias, &indices).await?;
            Ok(Output::Empty)
        }
        Commands::Check(CheckTarget::Ping) => {
            ensure_reachable(backend, ctx).await?;
            Ok(Output::Pong(ctx.host.clone()))
        }
    }
}

async fn dump_to<B>(backend: &B, name: &str, file: Option<&Path>, ctx: &Context) -> Result<Output>
where
    B: SearchBackend + ?Sized,
{
    match file {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            let report = dump::dump_index(backend, name, &mut out, &ctx.cancel).await?;
            Ok(Output::Dumped(report))
        }
        None => {
            // stdout carries the dump itself, so the summary only goes to the log
            let mut out = BufWriter::new(io::stdout());
            let report = dump::dump_index(backend, name, &mut out, &ctx.cancel).await?;
            info!(index = %name, documents = report.documents, "dump written to stdout");
            Ok(Output::Empty)
        }
    }
}

/// Fails with a transport-kind error unless the store answers.
async fn ensure_reachable<B>(backend: &B, ctx: &Context) -> Result<()>
where
    B: SearchBackend + ?Sized,
{
    if backend.ping().await? {
        Ok(())
    } else {
        Err(Error::Unreachable(ctx.host.clone()))
    }
}

fn source_config(source: &SourceArgs, ctx: &Context) -> ClientConfig {
    ClientConfig {
        host: source.src_host.clone(),
        doc_type: ctx.doc_type.clone(),
        user: source.src_user.clone(),
        pass: source.src_pass.clone(),
        insecure: source.src_insecure,
        include_type_name: false,
        timeout: ctx.timeout,
    }
}

fn read_body(file: Option<&Path>) -> Result<String> {
    let mut body = String::new();
    match file {
        Some(path) => {
            File::open(path)?.read_to_string(&mut body)?;
        }
        None => {
            io::stdin().read_to_string(&mut body)?;
        }
    }
    Ok(body)
}
