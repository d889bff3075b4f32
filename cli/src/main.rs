mod args;
mod dispatch;
mod output;
mod settings;

use anyhow::{Context as _, Result};
use args::Cli;
use clap::{CommandFactory, Parser};
use dispatch::Context;
use escli_core::{ClientConfig, EsClient, ErrorKind, PollPolicy};
use settings::Profile;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = match &cli.config {
        Some(path) => vec![path.clone()],
        None => settings::default_paths(),
    };
    let (profile, loaded) = settings::resolve(&paths, cli.namespace.as_deref()).map_err(|e| usage_error(e.into()))?;
    let profile = profile.overwrite(flags_profile(&cli));
    init_logging(&profile);
    let namespace = cli.namespace.as_deref().unwrap_or(settings::DEFAULT_NAMESPACE);
    for path in &loaded {
        debug!(path = %path.display(), namespace, "loaded profile");
    }

    let config = client_config(&profile, &cli);
    let client = EsClient::new(&config).map_err(|e| usage_error(e.into()))?;
    let ctx = Context {
        host: config.host.clone(),
        doc_type: config.doc_type.clone(),
        timeout: config.timeout,
        policy: poll_policy(&cli),
        cancel: CancellationToken::new(),
    };

    let trigger = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping");
            trigger.cancel();
        }
    });

    let output = dispatch::dispatch(&client, cli.command, &ctx)
        .await
        .map_err(|e| usage_error(e.into()))
        .context("command failed")?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Prints usage when the root cause is bad input.
fn usage_error(err: anyhow::Error) -> anyhow::Error {
    let invalid = err
        .chain()
        .filter_map(|e| e.downcast_ref::<escli_core::Error>())
        .any(|e| e.kind() == ErrorKind::Validation);
    if invalid {
        eprintln!("{}", Cli::command().render_help());
    }
    err
}

// RUST_LOG wins, then --debug, then --verbose.
fn init_logging(profile: &Profile) {
    let level = if profile.debug {
        "debug"
    } else if profile.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn flags_profile(cli: &Cli) -> Profile {
    Profile {
        host: cli.host.clone().unwrap_or_default(),
        doc_type: cli.doc_type.clone().unwrap_or_default(),
        user: cli.user.clone().unwrap_or_default(),
        pass: cli.pass.clone().unwrap_or_default(),
        insecure: cli.insecure,
        verbose: cli.verbose,
        debug: cli.debug,
    }
}

fn client_config(profile: &Profile, cli: &Cli) -> ClientConfig {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    ClientConfig {
        host: profile.host.clone(),
        doc_type: profile.doc_type.clone(),
        user: non_empty(&profile.user),
        pass: non_empty(&profile.pass),
        insecure: profile.insecure,
        include_type_name: cli.include_type_name,
        timeout: cli.timeout.map(Duration::from_secs),
    }
}

fn poll_policy(cli: &Cli) -> PollPolicy {
    PollPolicy {
        unit: Duration::from_millis(cli.poll_unit_ms),
        max_attempts: (cli.max_polls > 0).then_some(cli.max_polls),
    }
}
