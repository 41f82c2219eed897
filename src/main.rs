mod cli;
mod error;

use crate::cli::Args;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use mmbatch_config::Config;
use mmbatch_library::{BatchEvent, BatchJob, Catalog, Options, Summary};
use mmbatch_process::Matcher;
use std::pin::pin;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Conventional exit status for a process stopped by SIGINT.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level())))
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(summary) if summary.cancelled => ExitCode::from(EXIT_CANCELLED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Batch aborted");
            eprintln!("mmbatch: {}", &*e);
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<Summary> {
    let mut config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    args.apply(&mut config);
    let catalog = Catalog::with_overrides(&config.messages).or_raise(|| ErrorKind::Messages)?;
    let matcher = Matcher::discover(config.matcher.executable.as_deref(), &config.matcher.program)
        .or_raise(|| ErrorKind::Matcher)?
        .with_arguments(config.matcher.arguments.clone())
        .with_log_file(config.matcher.log_file.clone())
        .with_timeout(config.matcher.timeout());
    tracing::info!(executable = %matcher.executable().display(), "Using matcher");

    let mut roots = Vec::with_capacity(args.directories.len());
    for directory in &args.directories {
        let root = std::path::absolute(directory).or_raise(|| ErrorKind::Directory(directory.clone()))?;
        if !root.is_dir() {
            exn::bail!(ErrorKind::Directory(directory.clone()));
        }
        roots.push(root);
    }

    let options = Options::default().with_pacing(config.pacing()).with_cancellation(cancel_on_interrupt());
    let mut job = BatchJob::scan(&roots).await.or_raise(|| ErrorKind::Batch)?;
    {
        let mut events = pin!(job.process(&matcher, &options));
        let mut total = 0;
        while let Some(event) = events.next().await {
            match event.or_raise(|| ErrorKind::Batch)? {
                BatchEvent::DiscoveryComplete(count) => total = count,
                BatchEvent::Processed { index, outcome } => {
                    tracing::debug!(item = %outcome.item.display(), action = ?outcome.action, "Processed");
                    let status = catalog.status(index + 1, total).or_raise(|| ErrorKind::Messages)?;
                    tracing::info!("{status}");
                },
                BatchEvent::Cancelled => tracing::warn!("Interrupted; remaining images left untouched"),
                BatchEvent::Started | BatchEvent::Complete => {},
            }
        }
    }

    let summary = job.into_summary();
    for warning in &summary.warnings {
        println!("warning: {}", catalog.render(warning).or_raise(|| ErrorKind::Messages)?);
    }
    println!("{}", catalog.status(summary.processed, summary.total).or_raise(|| ErrorKind::Messages)?);
    Ok(summary)
}

/// A token that is cancelled on the first Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl+C; stopping after the current image");
                cancel.cancel();
            },
            Err(e) => tracing::warn!(error = %e, "Could not listen for Ctrl+C"),
        }
    });
    token
}
