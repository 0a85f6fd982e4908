//! Headless search host for stdin/stdout JSON communication.
//!
//! Reads `{"id", "query"}` requests as newline-delimited JSON from stdin,
//! fans each one out to the configured providers, and writes one reply line
//! per request to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use std::path::PathBuf;
use std::sync::Arc;

use omnisearch::omnisearch_fanout::FanoutOrchestrator;
use omnisearch::{AppConfig, StdioHost, build_registry, logging};

const USAGE: &str = "usage: omnisearch-host [--config PATH]";

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    help: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path\n{USAGE}"))?;
                parsed.config = Some(PathBuf::from(path));
            }
            other => {
                if let Some(path) = other.strip_prefix("--config=") {
                    parsed.config = Some(PathBuf::from(path));
                } else {
                    anyhow::bail!("unexpected argument '{other}'\n{USAGE}");
                }
            }
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        eprintln!("{USAGE}");
        return Ok(());
    }

    let config = AppConfig::load_or_default(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to load config: {e}"))?;
    logging::init_tracing(&config.logging);

    tracing::info!(providers = config.providers.len(), "omnisearch-host starting");

    let registry = Arc::new(build_registry(&config)?);
    let orchestrator = Arc::new(FanoutOrchestrator::new(config.fanout.clone())?);
    let host = StdioHost::new(Arc::clone(&orchestrator), registry);

    tokio::select! {
        result = host.run_stdio() => {
            result.map_err(|e| {
                tracing::error!(error = %e, "omnisearch-host exited with error");
                anyhow::anyhow!("omnisearch-host failed: {e}")
            })?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received");
            orchestrator.shutdown();
        }
    }

    tracing::info!("omnisearch-host shut down cleanly");
    Ok(())
}
