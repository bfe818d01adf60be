/// Entry point: configure, start the race, watch it until it ends.

mod cli;
mod config;
mod domain;
mod error;
mod net;
mod ui;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use reqwest::Client;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::CliArgs;
use config::ViewerConfig;
use error::ViewerError;
use net::endpoint::ServerUrl;
use net::session;
use net::stream::{Projection, StreamEnd, StreamSummary};
use net::SessionPlan;
use ui::input::InputWatcher;
use ui::palette::Palette;
use ui::renderer::{Layout, Renderer};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match try_main(args) {
        Ok(summary) => {
            let how = match summary.end {
                StreamEnd::ServerClosed => "server closed the stream",
                StreamEnd::Interrupted => "stopped by operator",
            };
            println!(
                "{how}: {} frames shown, {} skipped",
                summary.stats.frames, summary.stats.skipped
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("rosewatch: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(args: CliArgs) -> anyhow::Result<StreamSummary> {
    let config = ViewerConfig::load(args.config.as_deref());
    init_logging(&config, args.log_file.as_deref())?;
    info!("rosewatch v{}", env!("CARGO_PKG_VERSION"));

    let plan = SessionPlan {
        server: ServerUrl::parse(&args.url)?,
        drivers: args.drivers,
        tick_rate: args.fps,
        settle_delay: config.session.settle_delay,
        projection: Projection::new(config.track.width, config.track.height, args.fps),
    };
    let client = session::build_client(config.session.request_timeout)?;

    // One connection, one sequential loop: no worker threads needed.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("could not start async runtime")?;

    let palette = Palette::new();
    let layout = Layout {
        cell_width: config.display.cell_width,
        split: config.track.split,
    };
    let mut renderer = Renderer::stdout(&palette, layout);

    if let Err(e) = renderer.init() {
        let _ = renderer.cleanup();
        return Err(e).context("terminal init failed");
    }

    let (watcher, quit_rx) = InputWatcher::spawn();
    let result = runtime.block_on(spectate(&client, &plan, &mut renderer, quit_rx));
    drop(watcher);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    Ok(result?)
}

async fn spectate(
    client: &Client,
    plan: &SessionPlan,
    renderer: &mut Renderer<'_, impl std::io::Write>,
    mut quit_rx: UnboundedReceiver<()>,
) -> Result<StreamSummary, ViewerError> {
    renderer.status("Connecting...")?;

    let shutdown = async move {
        tokio::select! {
            key = quit_rx.recv() => {
                // Watcher gone (no tty): only the signal can stop us now.
                if key.is_none() {
                    wait_for_ctrl_c().await;
                }
            }
            _ = wait_for_ctrl_c() => {}
        }
    };

    net::watch(client, plan, renderer, shutdown).await
}

async fn wait_for_ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// `RUST_LOG` wins over the configured level. Logs go to `log_file` when
/// given, stderr otherwise; stderr shares the tty with the live view, so
/// there the configured level is capped at `warn`.
fn init_logging(config: &ViewerConfig, log_file: Option<&Path>) -> anyhow::Result<()> {
    let level = match log_file {
        Some(_) => config.log_level.clone(),
        None => stderr_level(&config.log_level).to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("could not open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn stderr_level(configured: &str) -> LevelFilter {
    configured
        .parse::<LevelFilter>()
        .map_or(LevelFilter::WARN, |level| level.min(LevelFilter::WARN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_logging_is_capped_at_warn() {
        assert_eq!(stderr_level("info"), LevelFilter::WARN);
        assert_eq!(stderr_level("trace"), LevelFilter::WARN);
        assert_eq!(stderr_level("error"), LevelFilter::ERROR);
        assert_eq!(stderr_level("off"), LevelFilter::OFF);
        assert_eq!(stderr_level("rosewatch=debug"), LevelFilter::WARN);
    }
}
