//! # Hash Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada: configura logging, arranca el servidor y al apagarse
//! reporta cuánto tiempo corrió y las estadísticas finales.

use anyhow::{Context, Result};
use hash_server::app::{App, StopSignal};
use hash_server::config::Config;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("failed to initialise logging")?;

    let config = Config::new();
    config.log_summary();

    let mut app = App::new(config).context("invalid configuration")?;

    let stop_tx = app.stop_sender();
    ctrlc::set_handler(move || {
        if stop_tx.send(StopSignal::Interrupt).is_err() {
            warn!("interrupt received after shutdown");
        }
    })
    .context("failed to set Ctrl-C handler")?;

    let report = app.run().context("server failed")?;

    info!(
        "This program was running for {:.6}s",
        report.uptime.as_secs_f64()
    );
    info!(
        total = report.stats.total,
        average_ms = report.stats.average,
        "final stats"
    );
    Ok(())
}
