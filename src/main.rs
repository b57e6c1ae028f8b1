//! Headless match-3 runner (default binary).
//!
//! Builds an engine from `MATCH3_*` environment variables and serves it over
//! the JSON adapter until the process is killed.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use match3::adapter::{Adapter, Session};
use match3::engine::Match3Engine;
use match3::types::EngineConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::from_env();
    let engine = Match3Engine::new(config).context("invalid engine configuration")?;
    info!(
        width = engine.config().width,
        height = engine.config().height,
        tile_kinds = engine.config().tile_kinds,
        "engine ready"
    );

    let Some(mut adapter) = Adapter::start_from_env()? else {
        // Nothing to serve; show the board and exit.
        println!("{}", engine.grid());
        return Ok(());
    };
    info!(addr = %adapter.local_addr(), "serving");

    let mut session = Session::new(engine);
    while let Some(cmd) = adapter.recv_blocking() {
        for msg in session.handle(cmd) {
            adapter.send(msg);
        }
    }
    Ok(())
}
