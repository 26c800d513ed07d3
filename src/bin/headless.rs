//! Headless bridge: the engine plus the JSON server, no terminal.
//!
//! Out-of-process renderers connect over TCP and drive the game. Logs go to
//! stderr; the bound address is printed on stdout for scripts.

use anyhow::Result;
use tracing::info;

use tui_2048::adapter::Adapter;
use tui_2048::config::{init_logging, LogTarget, RunConfig};
use tui_2048::core::{Engine, NullRenderer};

fn main() -> Result<()> {
    let config = RunConfig::from_env();
    init_logging(LogTarget::Stderr)?;

    let mut adapter = Adapter::start(config.server.clone())?;
    println!("{}", adapter.local_addr());

    let seed = config.resolve_seed();
    let mut engine = Engine::new(seed, NullRenderer);
    engine.new_game();
    info!(seed, addr = %adapter.local_addr(), "headless bridge ready");

    while let Some(inbound) = adapter.recv_blocking() {
        adapter.handle(&mut engine, &inbound);
    }

    info!("command channel closed");
    Ok(())
}
