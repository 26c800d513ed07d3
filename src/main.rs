//! Terminal 2048 runner (default binary).
//!
//! crossterm input (keys and mouse swipes), the framebuffer renderer, and the
//! optional JSON bridge (`TUI_2048_ADAPTER=1`) sharing one engine.

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use tracing::{debug, info, warn};

use tui_2048::adapter::Adapter;
use tui_2048::config::{init_logging, LogTarget, RunConfig};
use tui_2048::core::Engine;
use tui_2048::input::{handle_key_event, should_quit, MoveGate, SwipeTracker};
use tui_2048::term::{
    AdapterStatusView, FrameBuffer, GameView, SnapshotSlot, TerminalRenderer, ViewContext,
    Viewport,
};
use tui_2048::types::{GameAction, TICK_MS};

fn main() -> Result<()> {
    let config = RunConfig::from_env();
    init_logging(LogTarget::File(config.log_path.clone()))?;

    let mut adapter = if config.adapter_enabled {
        let adapter = Adapter::start(config.server.clone())?;
        info!(addr = %adapter.local_addr(), "bridge enabled");
        Some(adapter)
    } else {
        None
    };

    let mut term = TerminalRenderer::new();
    let result = term.enter().and_then(|()| run(&mut term, &config, adapter.as_mut()));

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

fn run(
    term: &mut TerminalRenderer,
    config: &RunConfig,
    mut adapter: Option<&mut Adapter>,
) -> Result<()> {
    let seed = config.resolve_seed();
    let mut engine = Engine::new(seed, SnapshotSlot::new());
    engine.new_game();

    let view = GameView::default();
    let mut fb = FrameBuffer::new(0, 0);
    let mut gate = MoveGate::new(config.settle_ms);
    let mut swipe = SwipeTracker::new();
    let mut bridge_view: Option<AdapterStatusView> = None;
    let mut was_settling = false;

    let tick = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();

    loop {
        // Remote commands are applied in arrival order, outside the settle gate.
        if let Some(adapter) = adapter.as_deref_mut() {
            adapter.pump(&mut engine);
            let status = adapter.status();
            let current = AdapterStatusView {
                client_count: status.client_count().min(u16::MAX as usize) as u16,
                controller_id: status.controller_id(),
            };
            if bridge_view != Some(current) {
                bridge_view = Some(current);
                engine.renderer_mut().mark_dirty();
            }
        }

        // Highlights are only drawn while settling; redraw when that flips.
        let settling = gate.is_settling();
        if settling != was_settling {
            was_settling = settling;
            engine.renderer_mut().mark_dirty();
        }

        if let Some(snap) = engine.renderer_mut().take_dirty() {
            let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
            let ctx = ViewContext {
                settling,
                adapter: bridge_view.as_ref(),
            };
            view.render_into_with(snap, &ctx, Viewport::new(w, h), &mut fb);
            term.draw_swap(&mut fb)?;
        }

        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if should_quit(key) {
                        info!(score = engine.state().score().unwrap_or(0), "quit");
                        return Ok(());
                    }
                    handle_key_event(key)
                }
                Event::Mouse(mouse) => swipe.handle_mouse_event(mouse).map(GameAction::Move),
                Event::Resize(_, _) => {
                    term.invalidate();
                    engine.renderer_mut().mark_dirty();
                    None
                }
                Event::FocusLost => {
                    swipe.reset();
                    None
                }
                _ => None,
            };

            if let Some(action) = action {
                if !gate.admit(action) {
                    debug!(action = action.as_str(), "move dropped while settling");
                } else {
                    match engine.apply_action(action) {
                        Ok(changed) => {
                            gate.on_applied(action, changed);
                            if changed {
                                if let Some(adapter) = adapter.as_deref() {
                                    let seq = engine.state().move_count() as u64;
                                    adapter.broadcast_state(&engine, seq);
                                }
                            }
                        }
                        Err(e) => warn!(action = action.as_str(), error = %e, "action rejected"),
                    }
                }
            }
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick {
            last_tick = Instant::now();
            gate.update(elapsed.as_millis().min(u32::MAX as u128) as u32);
        }
    }
}
