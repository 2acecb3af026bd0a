//! linker — related issue / pull request suggestions for a GitHub page.
//!
//! Entry point for the `linker` binary. Wires together configuration
//! (`config`), file logging (`logging`), the terminal lifecycle (`tui`), the
//! unified event bus (`event`), the native-host channel (`native`), the UI
//! (`ui`, `theme`, `app`), and the session core (`linker-core`).
//!
//! # Startup sequence
//!
//! 1. Load config and install the file logger. Nothing is printed to the
//!    terminal: the panel owns it.
//! 2. Open the durable store and activate the session for the page URL. The
//!    restored view, if still valid, is rendered into the model before the
//!    first frame.
//! 3. `install_panic_hook()`, `register_sigterm()`, `init_tui()`.
//! 4. Spawn the event task and, if configured, connect to the native host.
//!
//! `restore_tui()` runs after the event loop returns, whatever the outcome.
//! Quitting is the panel teardown: the channel is closed and nothing survives
//! in memory; the next run restores exclusively from the store.

mod app;
mod config;
mod event;
mod logging;
mod native;
mod theme;
mod tui;
mod ui;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use linker_core::db::StateStore;
use linker_core::{LinkerError, LinkerResult, NativeSessionManager, PanelView};

use app::{PanelModel, SessionSnapshot};
use config::PanelConfig;
use event::AppEvent;
use native::NativeHostConnector;
use ui::keybindings::{self, KeyAction};

type Session = NativeSessionManager<PanelModel>;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let (config, config_problem) = PanelConfig::load();
    logging::init(&config.log_file, &config.log_level)?;
    if let Some(problem) = config_problem {
        warn!(%problem, "using default configuration");
    }

    let theme = theme::Theme::from_name(&config.theme);
    let page_url = config::page_url(std::env::args().skip(1));
    info!(page = %page_url, "panel starting");

    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let store = StateStore::open(&config.db_path.to_string_lossy())
        .await
        .map_err(std::io::Error::other)?;
    let mut session = NativeSessionManager::activate(
        store,
        PanelModel::default(),
        &page_url,
        &config.benign_marker,
    )
    .await
    .map_err(std::io::Error::other)?;

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut connector =
        NativeHostConnector::new(config.host_command.clone(), config.host_args.clone(), handler.tx.clone());
    let mut rx = handler.rx;

    if config.auto_connect {
        // Failures are already on the status line; the user retries with `c`.
        let _ = session.connect(&mut connector);
    }

    let outcome = run(&mut terminal, &mut session, &mut connector, &mut rx, &term_flag, &theme).await;

    session.close();
    info!("panel closed");
    tui::restore_tui()?;
    outcome
}

/// The event loop. Returns on quit, SIGTERM, channel close, or a draw error.
async fn run(
    terminal: &mut tui::Tui,
    session: &mut Session,
    connector: &mut NativeHostConnector,
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<AppEvent>,
    term_flag: &Arc<AtomicBool>,
    theme: &theme::Theme,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            // Heartbeat: a quiescent terminal would otherwise block in recv()
            // and the SIGTERM flag would never be polled.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {}
            maybe_event = rx.recv() => match maybe_event {
                Some(AppEvent::Render) => {
                    let snapshot = SessionSnapshot::of(session);
                    terminal.draw(|frame| ui::render(frame, session.view_mut(), &snapshot, theme))?;
                }
                Some(AppEvent::Key(key)) => {
                    let action = keybindings::handle_key(key, session.view_mut());
                    if action == KeyAction::Quit {
                        return Ok(());
                    }
                    let result = apply(session, connector, action).await;
                    report(session, result);
                }
                Some(AppEvent::Mouse(mouse)) => {
                    keybindings::handle_mouse(mouse, session.view_mut());
                }
                Some(AppEvent::Native(channel, event)) => {
                    let result = session.handle_channel_event(channel, event).await;
                    report(session, result);
                }
                // ratatui picks up the new size from frame.area() on the next Render.
                Some(AppEvent::Resize(width, height)) => debug!(width, height, "terminal resized"),
                Some(AppEvent::Tick) => {}
                None => return Ok(()),
            },
        }
        if term_flag.load(Ordering::Relaxed) {
            info!("SIGTERM received");
            return Ok(());
        }
    }
}

/// Runs the session operation a key asked for.
async fn apply(session: &mut Session, connector: &mut NativeHostConnector, action: KeyAction) -> LinkerResult<()> {
    match action {
        KeyAction::Continue | KeyAction::Quit => Ok(()),
        KeyAction::Connect => session.connect(connector),
        KeyAction::RequestPrediction => session.request_prediction(),
        KeyAction::RequestModelUpdate => session.request_model_update(),
        KeyAction::RecordSelections => session.record_selections(),
        KeyAction::Toggle(id) => session.toggle(&id).await.map(|_| ()),
        KeyAction::StepThreshold(delta) => session.step_threshold(delta).await.map(|_| ()),
    }
}

/// Surfaces failures the session has not already shown.
fn report(session: &mut Session, result: LinkerResult<()>) {
    match result {
        Ok(()) => {}
        Err(err @ (LinkerError::ChannelUnavailable(_) | LinkerError::IneligiblePage(_))) => {
            debug!(error = %err, "already reported to the user");
        }
        Err(err) => {
            error!(error = %err, "session operation failed");
            session.view_mut().show_error(&err.to_string());
        }
    }
}
