//! Event bus for the linker panel.
//!
//! All user input, timer ticks, and native-host traffic are normalised into a
//! single `AppEvent` enum and sent over a tokio unbounded MPSC channel. The main
//! loop receives from this channel and dispatches accordingly. Quitting is not
//! an event: `q` is a `KeyAction` and SIGTERM is a flag the loop polls.
//!
//! Two independent intervals drive the render and logic cycles:
//! - **Render interval** (33 ms ≈ 30 FPS) — triggers a `terminal.draw()` call.
//! - **Tick interval** (250 ms = 4 Hz) — triggers application-state updates.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

use linker_core::{ChannelEvent, ChannelId};

/// All events the application can receive from any source.
#[derive(Debug)]
pub enum AppEvent {
    /// A key press from the terminal (`KeyEventKind::Press` only).
    ///
    /// Release and repeat events are filtered in [`spawn_event_task`] to avoid
    /// double-firing on Windows, which synthesises both press and release for
    /// every keystroke.
    Key(KeyEvent),
    /// A mouse event from the terminal (click, scroll, move).
    Mouse(MouseEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    /// Logic tick for state updates (4 Hz / 250 ms).
    Tick,
    /// Render tick — triggers a `terminal.draw()` call (≈30 FPS / 33 ms).
    Render,
    /// Something happened on a native-host connection.
    ///
    /// Tagged with the connection that produced it so the session manager can
    /// drop events from a connection it has already replaced.
    Native(ChannelId, ChannelEvent),
}

/// Holds the sender and receiver ends of the unified event channel.
///
/// The sender (`tx`) is cloned and distributed to background tasks and native
/// worker threads; the receiver (`rx`) is owned by the main event loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the background tokio task that drives the unified event channel.
///
/// The task runs until the receiver is dropped. Two fully independent
/// `tokio::time::interval` timers drive the render and logic cycles; crossterm
/// input is polled via `EventStream`.
///
/// - `reader.next().fuse()` — so that if the crossterm stream terminates,
///   `tokio::select!` does not keep polling a completed future.
/// - `KeyEventKind::Press` filter — Windows fires both `Press` and `Release`
///   for every keystroke.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            let sent = tokio::select! {
                _ = tick_tick => tx.send(AppEvent::Tick),
                _ = render_tick => tx.send(AppEvent::Render),
                maybe_event = crossterm_event => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        tx.send(AppEvent::Key(key))
                    }
                    Some(Ok(Event::Resize(w, h))) => tx.send(AppEvent::Resize(w, h)),
                    Some(Ok(Event::Mouse(mouse))) => tx.send(AppEvent::Mouse(mouse)),
                    _ => Ok(()),
                },
            };
            if sent.is_err() {
                break;
            }
        }
    });
}
