//! Native-host channel for the linker panel.
//!
//! Each connection is a child process speaking native-messaging frames over its
//! stdio. The child is owned by a dedicated background thread for the lifetime of
//! the connection; requests go in over a crossbeam channel and everything the
//! thread observes comes back as `AppEvent::Native` on the event bus.
pub mod worker;

use crossbeam_channel::Sender;
use tokio::sync::mpsc::UnboundedSender;

use linker_core::protocol::Request;
use linker_core::{ChannelId, Connector, LinkerResult};

use crate::event::AppEvent;

/// Starts the configured host executable on every `connect`.
pub struct NativeHostConnector {
    command: String,
    args: Vec<String>,
    event_tx: UnboundedSender<AppEvent>,
}

impl NativeHostConnector {
    pub fn new(command: String, args: Vec<String>, event_tx: UnboundedSender<AppEvent>) -> Self {
        Self { command, args, event_tx }
    }
}

impl Connector for NativeHostConnector {
    /// Spawns the worker thread; the host process itself is started there, so a
    /// missing executable surfaces as `ChannelEvent::Closed` rather than here.
    fn open(&mut self, channel: ChannelId) -> LinkerResult<Sender<Request>> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let command = self.command.clone();
        let args = self.args.clone();
        let event_tx = self.event_tx.clone();
        std::thread::Builder::new()
            .name(format!("native-host-{channel}"))
            .spawn(move || worker::host_loop(command, args, channel, rx, event_tx))?;
        Ok(tx)
    }
}
