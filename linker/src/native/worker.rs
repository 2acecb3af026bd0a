//! Background thread that owns one native-host process for its lifetime.
//!
//! Outbound: `Request`s arrive on a crossbeam `Receiver` and are written to the
//! child's stdin as frames. Inbound: a reader thread decodes frames from the
//! child's stdout and forwards them as `ChannelEvent::Message`. The connection
//! ends when either side goes away: the session drops its `Sender`, or the
//! child closes stdout.

use std::io::{BufReader, BufWriter};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use linker_core::protocol::{read_frame, write_frame, Request};
use linker_core::{ChannelEvent, ChannelId};

use crate::event::AppEvent;

/// Reported when the host executable cannot be started.
pub const HOST_NOT_FOUND: &str = "Specified native messaging host not found.";

/// Entry point for the thread that owns the host process.
///
/// Emits exactly one `Opened` or `Closed` first. After `Opened`, frames are
/// forwarded until the child exits (reported as `Closed`) or `rx` is
/// disconnected (the child is killed; nothing further is reported).
pub fn host_loop(
    command: String,
    args: Vec<String>,
    channel: ChannelId,
    rx: Receiver<Request>,
    event_tx: UnboundedSender<AppEvent>,
) {
    let mut child = match Command::new(&command)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            warn!(%channel, command = %command, error = %err, "could not start native host");
            let _ = event_tx.send(AppEvent::Native(channel, ChannelEvent::Closed(HOST_NOT_FOUND.to_owned())));
            return;
        }
    };

    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        shut_down(&mut child);
        let _ = event_tx.send(AppEvent::Native(
            channel,
            ChannelEvent::Closed("native host stdio unavailable".to_owned()),
        ));
        return;
    };

    info!(%channel, command = %command, pid = child.id(), "native host started");
    if event_tx.send(AppEvent::Native(channel, ChannelEvent::Opened)).is_err() {
        shut_down(&mut child);
        return;
    }

    let reader = spawn_reader(stdout, channel, event_tx);

    let mut stdin = BufWriter::new(stdin);
    for request in rx {
        debug!(%channel, request = request.type_name(), "writing frame");
        if let Err(err) = write_frame(&mut stdin, &request) {
            // The reader sees the same broken pipe as EOF and reports Closed.
            warn!(%channel, error = %err, "write to native host failed");
            break;
        }
    }

    drop(stdin);
    shut_down(&mut child);
    if let Some(reader) = reader {
        let _ = reader.join();
    }
    debug!(%channel, "native host worker finished");
}

fn spawn_reader(
    stdout: ChildStdout,
    channel: ChannelId,
    event_tx: UnboundedSender<AppEvent>,
) -> Option<JoinHandle<()>> {
    let spawned = std::thread::Builder::new()
        .name(format!("native-read-{channel}"))
        .spawn(move || read_loop(stdout, channel, event_tx));
    match spawned {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(%channel, error = %err, "could not start native reader thread");
            None
        }
    }
}

fn read_loop(stdout: ChildStdout, channel: ChannelId, event_tx: UnboundedSender<AppEvent>) {
    let mut reader = BufReader::new(stdout);
    let reason = loop {
        match read_frame(&mut reader) {
            Ok(Some(value)) => {
                if event_tx.send(AppEvent::Native(channel, ChannelEvent::Message(value))).is_err() {
                    return;
                }
            }
            Ok(None) => break "native host exited".to_owned(),
            Err(err) => break err.to_string(),
        }
    };
    info!(%channel, reason = %reason, "native host channel closed");
    let _ = event_tx.send(AppEvent::Native(channel, ChannelEvent::Closed(reason)));
}

fn shut_down(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn next_event(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> (ChannelId, ChannelEvent) {
        for _ in 0..200 {
            match rx.try_recv() {
                Ok(AppEvent::Native(id, event)) => return (id, event),
                Ok(_) => continue,
                Err(_) => std::thread::sleep(Duration::from_millis(10)),
            }
        }
        panic!("no native event within two seconds");
    }

    #[test]
    fn missing_host_reports_not_found() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (_tx, rx) = crossbeam_channel::unbounded();
        let channel = ChannelId::new();

        host_loop("linker-host-that-does-not-exist".into(), Vec::new(), channel, rx, event_tx);

        let (id, event) = next_event(&mut event_rx);
        assert_eq!(id, channel);
        assert_eq!(event, ChannelEvent::Closed(HOST_NOT_FOUND.to_owned()));
    }

    /// `cat` echoes every frame back, which exercises both framing directions.
    #[cfg(unix)]
    #[test]
    fn frames_round_trip_through_an_echo_host() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (tx, rx) = crossbeam_channel::unbounded();
        let channel = ChannelId::new();
        let worker = std::thread::spawn(move || host_loop("cat".into(), Vec::new(), channel, rx, event_tx));

        assert_eq!(next_event(&mut event_rx), (channel, ChannelEvent::Opened));

        tx.send(Request::Threshold { repository: "x/y".into() }).unwrap();
        assert_eq!(
            next_event(&mut event_rx),
            (channel, ChannelEvent::Message(json!({"Type": "Threshold", "Repository": "x/y"})))
        );

        drop(tx);
        worker.join().unwrap();
    }
}
