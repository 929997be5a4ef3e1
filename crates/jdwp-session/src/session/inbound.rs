//! The inbound loop: the only reader of the connection.

use std::sync::Arc;
use std::time::Duration;

use jdwp_core::{CommandFrame, Packet};
use tokio::io::AsyncRead;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

use crate::session::framing::read_packet;
use crate::session::state::{SessionState, Shared};

/// Reads packets until the session stops or the connection breaks.
///
/// Replies are routed through the correlation table; command packets go to
/// `events`.  A full `events` queue blocks this loop, which in turn stops
/// reading from the socket.
///
/// On exit, by any path, `events` is closed and every pending caller is
/// released without a value.
pub(crate) async fn run<R>(
    mut reader: R,
    shared: Arc<Shared>,
    events: mpsc::Sender<CommandFrame>,
    mut stop: watch::Receiver<bool>,
    read_timeout: Duration,
) where
    R: AsyncRead + Unpin,
{
    debug!("inbound loop started");
    while shared.state() == SessionState::Open {
        let result = tokio::select! {
            _ = Shared::stopped(&mut stop) => break,
            result = read_packet(&mut reader, read_timeout) => result,
        };

        match result {
            Ok(Packet::Reply(frame)) => {
                let id = frame.id;
                debug!("reply {id} received (error code {})", frame.packet.error_code);
                if let Err(e) = shared.complete(frame) {
                    warn!("dropping reply: {e}");
                }
            }
            Ok(Packet::Command(frame)) => {
                debug!(
                    "unsolicited command {} ({}, {})",
                    frame.id, frame.packet.command_set, frame.packet.command
                );
                tokio::select! {
                    _ = Shared::stopped(&mut stop) => break,
                    sent = events.send(frame) => {
                        if sent.is_err() {
                            debug!("event consumer gone; discarding unsolicited packet");
                        }
                    }
                }
            }
            Err(e) => {
                if shared.fail_if_open() {
                    error!("inbound loop failed: {e}");
                } else {
                    debug!("inbound loop ending after stop: {e}");
                }
                break;
            }
        }
    }

    drop(events);
    let released = shared.release_pending();
    if released > 0 {
        debug!("released {released} pending requests");
    }
    debug!("inbound loop stopped");
}
