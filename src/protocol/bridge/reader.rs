//! Background tasks moving lines between the bridge socket and the session

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;

use crate::session::EventSink;
use crate::types::{ProtocolEvent, ProtocolFault};

use super::cache::WorldCache;
use super::messages::{Inbound, Outbound};

/// Spawn the task reading bridge notifications
///
/// Each line is folded into the world cache and, where it maps to a protocol
/// event, forwarded through `events`. When the socket closes without the
/// bridge having reported an end, a `SessionEnded` event is synthesised.
/// Nothing is emitted after `closed` is cancelled.
pub(super) fn spawn_reader(
    read: OwnedReadHalf,
    cache: Arc<RwLock<WorldCache>>,
    events: EventSink,
    max_line_length: usize,
    closed: CancellationToken,
) {
    tokio::spawn(async move {
        let mut lines = FramedRead::new(read, LinesCodec::new_with_max_length(max_line_length));

        let reason = loop {
            let next = tokio::select! {
                () = closed.cancelled() => return,
                next = lines.next() => next,
            };

            match next {
                None => break "connection closed".to_string(),
                Some(Ok(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let message = match serde_json::from_str::<Inbound>(line) {
                        Ok(message) => message,
                        Err(e) => {
                            log::warn!("[{}] Skipping malformed bridge line: {e}", events.session());
                            continue;
                        }
                    };

                    let event = cache.write().apply(message);
                    if let Some(event) = event
                        && !events.emit(event)
                    {
                        // Manager stopped listening
                        return;
                    }
                }
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    // The codec discards the rest of the oversized line
                    log::warn!(
                        "[{}] Bridge line exceeded maximum length of {max_line_length} bytes",
                        events.session()
                    );
                }
                Some(Err(LinesCodecError::Io(e))) => {
                    if !closed.is_cancelled() {
                        events.emit(ProtocolEvent::Error(ProtocolFault::from_io(&e)));
                    }
                    break format!("read error: {e}");
                }
            }
        };

        if closed.is_cancelled() || cache.read().ended {
            return;
        }
        cache.write().ended = true;
        events.emit(ProtocolEvent::SessionEnded { reason });
    });
}

/// Spawn the task writing requests to the bridge
///
/// Runs until a `Quit` request has been written or every sender is gone.
pub(super) fn spawn_writer(
    write: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    tokio::spawn(async move {
        let mut sink = FramedWrite::new(write, LinesCodec::new());

        while let Some(message) = outbound.recv().await {
            let is_quit = matches!(message, Outbound::Quit { .. });

            let line = match serde_json::to_string(&message) {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Failed to encode bridge request: {e}");
                    continue;
                }
            };

            if let Err(e) = sink.send(line).await {
                log::warn!("Bridge write failed: {e}");
                break;
            }

            if is_quit {
                break;
            }
        }

        let _ = SinkExt::<String>::close(&mut sink).await;
    });
}
