//! Unified connection loop.
//!
//! One `tokio::select!` multiplexes the server shutdown token, the session's
//! close signal, the socket and the session's outbound queue, polled in that
//! order. Inbound text frames are handed to the router one at a time, which
//! keeps per-sender ordering intact.

use super::error_handling::{ReadErrorAction, classify_read_error};
use crate::handlers::{Context, Router};
use crate::network::TransportError;
use crate::state::Frame;
use chatter_proto::ProtocolError;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A write that makes no progress for this long ends the connection.
pub(super) const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Queued frames written per flush.
const MAX_WRITE_BATCH: usize = 64;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Why the loop ended without a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Exit {
    /// Close frame or end of stream from the client.
    PeerClosed,
    /// Outbound queue overflowed.
    Evicted,
    /// Server shutdown.
    Shutdown,
    /// The client broke the WebSocket protocol.
    ProtocolViolation,
}

pub(super) async fn run(
    ws: WebSocketStream<TcpStream>,
    mut outbox: mpsc::Receiver<Frame>,
    ctx: &Context<'_>,
    router: &Router,
    shutdown: &CancellationToken,
) -> Result<Exit, TransportError> {
    let (mut sink, mut stream) = ws.split();
    let session = ctx.session;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => return Ok(finish(&mut sink, Exit::Shutdown).await),

            _ = session.closed() => return Ok(finish(&mut sink, Exit::Evicted).await),

            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => router.handle_frame(ctx, &text).await,
                Some(Ok(Message::Binary(_))) => router.reject(ctx, ProtocolError::BinaryFrame),
                // Pings are answered by tungstenite on the next read or write.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Client closed connection");
                    let _ = tokio::time::timeout(WRITE_TIMEOUT, sink.close()).await;
                    return Ok(Exit::PeerClosed);
                }
                None => return Ok(Exit::PeerClosed),
                Some(Err(e)) => match classify_read_error(&e) {
                    ReadErrorAction::PeerGone => {
                        debug!(error = %e, "Peer went away");
                        return Ok(Exit::PeerClosed);
                    }
                    ReadErrorAction::Fatal { code, reason } => {
                        warn!(error = %e, reason, "Closing connection after WebSocket protocol error");
                        crate::metrics::record_protocol_error(reason);
                        close(&mut sink, code, reason).await;
                        return Ok(Exit::ProtocolViolation);
                    }
                    ReadErrorAction::IoError => return Err(e.into()),
                },
            },

            frame = outbox.recv() => {
                // The session holds the sender, so the queue cannot close under us.
                let Some(frame) = frame else {
                    return Ok(Exit::PeerClosed);
                };
                // A stalled write must not hide an eviction or a shutdown.
                let interrupted = tokio::select! {
                    biased;
                    result = write_batch(&mut sink, frame, &mut outbox) => {
                        result?;
                        None
                    }
                    _ = shutdown.cancelled() => Some(Exit::Shutdown),
                    _ = session.closed() => Some(Exit::Evicted),
                };
                if let Some(exit) = interrupted {
                    return Ok(finish(&mut sink, exit).await);
                }
            }
        }
    }
}

/// Write `first` plus whatever else is already queued, then flush once.
async fn write_batch(
    sink: &mut WsSink,
    first: Frame,
    outbox: &mut mpsc::Receiver<Frame>,
) -> Result<(), TransportError> {
    let write = async {
        sink.feed(Message::Text(first.to_string())).await?;
        for _ in 1..MAX_WRITE_BATCH {
            match outbox.try_recv() {
                Ok(frame) => sink.feed(Message::Text(frame.to_string())).await?,
                Err(_) => break,
            }
        }
        sink.flush().await
    };

    match tokio::time::timeout(WRITE_TIMEOUT, write).await {
        Ok(result) => result.map_err(TransportError::from),
        Err(_) => Err(TransportError::WriteTimeout(WRITE_TIMEOUT)),
    }
}

/// Send the close frame for a server-initiated exit.
async fn finish(sink: &mut WsSink, exit: Exit) -> Exit {
    match exit {
        Exit::Shutdown => close(sink, CloseCode::Away, "server shutting down").await,
        Exit::Evicted => close(sink, CloseCode::Policy, "send queue overflow").await,
        Exit::PeerClosed | Exit::ProtocolViolation => {}
    }
    exit
}

/// Best-effort close handshake; the connection ends either way.
async fn close(sink: &mut WsSink, code: CloseCode, reason: &'static str) {
    let frame = CloseFrame {
        code,
        reason: Cow::Borrowed(reason),
    };
    match tokio::time::timeout(WRITE_TIMEOUT, sink.send(Message::Close(Some(frame)))).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, "Failed to send close frame"),
        Err(_) => debug!("Timed out sending close frame"),
    }
}
