//! Fan-out helpers: broadcast, broadcast-except-sender, and point-to-point.
//!
//! Every helper encodes the envelope once and queues the same frame for each
//! recipient. Delivery is `try_send` only; nothing here waits on a client.

use chatter_proto::Outbound;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::state::{ConnId, Delivery, Frame, Hub, Session};

/// Encode an envelope into a shareable frame.
pub fn encode(out: &Outbound) -> Result<Frame, HandlerError> {
    Ok(Arc::from(out.encode()?))
}

/// Queue for every registered session, sender included. Returns how many
/// sessions accepted the frame.
pub fn broadcast(hub: &Hub, out: &Outbound) -> Result<usize, HandlerError> {
    fan_out(hub, out, None)
}

/// Queue for every registered session except `except`.
pub fn broadcast_except(hub: &Hub, except: ConnId, out: &Outbound) -> Result<usize, HandlerError> {
    fan_out(hub, out, Some(except))
}

/// Queue for one session.
pub fn unicast(session: &Session, out: &Outbound) -> Result<Delivery, HandlerError> {
    let delivery = session.deliver(encode(out)?);
    if delivery == Delivery::Queued {
        crate::metrics::record_fanout(1);
    }
    Ok(delivery)
}

/// Broadcast a line from the `system` sender.
pub fn notice(hub: &Hub, text: impl Into<String>) -> Result<usize, HandlerError> {
    broadcast(hub, &Outbound::notice(text))
}

fn fan_out(hub: &Hub, out: &Outbound, except: Option<ConnId>) -> Result<usize, HandlerError> {
    let frame = encode(out)?;

    let mut queued = 0;
    for session in hub.registry.snapshot() {
        if except == Some(session.conn()) {
            continue;
        }
        if session.deliver(Arc::clone(&frame)) == Delivery::Queued {
            queued += 1;
        }
    }

    crate::metrics::record_fanout(queued);
    Ok(queued)
}
