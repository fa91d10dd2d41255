//! Handler context and the handler trait.

use async_trait::async_trait;
use chatter_proto::{Inbound, Outbound};
use std::sync::Arc;

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::helpers::fanout;
use crate::security::Identity;
use crate::state::{Delivery, Hub, Session};

/// Everything a handler may touch while processing one envelope.
pub struct Context<'a> {
    /// Shared server state.
    pub hub: &'a Arc<Hub>,
    /// The sending session, as registered.
    pub session: &'a Arc<Session>,
    /// Verified identity of the sender; its id is the stored `sender_id`.
    pub identity: &'a Identity,
}

impl<'a> Context<'a> {
    pub fn new(hub: &'a Arc<Hub>, session: &'a Arc<Session>, identity: &'a Identity) -> Self {
        Self {
            hub,
            session,
            identity,
        }
    }

    /// Display name of the sender.
    #[inline]
    pub fn name(&self) -> &str {
        self.session.name()
    }

    /// Queue an envelope for the sender only.
    pub fn reply(&self, out: &Outbound) -> HandlerResult {
        match fanout::unicast(self.session, out)? {
            Delivery::Closed => Err(HandlerError::QueueClosed),
            Delivery::Queued | Delivery::SlowConsumer => Ok(()),
        }
    }
}

/// Handles one recognized envelope kind.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &Context<'_>, envelope: Inbound) -> HandlerResult;
}

/// Error for an envelope routed to a handler that does not expect it.
pub(crate) fn misrouted(envelope: &Inbound) -> HandlerError {
    HandlerError::Internal(format!("misrouted envelope: {}", envelope.kind()))
}
