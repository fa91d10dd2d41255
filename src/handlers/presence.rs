//! Typing indicators.

use async_trait::async_trait;
use chatter_proto::{Inbound, Outbound};

use super::core::context::misrouted;
use super::helpers::fanout;
use super::{Context, Handler};
use crate::error::HandlerResult;

/// Handler for `typing` and `stop_typing`. Not stored; everyone but the
/// sender is told.
pub struct TypingHandler {
    stopped: bool,
}

impl TypingHandler {
    pub fn started() -> Self {
        Self { stopped: false }
    }

    pub fn stopped() -> Self {
        Self { stopped: true }
    }
}

#[async_trait]
impl Handler for TypingHandler {
    async fn handle(&self, ctx: &Context<'_>, envelope: Inbound) -> HandlerResult {
        match (&envelope, self.stopped) {
            (Inbound::Typing, false) | (Inbound::StopTyping, true) => {}
            _ => return Err(misrouted(&envelope)),
        }

        fanout::broadcast_except(
            ctx.hub,
            ctx.session.conn(),
            &Outbound::typing(ctx.name(), self.stopped),
        )?;
        Ok(())
    }
}
