use async_trait::async_trait;
use chatter_proto::{Inbound, Outbound, SELF_SENDER};

use crate::error::HandlerResult;
use crate::handlers::core::context::misrouted;
use crate::handlers::helpers::fanout;
use crate::handlers::{Context, Handler};

/// Handler for `public_message`.
///
/// The sender gets an acknowledgment and, like everyone else, the broadcast.
pub struct PublicMessageHandler;

#[async_trait]
impl Handler for PublicMessageHandler {
    async fn handle(&self, ctx: &Context<'_>, envelope: Inbound) -> HandlerResult {
        let message = match envelope {
            Inbound::PublicMessage { message } => message,
            other => return Err(misrouted(&other)),
        };

        ctx.hub
            .history
            .append_public(ctx.identity.id, &message)
            .await?;

        ctx.reply(&Outbound::chat(format!("You wrote: {message}"), SELF_SENDER))?;

        let name = ctx.name();
        fanout::broadcast(ctx.hub, &Outbound::chat(format!("{name} says: {message}"), name))?;
        Ok(())
    }
}
