use async_trait::async_trait;
use chatter_proto::{Inbound, Outbound};
use tracing::debug;

use crate::error::HandlerResult;
use crate::handlers::core::context::misrouted;
use crate::handlers::helpers::fanout;
use crate::handlers::{Context, Handler};

/// Handler for `private_message`.
///
/// Stored even when the recipient is offline. Delivered to the first session
/// registered with the recipient's client id; the sender gets no echo.
pub struct PrivateMessageHandler;

#[async_trait]
impl Handler for PrivateMessageHandler {
    async fn handle(&self, ctx: &Context<'_>, envelope: Inbound) -> HandlerResult {
        let (recipient_id, message) = match envelope {
            Inbound::PrivateMessage {
                recipient_id,
                message,
            } => (recipient_id, message),
            other => return Err(misrouted(&other)),
        };

        ctx.hub
            .history
            .append_private(ctx.identity.id, recipient_id, &message)
            .await?;

        let Some(recipient) = ctx.hub.registry.find_by_client_id(recipient_id) else {
            debug!(recipient_id, "Private message recipient offline; stored only");
            return Ok(());
        };

        fanout::unicast(&recipient, &Outbound::private_message(ctx.name(), message))?;
        Ok(())
    }
}
