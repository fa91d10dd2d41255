//! Read receipts.

use async_trait::async_trait;
use chatter_proto::{Inbound, Outbound};
use tracing::debug;

use super::core::context::misrouted;
use super::helpers::fanout;
use super::{Context, Handler};
use crate::error::HandlerResult;

/// Handler for `read_receipt`: tell the original author their message was read.
///
/// Addressed by display name; the first session registered under that name
/// gets it. Unknown names are dropped without telling the reader.
pub struct ReadReceiptHandler;

#[async_trait]
impl Handler for ReadReceiptHandler {
    async fn handle(&self, ctx: &Context<'_>, envelope: Inbound) -> HandlerResult {
        let (original_sender, message) = match envelope {
            Inbound::ReadReceipt {
                original_sender,
                message,
            } => (original_sender, message),
            other => return Err(misrouted(&other)),
        };

        let Some(author) = ctx.hub.registry.find_by_name(&original_sender) else {
            debug!(original_sender = %original_sender, "Read receipt for unknown name dropped");
            return Ok(());
        };

        fanout::unicast(&author, &Outbound::read_receipt(ctx.name(), message))?;
        Ok(())
    }
}
