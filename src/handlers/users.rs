//! Online user listing.

use async_trait::async_trait;
use chatter_proto::{Inbound, Outbound, UserEntry};

use super::core::context::misrouted;
use super::{Context, Handler};
use crate::error::HandlerResult;

/// Handler for `get_user_list`. Replies to the requester only, listing every
/// session in registration order (the requester included).
pub struct UserListHandler;

#[async_trait]
impl Handler for UserListHandler {
    async fn handle(&self, ctx: &Context<'_>, envelope: Inbound) -> HandlerResult {
        if envelope != Inbound::GetUserList {
            return Err(misrouted(&envelope));
        }

        let users = ctx
            .hub
            .registry
            .snapshot()
            .iter()
            .map(|s| UserEntry {
                id: s.client_id(),
                name: s.name().to_string(),
            })
            .collect();

        ctx.reply(&Outbound::user_list(users))
    }
}
