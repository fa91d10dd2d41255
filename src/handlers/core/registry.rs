//! Envelope router.
//!
//! The `Router` decodes inbound text frames, dispatches recognized envelopes
//! to the handler registered under their `type`, and applies the error policy:
//! malformed frames are dropped and counted, storage failures are reported to
//! the sender only, and nothing a handler does can close another connection.

use super::context::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{
    messaging::{PrivateMessageHandler, PublicMessageHandler},
    presence::TypingHandler,
    receipts::ReadReceiptHandler,
    users::UserListHandler,
};
use crate::telemetry::{EnvelopeTimer, spans};
use chatter_proto::{Inbound, ProtocolError, kinds};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Instrument, debug, error, warn};

/// Registry of envelope handlers.
pub struct Router {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
    /// Dispatch counters per envelope type.
    envelope_counts: HashMap<&'static str, Arc<AtomicU64>>,
    max_frame_bytes: usize,
}

impl Router {
    /// Create a router with all handlers registered.
    pub fn new(max_frame_bytes: usize) -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        handlers.insert(kinds::PUBLIC_MESSAGE, Box::new(PublicMessageHandler));
        handlers.insert(kinds::PRIVATE_MESSAGE, Box::new(PrivateMessageHandler));
        handlers.insert(kinds::TYPING, Box::new(TypingHandler::started()));
        handlers.insert(kinds::STOP_TYPING, Box::new(TypingHandler::stopped()));
        handlers.insert(kinds::READ_RECEIPT, Box::new(ReadReceiptHandler));
        handlers.insert(kinds::GET_USER_LIST, Box::new(UserListHandler));

        let envelope_counts = handlers
            .keys()
            .map(|&kind| (kind, Arc::new(AtomicU64::new(0))))
            .collect();

        Self {
            handlers,
            envelope_counts,
            max_frame_bytes,
        }
    }

    /// Dispatch counts, most used first. Unused types are omitted.
    pub fn envelope_stats(&self) -> Vec<(&'static str, u64)> {
        let mut stats: Vec<_> = self
            .envelope_counts
            .iter()
            .map(|(kind, count)| (*kind, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        stats
    }

    /// Handle one inbound text frame end to end. Never fails; every error is
    /// logged, counted, and reported to the sender when appropriate.
    pub async fn handle_frame(&self, ctx: &Context<'_>, raw: &str) {
        let envelope = match self.decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => return self.report(ctx, "invalid", HandlerError::Protocol(e)),
        };

        let kind = envelope.kind().to_string();
        if let Err(e) = self.dispatch(ctx, envelope).await {
            crate::metrics::record_envelope_error(&kind, e.error_code());
            self.report(ctx, &kind, e);
        }
    }

    /// Report a protocol error detected outside text decoding (binary frames).
    pub fn reject(&self, ctx: &Context<'_>, err: ProtocolError) {
        self.report(ctx, "invalid", HandlerError::Protocol(err));
    }

    fn decode(&self, raw: &str) -> Result<Inbound, ProtocolError> {
        if raw.len() > self.max_frame_bytes {
            return Err(ProtocolError::FrameTooLarge {
                len: raw.len(),
                limit: self.max_frame_bytes,
            });
        }
        Inbound::parse(raw)
    }

    /// Dispatch a decoded envelope to its handler.
    ///
    /// Unrecognized types are dropped without a reply.
    pub async fn dispatch(&self, ctx: &Context<'_>, envelope: Inbound) -> HandlerResult {
        let Some((&kind, handler)) = self.handlers.get_key_value(envelope.kind()) else {
            debug!(envelope = %envelope.kind(), conn = %ctx.session.conn(), "Dropping unrecognized envelope");
            crate::metrics::record_protocol_error("unrecognized_type");
            return Ok(());
        };

        if let Some(counter) = self.envelope_counts.get(kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let span = spans::envelope(
            kind,
            &ctx.session.conn().to_string(),
            ctx.session.client_id(),
            ctx.name(),
        );
        let _timer = EnvelopeTimer::new(kind);

        handler.handle(ctx, envelope).instrument(span).await
    }

    fn report(&self, ctx: &Context<'_>, kind: &str, err: HandlerError) {
        let session = ctx.session;
        match &err {
            HandlerError::Protocol(e) => {
                warn!(conn = %session.conn(), client_id = session.client_id(), reason = e.reason(), error = %e, "Dropping malformed frame");
                crate::metrics::record_protocol_error(e.reason());
            }
            HandlerError::Storage(e) => {
                warn!(conn = %session.conn(), envelope = %kind, error = %e, "Message not stored; delivery aborted");
                crate::metrics::inc_storage_failure();
            }
            HandlerError::QueueClosed => {
                debug!(conn = %session.conn(), envelope = %kind, "Sender queue closed");
            }
            HandlerError::Internal(msg) => {
                error!(conn = %session.conn(), envelope = %kind, error = %msg, "Handler failed");
            }
        }

        if let Some(reply) = err.to_envelope()
            && let Err(e) = ctx.reply(&reply)
        {
            debug!(conn = %session.conn(), error = %e, "Could not deliver error envelope");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::core::testing::{Stored, TestHub, drain, identity};
    use serde_json::json;

    fn router() -> Router {
        Router::new(1024)
    }

    #[tokio::test]
    async fn malformed_frames_are_dropped_silently() {
        let t = TestHub::new();
        let (alice, mut rx) = t.connect(1, "Alice");
        let me = identity(10, "alice");
        let ctx = Context::new(&t.hub, &alice, &me);
        let router = router();

        for raw in [
            "not json",
            "[]",
            r#"{"message":"no type"}"#,
            r#"{"type":"public_message"}"#,
            r#"{"type":"private_message","recipient_id":"x","message":"m"}"#,
        ] {
            router.handle_frame(&ctx, raw).await;
        }

        assert!(drain(&mut rx).is_empty());
        assert!(t.stored().is_empty());
        assert_eq!(t.hub.registry.len(), 1);
        assert!(!alice.is_closing());
    }

    #[tokio::test]
    async fn unrecognized_type_is_ignored() {
        let t = TestHub::new();
        let (alice, mut rx) = t.connect(1, "Alice");
        let me = identity(10, "alice");
        let ctx = Context::new(&t.hub, &alice, &me);

        router().handle_frame(&ctx, r#"{"type":"wave"}"#).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn oversized_frame_is_not_parsed() {
        let t = TestHub::new();
        let (alice, mut rx) = t.connect(1, "Alice");
        let me = identity(10, "alice");
        let ctx = Context::new(&t.hub, &alice, &me);

        let big = format!(r#"{{"type":"public_message","message":"{}"}}"#, "x".repeat(2048));
        router().handle_frame(&ctx, &big).await;

        assert!(drain(&mut rx).is_empty());
        assert!(t.stored().is_empty());
    }

    #[tokio::test]
    async fn valid_frame_after_malformed_one_still_works() {
        let t = TestHub::new();
        let (alice, mut rx) = t.connect(1, "Alice");
        let me = identity(10, "alice");
        let ctx = Context::new(&t.hub, &alice, &me);
        let router = router();

        router.handle_frame(&ctx, "{").await;
        router.handle_frame(&ctx, r#"{"type":"get_user_list"}"#).await;

        assert_eq!(
            drain(&mut rx),
            vec![json!({"type": "user_list", "users": [{"id": 1, "name": "Alice"}]})]
        );
        assert_eq!(router.envelope_stats(), vec![("get_user_list", 1)]);
    }

    #[tokio::test]
    async fn storage_failure_reports_to_sender_only() {
        let t = TestHub::new();
        t.fail_storage();
        let (alice, mut a_rx) = t.connect(1, "Alice");
        let (_bob, mut b_rx) = t.connect(2, "Bob");
        let me = identity(10, "alice");
        let ctx = Context::new(&t.hub, &alice, &me);
        let router = router();

        router
            .handle_frame(&ctx, r#"{"type":"public_message","message":"hi"}"#)
            .await;
        router
            .handle_frame(&ctx, r#"{"type":"private_message","recipient_id":2,"message":"psst"}"#)
            .await;

        let errors = drain(&mut a_rx);
        assert_eq!(errors.len(), 2);
        for e in &errors {
            assert_eq!(e["type"], "error");
            assert_eq!(e["code"], "storage_unavailable");
        }
        assert!(drain(&mut b_rx).is_empty());
        assert_eq!(t.stored(), Vec::<Stored>::new());
    }

    #[tokio::test]
    async fn binary_frames_are_rejected_without_reply() {
        let t = TestHub::new();
        let (alice, mut rx) = t.connect(1, "Alice");
        let me = identity(10, "alice");
        let ctx = Context::new(&t.hub, &alice, &me);

        router().reject(&ctx, ProtocolError::BinaryFrame);
        assert!(drain(&mut rx).is_empty());
        assert!(!alice.is_closing());
    }
}
