//! Telemetry utilities for envelope timing and tracing spans.

use std::time::Instant;

/// Guard for timing envelope handling and recording metrics.
///
/// Records latency when dropped, so early returns are counted too.
pub struct EnvelopeTimer {
    kind: String,
    start: Instant,
}

impl EnvelopeTimer {
    /// Start timing an envelope.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for EnvelopeTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_envelope(&self.kind, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use std::net::SocketAddr;
    use tracing::{Span, debug_span, info_span};

    /// Span for one client connection, tagged with the server it belongs to.
    pub fn connection(addr: SocketAddr, server: &str) -> Span {
        info_span!(
            "connection",
            %server,
            %addr,
            conn = tracing::field::Empty,
            client_id = tracing::field::Empty,
            name = tracing::field::Empty
        )
    }

    /// Span for handling one inbound envelope.
    pub fn envelope(kind: &str, conn: &str, client_id: i64, name: &str) -> Span {
        debug_span!("envelope", envelope = %kind, conn = %conn, client_id, name = %name)
    }
}
