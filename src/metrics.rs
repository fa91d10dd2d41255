//! Prometheus metrics collection for chatterd.
//!
//! Metrics are exposed on the HTTP side-server at `/metrics`.
//!
//! - `chatterd_connected_sessions` - Live sessions in the registry (gauge)
//! - `chatterd_envelopes_total{type}` - Inbound envelopes dispatched by type
//! - `chatterd_envelope_duration_seconds{type}` - Dispatch latency histogram
//! - `chatterd_message_fanout` - Recipients per fan-out (histogram)

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Frames delivered to session queues.
pub static FRAMES_QUEUED: OnceLock<IntCounter> = OnceLock::new();

/// Recipients disconnected because their send queue was full.
pub static SLOW_CONSUMERS: OnceLock<IntCounter> = OnceLock::new();

/// Failed message appends.
pub static STORAGE_FAILURES: OnceLock<IntCounter> = OnceLock::new();

/// Connects refused by the identity gateway, by reason.
pub static AUTH_REJECTIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Inbound frames dropped as malformed, by reason.
pub static PROTOCOL_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Currently registered sessions.
pub static CONNECTED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Envelope metrics
// ========================================================================

/// Envelopes dispatched by type (public_message, typing, etc.).
pub static ENVELOPE_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Envelope handling latency by type.
pub static ENVELOPE_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Handler errors by envelope type and error kind.
pub static ENVELOPE_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Recipients per broadcast or unicast.
pub static MESSAGE_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before any metrics are recorded.
/// Recording before `init` is a silent no-op.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(FRAMES_QUEUED, IntCounter::new("chatterd_frames_queued_total", "Frames queued to sessions"));
    register!(SLOW_CONSUMERS, IntCounter::new("chatterd_slow_consumer_drops_total", "Sessions dropped for a full send queue"));
    register!(STORAGE_FAILURES, IntCounter::new("chatterd_storage_failures_total", "Failed message appends"));
    register!(AUTH_REJECTIONS, IntCounterVec::new(Opts::new("chatterd_auth_rejections_total", "Connects refused by reason"), &["reason"]));
    register!(PROTOCOL_ERRORS, IntCounterVec::new(Opts::new("chatterd_protocol_errors_total", "Malformed inbound frames by reason"), &["reason"]));
    register!(CONNECTED_SESSIONS, IntGauge::new("chatterd_connected_sessions", "Currently registered sessions"));

    register!(ENVELOPE_COUNTER, IntCounterVec::new(Opts::new("chatterd_envelopes_total", "Inbound envelopes by type"), &["type"]));
    register!(ENVELOPE_LATENCY, HistogramVec::new(
        HistogramOpts::new("chatterd_envelope_duration_seconds", "Envelope handling latency by type")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["type"]));
    register!(ENVELOPE_ERRORS, IntCounterVec::new(Opts::new("chatterd_handler_errors_total", "Handler errors by type"), &["type", "error"]));
    register!(MESSAGE_FANOUT, Histogram::with_opts(
        HistogramOpts::new("chatterd_message_fanout", "Recipients per delivered envelope")
            .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

/// Record an envelope dispatch with latency.
#[inline]
pub fn record_envelope(kind: &str, duration_secs: f64) {
    if let Some(c) = ENVELOPE_COUNTER.get() {
        c.with_label_values(&[kind]).inc();
    }
    if let Some(h) = ENVELOPE_LATENCY.get() {
        h.with_label_values(&[kind]).observe(duration_secs);
    }
}

/// Record a handler error.
#[inline]
pub fn record_envelope_error(kind: &str, error: &str) {
    if let Some(c) = ENVELOPE_ERRORS.get() {
        c.with_label_values(&[kind, error]).inc();
    }
}

#[inline]
pub fn record_protocol_error(reason: &str) {
    if let Some(c) = PROTOCOL_ERRORS.get() {
        c.with_label_values(&[reason]).inc();
    }
}

#[inline]
pub fn record_auth_rejection(reason: &str) {
    if let Some(c) = AUTH_REJECTIONS.get() {
        c.with_label_values(&[reason]).inc();
    }
}

#[inline]
pub fn inc_storage_failure() {
    if let Some(c) = STORAGE_FAILURES.get() {
        c.inc();
    }
}

#[inline]
pub fn inc_slow_consumer() {
    if let Some(c) = SLOW_CONSUMERS.get() {
        c.inc();
    }
}

#[inline]
pub fn set_connected_sessions(count: usize) {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.set(count as i64);
    }
}

/// Record message fan-out (how many sessions a frame was queued for).
#[inline]
pub fn record_fanout(recipients: usize) {
    if let Some(c) = FRAMES_QUEUED.get() {
        c.inc_by(recipients as u64);
    }
    if let Some(h) = MESSAGE_FANOUT.get() {
        h.observe(recipients as f64);
    }
}
