//! Per-connection resource limits.

use serde::Deserialize;

/// Per-connection resource limits.
///
/// These bound how much memory one slow or abusive client can pin.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Outbound queue capacity per session, in frames (default: 256).
    /// A recipient whose queue is full is disconnected as a slow consumer.
    #[serde(default = "default_send_queue")]
    pub send_queue: usize,
    /// Largest inbound text frame that will be parsed (default: 64 KiB).
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            send_queue: default_send_queue(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

fn default_send_queue() -> usize {
    256
}

fn default_max_frame_bytes() -> usize {
    64 * 1024
}
