//! Connection handle generation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque handle for one live connection. Unique per process.
///
/// Client ids come from the URL and may collide; this never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(u64);

impl ConnId {
    /// Raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base36_encode_6(self.0))
    }
}

/// Generates connection handles.
///
/// Displayed as 6-character base36 strings ("AAAAAB") so they are easy to
/// tell apart from numeric client ids in logs.
pub struct ConnIdGenerator {
    counter: AtomicU64,
}

impl ConnIdGenerator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    /// Generate the next unique handle.
    pub fn next(&self) -> ConnId {
        ConnId(self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a number as a 6-character base36 string.
fn base36_encode_6(mut n: u64) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut result = [b'A'; 6];

    for slot in result.iter_mut().rev() {
        *slot = CHARS[(n % 36) as usize];
        n /= 36;
    }

    String::from_utf8_lossy(&result).into_owned()
}
