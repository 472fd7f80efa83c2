//! Correlation and entity ids: `<prefix>_<unix-millis>_<suffix>`.
//!
//! Unique enough for tracing and display; not a cryptographic guarantee.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

pub const REQUEST_ID_PREFIX: &str = "req";
pub const MESSAGE_ID_PREFIX: &str = "msg";
pub const CONVERSATION_ID_PREFIX: &str = "conv";

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Source of unique ids, injected so callers can make ids deterministic.
pub trait IdGenerator: Send + Sync {
    fn generate(&self, prefix: &str) -> String;
}

/// Wall-clock milliseconds plus a random base-36 suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampIdGenerator;

impl IdGenerator for TimestampIdGenerator {
    fn generate(&self, prefix: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        format!("{prefix}_{millis}_{suffix}")
    }
}

/// Deterministic `<prefix>_<n>` ids, counting from 1.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}_{n}")
    }
}
