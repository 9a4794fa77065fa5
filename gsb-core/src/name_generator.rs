//! Human-readable names for instances the user did not name

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Source of fresh instance names
pub trait NameGenerator: Send + Sync {
    /// Generate a name whose words are joined by `separator`
    fn instance_name_with_separator(&self, separator: char) -> String;

    fn instance_name(&self) -> String {
        self.instance_name_with_separator('_')
    }
}

/// Generates `pcf<sep>sb<sep><counter><sep><unix nanos>`
///
/// The counter makes names unique within a process even when the clock does not advance.
#[derive(Debug, Default)]
pub struct BasicNameGenerator {
    count: AtomicU64,
}

impl BasicNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameGenerator for BasicNameGenerator {
    fn instance_name_with_separator(&self, separator: char) -> String {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        format!("pcf{separator}sb{separator}{count}{separator}{nanos}")
    }
}
