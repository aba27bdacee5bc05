use chrono::{DateTime, Utc};

/// Source of the evaluation instant for expiry, cap and access checks.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}
