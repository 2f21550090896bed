//! Stored Entry Module
//!
//! Defines the structure for individual store entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

// == Entry Data ==
/// The value held under a key.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryData {
    /// Plain bytes, also used for counters (decimal text)
    Bytes(Vec<u8>),
    /// Ordered list of byte strings
    List(Vec<Vec<u8>>),
}

// == Stored Entry ==
/// Represents a single store entry with value and metadata.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// The stored data
    pub data: EntryData,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoredEntry {
    // == Constructor ==
    /// Creates a new entry with optional TTL.
    ///
    /// # Arguments
    /// * `data` - The data to store
    /// * `ttl_seconds` - Optional TTL in seconds
    pub fn new(data: EntryData, ttl_seconds: Option<u64>) -> Self {
        let now = current_timestamp_ms();
        // Saturating, so a huge TTL never wraps into the past
        let expires_at = ttl_seconds.map(|ttl| now.saturating_add(ttl.saturating_mul(1000)));

        Self {
            data,
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches the expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = StoredEntry::new(EntryData::Bytes(b"value".to_vec()), None);

        assert_eq!(entry.data, EntryData::Bytes(b"value".to_vec()));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining_ms().is_none());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = StoredEntry::new(EntryData::List(vec![]), Some(10));

        let remaining_ms = entry.ttl_remaining_ms().unwrap();
        assert!(remaining_ms <= 10_000);
        assert!(remaining_ms >= 9_000);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = StoredEntry::new(EntryData::Bytes(b"value".to_vec()), Some(1));

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining_ms(), Some(0));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = StoredEntry::new(EntryData::Bytes(b"value".to_vec()), Some(u64::MAX));

        assert_eq!(entry.expires_at, Some(u64::MAX));
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining_ms().unwrap() > 0);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = StoredEntry {
            data: EntryData::Bytes(Vec::new()),
            created_at: now,
            expires_at: Some(now),
        };

        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }
}
