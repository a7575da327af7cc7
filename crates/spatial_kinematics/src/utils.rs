//! # Utility Functions
//!
//! Small helpers shared across the engine and the bridge.

// ============================================================================
// Utility Functions
// ============================================================================

/// Returns the current Unix timestamp in milliseconds.
///
/// Entity snapshots that arrive without a `lastUpdated` field are stamped
/// with this value at ingest time. A clock set before the Unix epoch yields
/// `0` rather than panicking.
pub fn current_timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
