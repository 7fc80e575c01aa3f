//! Minimum interval between order submissions.
//!
//! The last submission time is kept in the local store, so clearing the
//! data directory resets it. This throttles accidental double submits and
//! casual spam; it is not a security boundary.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

use crate::storage::{KeyValueStore, StorageError, keys};

/// Default interval between two orders from the same client.
pub const DEFAULT_WINDOW: TimeDelta = TimeDelta::minutes(5);

/// Whether a new order may be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    Ready,
    /// Seconds until the window closes, rounded up.
    Active { remaining_secs: u64 },
}

/// Timestamp-based submission throttle backed by `royshop_last_order_time`.
#[derive(Debug, Clone)]
pub struct SubmissionCooldown<S> {
    store: S,
    window: TimeDelta,
}

impl<S: KeyValueStore> SubmissionCooldown<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            window: DEFAULT_WINDOW,
        }
    }

    #[must_use]
    pub const fn with_window(store: S, window: TimeDelta) -> Self {
        Self { store, window }
    }

    /// Check the cooldown at `now`.
    ///
    /// A missing or unreadable timestamp counts as ready. A timestamp in the
    /// future (clock moved backwards) counts as a submission made `now`.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> CooldownStatus {
        let Some(last) = self.last_submission() else {
            return CooldownStatus::Ready;
        };

        let elapsed = (now - last).max(TimeDelta::zero());
        if elapsed >= self.window {
            return CooldownStatus::Ready;
        }

        let remaining_ms = u64::try_from((self.window - elapsed).num_milliseconds()).unwrap_or(0);
        CooldownStatus::Active {
            remaining_secs: remaining_ms.div_ceil(1000),
        }
    }

    /// Record a submission at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp cannot be written.
    pub fn record(&self, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.store
            .set(keys::LAST_ORDER_TIME, &now.timestamp_millis().to_string())
    }

    fn last_submission(&self) -> Option<DateTime<Utc>> {
        let raw = match self.store.get(keys::LAST_ORDER_TIME) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read last order time");
                return None;
            }
        };

        let parsed = raw
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis);
        if parsed.is_none() {
            warn!(value = %raw, "Ignoring unreadable last order time");
        }
        parsed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_ready_without_history() {
        let cooldown = SubmissionCooldown::new(MemoryStore::new());
        assert_eq!(cooldown.status(at(T0)), CooldownStatus::Ready);
    }

    #[test]
    fn test_active_after_record() {
        let cooldown = SubmissionCooldown::new(MemoryStore::new());
        cooldown.record(at(T0)).unwrap();

        assert_eq!(
            cooldown.status(at(T0)),
            CooldownStatus::Active { remaining_secs: 300 }
        );
        // 1.5s elapsed -> 298.5s remaining, rounded up
        assert_eq!(
            cooldown.status(at(T0 + 1_500)),
            CooldownStatus::Active { remaining_secs: 299 }
        );
        assert_eq!(
            cooldown.status(at(T0 + 299_999)),
            CooldownStatus::Active { remaining_secs: 1 }
        );
        assert_eq!(cooldown.status(at(T0 + 300_000)), CooldownStatus::Ready);
    }

    #[test]
    fn test_reads_legacy_millis_value() {
        let store = MemoryStore::with_entry(keys::LAST_ORDER_TIME, &T0.to_string());
        let cooldown = SubmissionCooldown::new(store);
        assert!(matches!(
            cooldown.status(at(T0 + 60_000)),
            CooldownStatus::Active { remaining_secs: 240 }
        ));
    }

    #[test]
    fn test_garbage_timestamp_is_ready() {
        let store = MemoryStore::with_entry(keys::LAST_ORDER_TIME, "yesterday");
        let cooldown = SubmissionCooldown::new(store);
        assert_eq!(cooldown.status(at(T0)), CooldownStatus::Ready);
    }

    #[test]
    fn test_future_timestamp_is_clamped() {
        let cooldown = SubmissionCooldown::new(MemoryStore::new());
        cooldown.record(at(T0 + 3_600_000)).unwrap();
        assert_eq!(
            cooldown.status(at(T0)),
            CooldownStatus::Active { remaining_secs: 300 }
        );
    }

    #[test]
    fn test_custom_window() {
        let cooldown = SubmissionCooldown::with_window(MemoryStore::new(), TimeDelta::seconds(10));
        cooldown.record(at(T0)).unwrap();
        assert_eq!(cooldown.status(at(T0 + 10_000)), CooldownStatus::Ready);
    }

    #[test]
    fn test_record_failure_surfaces() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        let cooldown = SubmissionCooldown::new(&store);
        assert!(cooldown.record(at(T0)).is_err());
    }
}
