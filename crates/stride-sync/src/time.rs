//! Bridging std durations used by timers and chrono instants used by storage.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// `now + delay`, saturating at the far end of the chrono range.
pub(crate) fn after(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Time left until `at`; zero if it already passed.
pub(crate) fn until(now: DateTime<Utc>, at: DateTime<Utc>) -> Duration {
    (at - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn after_saturates() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(after(now, Duration::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(
            after(now, Duration::from_secs(2)),
            now + chrono::Duration::seconds(2)
        );
    }

    #[test]
    fn until_past_instant_is_zero() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(until(now, now - chrono::Duration::seconds(5)), Duration::ZERO);
        assert_eq!(until(now, now + chrono::Duration::seconds(5)), Duration::from_secs(5));
    }
}
