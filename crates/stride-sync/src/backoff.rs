//! Pure delay curves. No clock, no state: every delay is a function of a
//! counter and configuration.

use std::time::Duration;

use stride_core::config::{BreakerConfig, DispatchConfig, ReconcileConfig};
use stride_core::constants::MAX_BACKOFF_EXPONENT;

/// `base * 2^exponent`, capped at `max`.
fn exponential(base_ms: u64, max_ms: u64, exponent: u32) -> Duration {
    let factor = 1u64 << exponent.min(MAX_BACKOFF_EXPONENT);
    Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
}

/// Delay before the next attempt of an entry that has failed `retry_count`
/// times: base, 2×base, 4×base, ... capped at `backoff_max_ms`.
pub fn backoff(retry_count: u32, config: &DispatchConfig) -> Duration {
    exponential(
        config.backoff_base_ms,
        config.backoff_max_ms,
        retry_count.saturating_sub(1),
    )
}

/// Dispatch suspension once the breaker has tripped. Grows with every
/// failure past the `failed_after` threshold.
pub fn breaker_cooldown(consecutive_failures: u32, config: &BreakerConfig) -> Duration {
    exponential(
        config.cooldown_base_ms,
        config.cooldown_max_ms,
        consecutive_failures.saturating_sub(config.failed_after),
    )
}

/// Pause between attempts of one table during reconciliation.
pub fn table_retry_delay(attempt: u32, config: &ReconcileConfig) -> Duration {
    exponential(
        config.table_backoff_base_ms,
        config.table_backoff_max_ms,
        attempt.saturating_sub(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn dispatch_curve_doubles_from_base() {
        let config = DispatchConfig::default();
        assert_eq!(backoff(1, &config), Duration::from_secs(1));
        assert_eq!(backoff(2, &config), Duration::from_secs(2));
        assert_eq!(backoff(3, &config), Duration::from_secs(4));
        assert_eq!(backoff(4, &config), Duration::from_secs(8));
    }

    #[test]
    fn dispatch_curve_caps_at_five_minutes() {
        let config = DispatchConfig::default();
        assert_eq!(backoff(9, &config), Duration::from_secs(256));
        assert_eq!(backoff(10, &config), Duration::from_secs(300));
        assert_eq!(backoff(u32::MAX, &config), Duration::from_secs(300));
    }

    #[test]
    fn cooldown_starts_at_base_when_breaker_trips() {
        let config = BreakerConfig::default();
        assert_eq!(
            breaker_cooldown(config.failed_after, &config),
            Duration::from_secs(30)
        );
        assert_eq!(
            breaker_cooldown(config.failed_after + 1, &config),
            Duration::from_secs(60)
        );
        assert_eq!(breaker_cooldown(100, &config), Duration::from_secs(900));
    }

    #[test]
    fn table_delay_is_bounded() {
        let config = ReconcileConfig::default();
        assert_eq!(table_retry_delay(1, &config), Duration::from_millis(500));
        assert_eq!(table_retry_delay(50, &config), Duration::from_secs(10));
    }

    proptest! {
        #[test]
        fn backoff_is_monotone_and_capped(retry in 0u32..200, base in 1u64..10_000, extra in 0u64..1_000_000) {
            let config = DispatchConfig {
                backoff_base_ms: base,
                backoff_max_ms: base + extra,
                ..DispatchConfig::default()
            };
            let here = backoff(retry, &config);
            let next = backoff(retry + 1, &config);
            prop_assert!(here <= next);
            prop_assert!(next <= Duration::from_millis(config.backoff_max_ms));
            prop_assert!(here >= Duration::from_millis(base.min(config.backoff_max_ms)));
        }

        #[test]
        fn cooldown_never_exceeds_max(failures in 0u32..10_000) {
            let config = BreakerConfig::default();
            let cooldown = breaker_cooldown(failures, &config);
            prop_assert!(cooldown <= Duration::from_millis(config.cooldown_max_ms));
            prop_assert!(cooldown >= Duration::from_millis(config.cooldown_base_ms));
        }
    }
}
