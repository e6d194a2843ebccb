//! Fixed height policy.
//!
//! These values are product policy, not configuration: the host page cannot
//! override them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Minimum iframe height on desktop viewports.
pub const MIN_HEIGHT_DESKTOP: u32 = 420;

/// Minimum iframe height on mobile viewports.
pub const MIN_HEIGHT_MOBILE: u32 = 520;

/// Maximum iframe height.
pub const MAX_HEIGHT: u32 = 2100;

/// Widest viewport still classified as mobile.
pub const MOBILE_BREAKPOINT: u32 = 768;

/// Smallest desktop change worth applying.
pub const THRESHOLD_DESKTOP: u32 = 15;

/// Smallest mobile change worth applying.
pub const THRESHOLD_MOBILE: u32 = 10;

/// Coalescing window for accepted height updates.
pub const APPLY_DEBOUNCE: Duration = Duration::from_millis(30);

/// Coalescing window for host viewport resizes.
pub const VIEWPORT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Backoff step of the initial request-height chain (500, 1000, 1500 ms).
pub const INITIAL_RETRY_STEP: Duration = Duration::from_millis(500);

/// Retries of the initial request-height after the first request.
pub const INITIAL_RETRIES: u32 = 3;

/// Embedded reporter: changes below this are noise.
pub const REPORT_NOISE_THRESHOLD: f64 = 10.0;

/// Embedded reporter: DOM mutation debounce.
pub const MUTATION_DEBOUNCE: Duration = Duration::from_millis(50);

/// Embedded reporter: window resize debounce.
pub const WINDOW_RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Embedded reporter: periodic safety-net interval.
pub const PERIODIC_REPORT_INTERVAL: Duration = Duration::from_secs(2);

/// Device classification derived from the host viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Viewport width <= 768px.
    Mobile,
    /// Anything wider.
    Desktop,
}

impl DeviceClass {
    /// Classify a viewport width in CSS pixels.
    pub const fn from_viewport_width(width: u32) -> Self {
        if width <= MOBILE_BREAKPOINT { Self::Mobile } else { Self::Desktop }
    }

    /// Returns true for mobile.
    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Mobile)
    }

    /// Minimum iframe height for this device class.
    pub const fn min_height(self) -> u32 {
        match self {
            Self::Mobile => MIN_HEIGHT_MOBILE,
            Self::Desktop => MIN_HEIGHT_DESKTOP,
        }
    }

    /// Significance threshold for height changes.
    pub const fn threshold(self) -> u32 {
        match self {
            Self::Mobile => THRESHOLD_MOBILE,
            Self::Desktop => THRESHOLD_DESKTOP,
        }
    }
}

/// Minimum height for a viewport width.
pub const fn min_height_for(viewport_width: u32) -> u32 {
    DeviceClass::from_viewport_width(viewport_width).min_height()
}

/// Clamp a reported height into `[min, max]` whole pixels.
///
/// Idempotent: feeding the result back in returns it unchanged. A NaN input
/// clamps to `min`.
pub fn clamp_height(height: f64, min: u32, max: u32) -> u32 {
    let max = max.max(min);
    if height.is_nan() {
        return min;
    }

    let rounded = height.round();
    if rounded <= f64::from(min) {
        min
    } else if rounded >= f64::from(max) {
        max
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let px = rounded as u32;
        px
    }
}

/// Delay before retry `attempt` (1-based) of the initial request-height.
pub fn initial_retry_delay(attempt: u32) -> Duration {
    INITIAL_RETRY_STEP * attempt
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn classifies_breakpoint_inclusive() {
        assert_eq!(DeviceClass::from_viewport_width(768), DeviceClass::Mobile);
        assert_eq!(DeviceClass::from_viewport_width(769), DeviceClass::Desktop);
    }

    #[test]
    fn min_height_by_viewport() {
        assert_eq!(min_height_for(600), 520);
        assert_eq!(min_height_for(1024), 420);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_height(50.0, 520, MAX_HEIGHT), 520);
        assert_eq!(clamp_height(900.4, 420, MAX_HEIGHT), 900);
        assert_eq!(clamp_height(9_000.0, 420, MAX_HEIGHT), 2100);
        assert_eq!(clamp_height(f64::INFINITY, 420, MAX_HEIGHT), 2100);
        assert_eq!(clamp_height(f64::NAN, 420, MAX_HEIGHT), 420);
    }

    #[test]
    fn retry_backoff_is_linear() {
        let delays: Vec<_> = (1..=INITIAL_RETRIES).map(initial_retry_delay).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(1500)
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_clamp_is_idempotent(height in proptest::num::f64::ANY, width in 0u32..4_000) {
            let min = min_height_for(width);
            let once = clamp_height(height, min, MAX_HEIGHT);
            let twice = clamp_height(f64::from(once), min, MAX_HEIGHT);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_clamp_stays_in_bounds(height in -10_000.0f64..10_000.0, width in 0u32..4_000) {
            let min = min_height_for(width);
            let clamped = clamp_height(height, min, MAX_HEIGHT);
            prop_assert!(clamped >= min && clamped <= MAX_HEIGHT);
        }
    }
}
