//! Recording pacing.
//!
//! Every delay a humanized action inserts is a field of [`Pacing`], stored in
//! milliseconds. The defaults reproduce the established cinematic rhythm; a
//! recording that needs a different tempo overrides fields in
//! `~/.autovid/config.json` or builds a `Pacing` in code.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delays used by the humanizer and the director, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Upper bound on waiting for an element to exist before acting on it.
    pub existence_timeout_ms: u64,
    /// Interval between existence probes while waiting.
    pub poll_interval_ms: u64,

    /// Pause between finding an element and tapping it.
    pub pre_tap_ms: u64,
    /// Pause after a tap.
    pub post_tap_ms: u64,
    /// Advisory duration of the corrective scroll before tapping a
    /// non-hittable element.
    pub corrective_scroll_ms: u64,

    /// Delay after each typed character.
    pub type_interval_ms: u64,
    /// Pause after the last typed character.
    pub post_type_ms: u64,

    /// Default advisory duration of an element-to-element drag.
    pub drag_ms: u64,
    /// Dwell before an element-to-element drag starts moving.
    pub drag_press_ms: u64,
    /// Dwell at the end of a drag before release.
    pub drag_hold_ms: u64,
    /// Pause after a drag.
    pub post_drag_ms: u64,

    /// Default slider adjustment duration.
    pub slider_ms: u64,
    /// Default long-press duration.
    pub long_press_ms: u64,
    /// Pause after a long press.
    pub post_long_press_ms: u64,
    /// Pause after rotating the device.
    pub orientation_settle_ms: u64,

    /// Default advisory duration of a directional scroll.
    pub scroll_ms: u64,
    /// Dwell before a scroll starts moving.
    pub scroll_press_ms: u64,
    /// Dwell at the end of a scroll before release.
    pub scroll_hold_ms: u64,
    /// Pause after a scroll so deceleration animations finish.
    pub scroll_settle_ms: u64,

    /// Pause after launching the app.
    pub launch_settle_ms: u64,
    /// Pause after each scene.
    pub scene_settle_ms: u64,
    /// Pause before declaring the recording finished.
    pub wrap_settle_ms: u64,
    /// Pause after an announcement.
    pub announce_settle_ms: u64,
    /// Default reading pause.
    pub read_pause_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            existence_timeout_ms: 5000,
            poll_interval_ms: 100,
            pre_tap_ms: 600,
            post_tap_ms: 1000,
            corrective_scroll_ms: 1000,
            type_interval_ms: 120,
            post_type_ms: 500,
            drag_ms: 1000,
            drag_press_ms: 200,
            drag_hold_ms: 200,
            post_drag_ms: 500,
            slider_ms: 1000,
            long_press_ms: 1000,
            post_long_press_ms: 1000,
            orientation_settle_ms: 1000,
            scroll_ms: 2000,
            scroll_press_ms: 100,
            scroll_hold_ms: 100,
            scroll_settle_ms: 500,
            launch_settle_ms: 3000,
            scene_settle_ms: 1500,
            wrap_settle_ms: 3000,
            announce_settle_ms: 1000,
            read_pause_ms: 2000,
        }
    }
}

impl Pacing {
    /// A pacing with every delay set to zero, for dry runs.
    pub fn instant() -> Self {
        Self {
            existence_timeout_ms: 0,
            poll_interval_ms: 0,
            pre_tap_ms: 0,
            post_tap_ms: 0,
            corrective_scroll_ms: 0,
            type_interval_ms: 0,
            post_type_ms: 0,
            drag_ms: 0,
            drag_press_ms: 0,
            drag_hold_ms: 0,
            post_drag_ms: 0,
            slider_ms: 0,
            long_press_ms: 0,
            post_long_press_ms: 0,
            orientation_settle_ms: 0,
            scroll_ms: 0,
            scroll_press_ms: 0,
            scroll_hold_ms: 0,
            scroll_settle_ms: 0,
            launch_settle_ms: 0,
            scene_settle_ms: 0,
            wrap_settle_ms: 0,
            announce_settle_ms: 0,
            read_pause_ms: 0,
        }
    }
}

/// Milliseconds as a [`Duration`].
pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Milliseconds as fractional seconds, the unit gesture primitives take.
pub fn secs(value: u64) -> f64 {
    value as f64 / 1000.0
}

/// Sleeps for `value` milliseconds; zero returns immediately.
pub async fn hold(value: u64) {
    if value > 0 {
        tokio::time::sleep(ms(value)).await;
    }
}
