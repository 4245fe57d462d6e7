//! Gesture geometry: normalized offsets, directions and velocity profiles.
//!
//! Directional scrolls are expressed as a pair of [`NormalizedOffset`]s
//! inside the target element's frame. Vertical gestures run along the
//! horizontal centre line (`dx = 0.5`) and horizontal gestures along the
//! vertical centre line (`dy = 0.5`); the travelling axis swings between
//! 0.2 and 0.8, mirrored across the 0.5 midpoint.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Near edge of a directional swipe, as a fraction of the frame.
const SWING_NEAR: f64 = 0.2;
/// Far edge of a directional swipe, as a fraction of the frame.
const SWING_FAR: f64 = 0.8;

/// A position in screen points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A position relative to an element's frame, each axis in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOffset {
    pub dx: f64,
    pub dy: f64,
}

impl NormalizedOffset {
    /// The centre of the frame.
    pub const CENTER: NormalizedOffset = NormalizedOffset { dx: 0.5, dy: 0.5 };

    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Direction of a scroll gesture, named after the finger's travel.
///
/// `Up` drags from the lower part of the frame to the upper part, revealing
/// content further down the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Start and end offsets for a directional swipe.
    pub fn path(self) -> ScrollPath {
        let (start, end) = match self {
            Direction::Up => (
                NormalizedOffset::new(0.5, SWING_FAR),
                NormalizedOffset::new(0.5, SWING_NEAR),
            ),
            Direction::Down => (
                NormalizedOffset::new(0.5, SWING_NEAR),
                NormalizedOffset::new(0.5, SWING_FAR),
            ),
            Direction::Left => (
                NormalizedOffset::new(SWING_FAR, 0.5),
                NormalizedOffset::new(SWING_NEAR, 0.5),
            ),
            Direction::Right => (
                NormalizedOffset::new(SWING_NEAR, 0.5),
                NormalizedOffset::new(SWING_FAR, 0.5),
            ),
        };
        ScrollPath { start, end }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(format!(
                "invalid direction '{other}'. Use: up, down, left, right"
            )),
        }
    }
}

/// Normalized start and end of a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPath {
    pub start: NormalizedOffset,
    pub end: NormalizedOffset,
}

/// Speed profile for the drag phase of a press-drag-release gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureVelocity {
    Slow,
    /// Let the backend pick its default drag speed.
    #[default]
    Default,
    Fast,
    PointsPerSecond(f64),
}

impl GestureVelocity {
    /// Points per second to send to the backend; `None` for the backend default.
    pub fn points_per_second(self) -> Option<f64> {
        match self {
            GestureVelocity::Slow => Some(500.0),
            GestureVelocity::Default => None,
            GestureVelocity::Fast => Some(2500.0),
            GestureVelocity::PointsPerSecond(v) => Some(v),
        }
    }
}

impl FromStr for GestureVelocity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Ok(GestureVelocity::Slow),
            "default" => Ok(GestureVelocity::Default),
            "fast" => Ok(GestureVelocity::Fast),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(GestureVelocity::PointsPerSecond)
                .ok_or_else(|| {
                    format!("invalid velocity '{other}'. Use: slow, default, fast, or points/sec")
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    #[test]
    fn up_swipes_bottom_to_top() {
        let path = Direction::Up.path();
        assert_eq!(path.start, NormalizedOffset::new(0.5, 0.8));
        assert_eq!(path.end, NormalizedOffset::new(0.5, 0.2));
    }

    #[test]
    fn down_swipes_top_to_bottom() {
        let path = Direction::Down.path();
        assert_eq!(path.start, NormalizedOffset::new(0.5, 0.2));
        assert_eq!(path.end, NormalizedOffset::new(0.5, 0.8));
    }

    #[test]
    fn horizontal_paths() {
        let left = Direction::Left.path();
        assert_eq!(left.start, NormalizedOffset::new(0.8, 0.5));
        assert_eq!(left.end, NormalizedOffset::new(0.2, 0.5));

        let right = Direction::Right.path();
        assert_eq!(right.start, NormalizedOffset::new(0.2, 0.5));
        assert_eq!(right.end, NormalizedOffset::new(0.8, 0.5));
    }

    #[test]
    fn endpoints_mirror_across_midpoint() {
        for dir in ALL {
            let p = dir.path();
            // The travelling axis reflects across 0.5, the other stays centred.
            assert!((p.start.dx + p.end.dx - 1.0).abs() < 1e-9, "{dir}");
            assert!((p.start.dy + p.end.dy - 1.0).abs() < 1e-9, "{dir}");
        }
    }

    #[test]
    fn opposite_directions_swap_endpoints() {
        assert_eq!(Direction::Up.path().start, Direction::Down.path().end);
        assert_eq!(Direction::Up.path().end, Direction::Down.path().start);
        assert_eq!(Direction::Left.path().start, Direction::Right.path().end);
        assert_eq!(Direction::Left.path().end, Direction::Right.path().start);
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!("right".parse::<Direction>().unwrap(), Direction::Right);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn velocity_parsing() {
        assert_eq!("slow".parse::<GestureVelocity>().unwrap(), GestureVelocity::Slow);
        assert_eq!(
            "750".parse::<GestureVelocity>().unwrap(),
            GestureVelocity::PointsPerSecond(750.0)
        );
        assert!("-3".parse::<GestureVelocity>().is_err());
        assert!("warp".parse::<GestureVelocity>().is_err());
    }

    #[test]
    fn default_velocity_defers_to_backend() {
        assert_eq!(GestureVelocity::Default.points_per_second(), None);
        assert!(GestureVelocity::Slow.points_per_second() < GestureVelocity::Fast.points_per_second());
    }
}
