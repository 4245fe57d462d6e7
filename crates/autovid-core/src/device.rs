//! Device orientation and the explicit device context.
//!
//! Orientation is device-wide state. Rather than a process-wide singleton,
//! callers own a [`DeviceContext`] and pass it by `&mut` into
//! [`Humanizer::set_orientation`](crate::humanize::Humanizer::set_orientation),
//! which records the orientation once the backend accepts it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Physical device orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
}

impl Orientation {
    /// Wire code understood by the agent.
    pub fn code(self) -> u8 {
        match self {
            Orientation::Portrait => 1,
            Orientation::PortraitUpsideDown => 2,
            Orientation::LandscapeLeft => 3,
            Orientation::LandscapeRight => 4,
            Orientation::FaceUp => 5,
            Orientation::FaceDown => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::PortraitUpsideDown => "portrait-upside-down",
            Orientation::LandscapeLeft => "landscape-left",
            Orientation::LandscapeRight => "landscape-right",
            Orientation::FaceUp => "face-up",
            Orientation::FaceDown => "face-down",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "portrait-upside-down" | "upside-down" => Ok(Orientation::PortraitUpsideDown),
            "landscape-left" => Ok(Orientation::LandscapeLeft),
            "landscape-right" => Ok(Orientation::LandscapeRight),
            "face-up" => Ok(Orientation::FaceUp),
            "face-down" => Ok(Orientation::FaceDown),
            other => Err(format!("unknown orientation '{other}'")),
        }
    }
}

/// Device-wide state a recording script mutates.
#[derive(Debug, Clone, Default)]
pub struct DeviceContext {
    orientation: Orientation,
}

impl DeviceContext {
    /// A context for a device believed to be in `orientation`.
    pub fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }

    /// The last orientation the backend accepted.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub(crate) fn record_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }
}
