//! Automation driver trait: the seam to the host automation backend.
//!
//! [`AutomationDriver`] exposes the primitives the humanized helpers are
//! built from: hierarchy snapshots, taps, typing, press-drag gestures,
//! long presses, slider adjustment, device orientation and app launch.
//! Backends implement it once; everything above this layer is
//! backend-agnostic.
//!
//! # Backend Selection
//!
//! ```no_run
//! use autovid_core::driver::DriverConfig;
//!
//! // Accessibility agent on a booted simulator
//! let config = DriverConfig::Agent {
//!     host: "localhost".to_string(),
//!     port: 8080,
//! };
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::device::Orientation;
use crate::element::UIElement;
use crate::gesture::{GestureVelocity, Point};
use crate::locator::Locator;

/// Errors that can occur during automation driver operations.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A command or operation failed with the given message.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// The backend is not available or not connected.
    #[error("Not connected to automation backend")]
    NotConnected,

    /// The connection to the agent was lost.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// An operation timed out.
    #[error("Operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

/// Selects an automation backend at runtime.
#[derive(Debug, Clone)]
pub enum DriverConfig {
    /// An accessibility agent reachable over TCP.
    Agent {
        /// Hostname or IP address of the agent.
        host: String,
        /// TCP port the agent listens on.
        port: u16,
    },
}

/// A press-drag-release gesture between two screen points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressDrag {
    /// Where the finger goes down.
    pub from: Point,
    /// Where the finger lifts.
    pub to: Point,
    /// Dwell at `from` before moving, in seconds.
    pub press_secs: f64,
    /// Speed of the movement phase.
    pub velocity: GestureVelocity,
    /// Dwell at `to` before lifting, in seconds.
    pub hold_secs: f64,
}

/// Backend-agnostic UI automation primitives.
///
/// All device-facing methods are async so both TCP agents and in-process
/// fakes fit behind the same interface. Element search has a default
/// implementation on top of [`dump_tree`](AutomationDriver::dump_tree).
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Establish connection to the automation backend.
    async fn connect(&mut self) -> Result<(), DriverError>;

    /// Check if the backend is ready to accept commands.
    fn is_connected(&self) -> bool;

    /// Capture the full accessibility hierarchy of the current screen.
    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError>;

    /// Tap at screen coordinates.
    async fn tap_location(&self, point: Point) -> Result<(), DriverError>;

    /// Tap an element by its accessibility identifier.
    async fn tap_element(&self, identifier: &str) -> Result<(), DriverError>;

    /// Tap an element by its accessibility label.
    async fn tap_by_label(&self, label: &str) -> Result<(), DriverError>;

    /// Tap an element matching a selector and element type.
    async fn tap_with_type(
        &self,
        selector: &str,
        by_label: bool,
        element_type: &str,
    ) -> Result<(), DriverError>;

    /// Type text into the focused element.
    async fn type_text(&self, text: &str) -> Result<(), DriverError>;

    /// Perform a single press-drag-release gesture.
    async fn press_drag(&self, gesture: PressDrag) -> Result<(), DriverError>;

    /// Long press at screen coordinates for `duration` seconds.
    async fn long_press(&self, point: Point, duration: f64) -> Result<(), DriverError>;

    /// Move a slider to a normalized position in `[0.0, 1.0]`.
    async fn adjust_slider(
        &self,
        selector: &str,
        by_label: bool,
        element_type: Option<&str>,
        value: f64,
    ) -> Result<(), DriverError>;

    /// Rotate the device.
    async fn set_orientation(&self, orientation: Orientation) -> Result<(), DriverError>;

    /// Launch (or relaunch) the application under test.
    async fn launch_app(&self, bundle_id: &str) -> Result<(), DriverError>;

    /// Find the first element matching `locator`.
    ///
    /// The default implementation captures a fresh snapshot and searches it
    /// locally.
    async fn find_element(&self, locator: &Locator) -> Result<Option<UIElement>, DriverError> {
        let tree = self.dump_tree().await?;
        Ok(locator.locate(&tree).cloned())
    }
}
