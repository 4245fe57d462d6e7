//! [`AutomationDriver`] backed by the accessibility agent.
//!
//! [`AgentDriver`] translates driver calls into [`Request`]s and sends them
//! through an [`AgentClient`]. The client sits behind a
//! [`tokio::sync::Mutex`] so the `&self` trait methods can borrow it mutably.
//!
//! # Example
//!
//! ```no_run
//! use autovid_core::agent_driver::AgentDriver;
//! use autovid_core::driver::AutomationDriver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut driver = AgentDriver::new("localhost", 8080);
//! driver.connect().await?;
//! let tree = driver.dump_tree().await?;
//! println!("{} root element(s)", tree.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::agent_client::{AgentClient, AgentClientError};
use crate::device::Orientation;
use crate::driver::{AutomationDriver, DriverConfig, DriverError, PressDrag};
use crate::element::UIElement;
use crate::gesture::Point;
use crate::protocol::{Request, Response};

fn map_client_error(err: AgentClientError) -> DriverError {
    match err {
        AgentClientError::NotConnected => DriverError::NotConnected,
        AgentClientError::ConnectionFailed(msg) => DriverError::ConnectionLost(msg),
        AgentClientError::Io(e) => DriverError::Io(e),
        AgentClientError::Protocol(e) => DriverError::CommandFailed(e.to_string()),
        AgentClientError::AgentError(msg) => DriverError::CommandFailed(msg),
        AgentClientError::Timeout => DriverError::Timeout,
    }
}

fn expect_ok(response: Response) -> Result<(), DriverError> {
    match response {
        Response::Ok => Ok(()),
        other => Err(DriverError::CommandFailed(format!("unexpected response: {other:?}"))),
    }
}

/// A driver talking to the accessibility agent over TCP.
pub struct AgentDriver {
    host: String,
    port: u16,
    client: Mutex<Option<AgentClient>>,
}

impl AgentDriver {
    /// A driver for the agent at `host:port`. Call
    /// [`connect`](AutomationDriver::connect) before use.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client: Mutex::new(None),
        }
    }

    /// Builds a driver from a [`DriverConfig`].
    pub fn from_config(config: DriverConfig) -> Self {
        match config {
            DriverConfig::Agent { host, port } => Self::new(host, port),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    async fn send(&self, request: &Request) -> Result<Response, DriverError> {
        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(DriverError::NotConnected)?;
        client.send(request).await.map_err(map_client_error)
    }

    async fn send_ok(&self, request: Request) -> Result<(), DriverError> {
        expect_ok(self.send(&request).await?)
    }
}

#[async_trait]
impl AutomationDriver for AgentDriver {
    #[instrument(skip(self), fields(host = %self.host, port = self.port), level = "debug")]
    async fn connect(&mut self) -> Result<(), DriverError> {
        let host_port = format!("{}:{}", self.host, self.port);
        let addr = tokio::net::lookup_host(&host_port)
            .await
            .map_err(|e| DriverError::ConnectionLost(e.to_string()))?
            .next()
            .ok_or_else(|| DriverError::ConnectionLost(format!("could not resolve {host_port}")))?;

        let mut client = AgentClient::new(addr);
        client.connect().await.map_err(map_client_error)?;
        client.heartbeat().await.map_err(map_client_error)?;
        *self.client.lock().await = Some(client);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client
            .try_lock()
            .map(|g| g.as_ref().is_some_and(AgentClient::is_connected))
            .unwrap_or(false)
    }

    #[instrument(skip(self), level = "debug")]
    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError> {
        match self.send(&Request::DumpTree).await? {
            Response::Tree { json } => {
                let elements: Vec<UIElement> =
                    serde_json::from_str(&json).map_err(|e| DriverError::JsonParse(e.to_string()))?;
                debug!(root_count = elements.len(), "tree dumped");
                Ok(elements)
            }
            other => Err(DriverError::CommandFailed(format!("unexpected response: {other:?}"))),
        }
    }

    async fn tap_location(&self, point: Point) -> Result<(), DriverError> {
        self.send_ok(Request::TapCoord { x: point.x, y: point.y }).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn tap_element(&self, identifier: &str) -> Result<(), DriverError> {
        self.send_ok(Request::TapElement { selector: identifier.to_string() }).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn tap_by_label(&self, label: &str) -> Result<(), DriverError> {
        self.send_ok(Request::TapByLabel { label: label.to_string() }).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn tap_with_type(
        &self,
        selector: &str,
        by_label: bool,
        element_type: &str,
    ) -> Result<(), DriverError> {
        self.send_ok(Request::TapWithType {
            selector: selector.to_string(),
            by_label,
            element_type: element_type.to_string(),
        })
        .await
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.send_ok(Request::TypeText { text: text.to_string() }).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn press_drag(&self, gesture: PressDrag) -> Result<(), DriverError> {
        self.send_ok(Request::PressDrag {
            start_x: gesture.from.x,
            start_y: gesture.from.y,
            end_x: gesture.to.x,
            end_y: gesture.to.y,
            press_secs: gesture.press_secs,
            velocity: gesture.velocity.points_per_second(),
            hold_secs: gesture.hold_secs,
        })
        .await
    }

    async fn long_press(&self, point: Point, duration: f64) -> Result<(), DriverError> {
        self.send_ok(Request::LongPress { x: point.x, y: point.y, duration }).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn adjust_slider(
        &self,
        selector: &str,
        by_label: bool,
        element_type: Option<&str>,
        value: f64,
    ) -> Result<(), DriverError> {
        self.send_ok(Request::AdjustSlider {
            selector: selector.to_string(),
            by_label,
            element_type: element_type.map(str::to_string),
            value,
        })
        .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn set_orientation(&self, orientation: Orientation) -> Result<(), DriverError> {
        self.send_ok(Request::SetOrientation { orientation: orientation.code() }).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn launch_app(&self, bundle_id: &str) -> Result<(), DriverError> {
        self.send_ok(Request::LaunchApp { bundle_id: bundle_id.to_string() }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_driver_is_not_connected() {
        let driver = AgentDriver::new("localhost", 8080);
        assert!(!driver.is_connected());
        assert_eq!(driver.host(), "localhost");
        assert_eq!(driver.port(), 8080);
    }

    #[test]
    fn from_config_uses_agent_address() {
        let driver = AgentDriver::from_config(DriverConfig::Agent { host: "10.0.0.5".into(), port: 9000 });
        assert_eq!(driver.host(), "10.0.0.5");
        assert_eq!(driver.port(), 9000);
    }

    #[tokio::test]
    async fn commands_before_connect_fail() {
        let driver = AgentDriver::new("localhost", 8080);
        assert!(matches!(driver.dump_tree().await, Err(DriverError::NotConnected)));
        assert!(matches!(driver.type_text("x").await, Err(DriverError::NotConnected)));
    }

    #[test]
    fn client_errors_map_to_driver_errors() {
        assert!(matches!(
            map_client_error(AgentClientError::AgentError("nope".into())),
            DriverError::CommandFailed(msg) if msg == "nope"
        ));
        assert!(matches!(map_client_error(AgentClientError::Timeout), DriverError::Timeout));
        assert!(matches!(
            map_client_error(AgentClientError::ConnectionFailed("refused".into())),
            DriverError::ConnectionLost(_)
        ));
    }

    #[test]
    fn non_ok_response_is_command_failure() {
        let err = expect_ok(Response::Tree { json: "[]".into() }).unwrap_err();
        assert!(err.to_string().contains("unexpected response"));
    }
}
