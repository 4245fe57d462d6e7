//! Shared test helpers for autovid-core integration tests.
//!
//! [`RecordingDriver`] is an in-memory backend that serves a settable
//! hierarchy and records every primitive with the (paused) clock offset it
//! arrived at. [`mock_agent`] is a TCP stand-in for the accessibility agent.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use autovid_core::device::Orientation;
use autovid_core::driver::{AutomationDriver, DriverError, PressDrag};
use autovid_core::element::UIElement;
use autovid_core::gesture::Point;
use autovid_core::humanize::Humanizer;
use autovid_core::pacing::Pacing;
use autovid_core::protocol::{decode_request, encode_response, read_frame_length, Request, Response};

// ---------------------------------------------------------------------------
// In-memory driver
// ---------------------------------------------------------------------------

/// A primitive the humanizer issued.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DumpTree,
    TapLocation(Point),
    TapElement(String),
    TapByLabel(String),
    TapWithType { selector: String, by_label: bool, element_type: String },
    TypeText(String),
    PressDrag(PressDrag),
    LongPress(Point, f64),
    AdjustSlider { selector: String, by_label: bool, element_type: Option<String>, value: f64 },
    SetOrientation(Orientation),
    LaunchApp(String),
}

pub struct RecordingDriver {
    tree: Mutex<Vec<UIElement>>,
    calls: Mutex<Vec<(Duration, Call)>>,
    failing: Mutex<HashSet<&'static str>>,
    started: Instant,
}

impl RecordingDriver {
    pub fn new(tree: Vec<UIElement>) -> Arc<Self> {
        Arc::new(Self {
            tree: Mutex::new(tree),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            started: Instant::now(),
        })
    }

    pub fn set_tree(&self, tree: Vec<UIElement>) {
        *self.tree.lock().unwrap() = tree;
    }

    /// Make the named primitive (e.g. `"press_drag"`) fail from now on.
    pub fn fail(&self, primitive: &'static str) {
        self.failing.lock().unwrap().insert(primitive);
    }

    /// Every call, snapshots included.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    /// Calls other than snapshots.
    pub fn gestures(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| *c != Call::DumpTree).collect()
    }

    /// Non-snapshot calls with the clock offset (ms) they arrived at.
    pub fn timed_gestures(&self) -> Vec<(u128, Call)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, c)| *c != Call::DumpTree)
            .map(|(at, c)| (at.as_millis(), c.clone()))
            .collect()
    }

    pub fn snapshot_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::DumpTree).count()
    }

    fn record(&self, primitive: &'static str, call: Call) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push((self.started.elapsed(), call));
        if self.failing.lock().unwrap().contains(primitive) {
            return Err(DriverError::CommandFailed(format!("{primitive} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl AutomationDriver for RecordingDriver {
    async fn connect(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError> {
        self.record("dump_tree", Call::DumpTree)?;
        Ok(self.tree.lock().unwrap().clone())
    }

    async fn tap_location(&self, point: Point) -> Result<(), DriverError> {
        self.record("tap_location", Call::TapLocation(point))
    }

    async fn tap_element(&self, identifier: &str) -> Result<(), DriverError> {
        self.record("tap_element", Call::TapElement(identifier.into()))
    }

    async fn tap_by_label(&self, label: &str) -> Result<(), DriverError> {
        self.record("tap_by_label", Call::TapByLabel(label.into()))
    }

    async fn tap_with_type(
        &self,
        selector: &str,
        by_label: bool,
        element_type: &str,
    ) -> Result<(), DriverError> {
        self.record(
            "tap_with_type",
            Call::TapWithType {
                selector: selector.into(),
                by_label,
                element_type: element_type.into(),
            },
        )
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.record("type_text", Call::TypeText(text.into()))
    }

    async fn press_drag(&self, gesture: PressDrag) -> Result<(), DriverError> {
        self.record("press_drag", Call::PressDrag(gesture))
    }

    async fn long_press(&self, point: Point, duration: f64) -> Result<(), DriverError> {
        self.record("long_press", Call::LongPress(point, duration))
    }

    async fn adjust_slider(
        &self,
        selector: &str,
        by_label: bool,
        element_type: Option<&str>,
        value: f64,
    ) -> Result<(), DriverError> {
        self.record(
            "adjust_slider",
            Call::AdjustSlider {
                selector: selector.into(),
                by_label,
                element_type: element_type.map(str::to_string),
                value,
            },
        )
    }

    async fn set_orientation(&self, orientation: Orientation) -> Result<(), DriverError> {
        self.record("set_orientation", Call::SetOrientation(orientation))
    }

    async fn launch_app(&self, bundle_id: &str) -> Result<(), DriverError> {
        self.record("launch_app", Call::LaunchApp(bundle_id.into()))
    }
}

/// A humanizer with default pacing over `driver`.
pub fn humanizer(driver: &Arc<RecordingDriver>) -> Humanizer {
    Humanizer::new(driver.clone(), Pacing::default())
}

// ---------------------------------------------------------------------------
// Hierarchies
// ---------------------------------------------------------------------------

/// The app root: a 390x844 portrait screen.
pub fn app() -> UIElement {
    UIElement::new("Application")
        .with_label("Notes")
        .with_frame(0.0, 0.0, 390.0, 844.0)
}

/// A settings-style screen: nav bar, then a table of rows, a save button
/// and a volume slider.
pub fn table_screen() -> Vec<UIElement> {
    let table = UIElement::new("Table")
        .with_identifier("notes-list")
        .with_frame(0.0, 100.0, 390.0, 600.0)
        .with_child(
            UIElement::new("Cell")
                .with_identifier("row-1")
                .with_label("Groceries")
                .with_frame(0.0, 100.0, 390.0, 44.0),
        )
        .with_child(
            UIElement::new("Cell")
                .with_identifier("row-2")
                .with_label("Ideas")
                .with_frame(0.0, 144.0, 390.0, 44.0),
        );

    vec![app()
        .with_child(UIElement::new("NavigationBar").with_frame(0.0, 44.0, 390.0, 56.0))
        .with_child(table)
        .with_child(
            UIElement::new("Button")
                .with_identifier("save")
                .with_label("Save")
                .with_frame(300.0, 760.0, 80.0, 40.0),
        )
        .with_child(
            UIElement::new("TextField")
                .with_identifier("email")
                .with_label("Email")
                .with_frame(20.0, 710.0, 350.0, 40.0),
        )
        .with_child(
            UIElement::new("Slider")
                .with_identifier("volume")
                .with_frame(20.0, 800.0, 350.0, 30.0),
        )]
}

pub fn assert_point(actual: Point, x: f64, y: f64) {
    assert!(
        (actual.x - x).abs() < 1e-9 && (actual.y - y).abs() < 1e-9,
        "expected ({x}, {y}), got ({}, {})",
        actual.x,
        actual.y
    );
}

/// The single press-drag in `calls`.
pub fn only_drag(calls: &[Call]) -> PressDrag {
    let drags: Vec<PressDrag> = calls
        .iter()
        .filter_map(|c| match c {
            Call::PressDrag(g) => Some(*g),
            _ => None,
        })
        .collect();
    assert_eq!(drags.len(), 1, "expected exactly one drag in {calls:?}");
    drags[0]
}

// ---------------------------------------------------------------------------
// TCP mock agent
// ---------------------------------------------------------------------------

/// Start a mock agent that accepts one connection and answers each request
/// with the next canned response. The first response is consumed by the
/// heartbeat `AgentDriver::connect()` sends. The handle resolves to the
/// requests received, in order.
pub async fn mock_agent(responses: Vec<Response>) -> (SocketAddr, JoinHandle<Vec<Request>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();

        for response in responses {
            let mut header = [0u8; 4];
            stream.read_exact(&mut header).await.unwrap();
            let mut payload = vec![0u8; read_frame_length(&header) as usize];
            stream.read_exact(&mut payload).await.unwrap();
            received.push(decode_request(&payload).unwrap());

            stream.write_all(&encode_response(&response)).await.unwrap();
            stream.flush().await.unwrap();
        }
        received
    });

    (addr, handle)
}

/// A tree response carrying `tree` as the agent would send it.
pub fn tree_response(tree: &[UIElement]) -> Response {
    Response::Tree { json: serde_json::to_string(tree).unwrap() }
}
