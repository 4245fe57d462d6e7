//! UI element snapshots captured from the accessibility hierarchy.
//!
//! A [`UIElement`] is a point-in-time copy of one node of the live tree as
//! reported by the automation backend. Snapshots are never cached between
//! humanized actions; every action captures a fresh one.

use serde::{Deserialize, Serialize};

use crate::gesture::{NormalizedOffset, Point};

/// A node from the accessibility hierarchy.
///
/// Elements form a tree through `children`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIElement {
    /// The accessibility identifier (AXUniqueId).
    #[serde(rename = "AXUniqueId", default)]
    pub identifier: Option<String>,

    /// The accessibility label (AXLabel), typically the user-visible text.
    #[serde(rename = "AXLabel", default)]
    pub label: Option<String>,

    /// The current value (AXValue), e.g. text field contents or slider position.
    #[serde(rename = "AXValue", default)]
    pub value: Option<String>,

    /// The element type as reported by the agent (e.g. "Button", "Table").
    #[serde(rename = "type", default)]
    pub element_type: Option<String>,

    /// The element's frame in screen points.
    #[serde(default)]
    pub frame: Option<ElementFrame>,

    /// Child elements nested within this element.
    #[serde(default)]
    pub children: Vec<UIElement>,

    /// Whether the element is currently interactable (on-screen, unobstructed).
    ///
    /// `None` when the backend does not report hittability.
    #[serde(default)]
    pub hittable: Option<bool>,
}

impl UIElement {
    /// Creates an element of the given type with no attributes or children.
    pub fn new(element_type: impl Into<String>) -> Self {
        Self {
            identifier: None,
            label: None,
            value: None,
            element_type: Some(element_type.into()),
            frame: None,
            children: Vec::new(),
            hittable: None,
        }
    }

    /// Sets the accessibility identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Sets the accessibility label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the frame.
    pub fn with_frame(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.frame = Some(ElementFrame { x, y, width, height });
        self
    }

    /// Sets the hittable flag.
    pub fn with_hittable(mut self, hittable: bool) -> Self {
        self.hittable = Some(hittable);
        self
    }

    /// Appends a child element.
    pub fn with_child(mut self, child: UIElement) -> Self {
        self.children.push(child);
        self
    }

    /// Classifies this element by its reported type.
    pub fn kind(&self) -> ElementKind {
        self.element_type
            .as_deref()
            .map(ElementKind::from_type_name)
            .unwrap_or(ElementKind::Other)
    }

    /// Returns `false` only when the backend explicitly reports the element
    /// as not hittable.
    pub fn is_hittable(&self) -> bool {
        self.hittable != Some(false)
    }

    /// The screen point at the element's centre, if it has a frame.
    pub fn center(&self) -> Option<Point> {
        self.frame.as_ref().map(|f| f.point_at(NormalizedOffset::CENTER))
    }

    /// Depth-first pre-order search over descendants (excluding `self`).
    pub fn first_descendant(&self, pred: impl Fn(&UIElement) -> bool + Copy) -> Option<&UIElement> {
        for child in &self.children {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.first_descendant(pred) {
                return Some(found);
            }
        }
        None
    }
}

/// The frame (position and dimensions) of a UI element.
///
/// Coordinates are in screen points, origin at the top-left of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementFrame {
    /// The x-coordinate of the top-left corner.
    pub x: f64,
    /// The y-coordinate of the top-left corner.
    pub y: f64,
    /// The width in points.
    pub width: f64,
    /// The height in points.
    pub height: f64,
}

impl ElementFrame {
    /// Converts a normalized offset within this frame into a screen point.
    pub fn point_at(&self, offset: NormalizedOffset) -> Point {
        Point {
            x: self.x + self.width * offset.dx,
            y: self.y + self.height * offset.dy,
        }
    }
}

/// Coarse classification of element types relevant to gesture targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Table,
    CollectionView,
    ScrollView,
    Other,
}

impl ElementKind {
    /// Maps an agent type name to a kind.
    ///
    /// Matching ignores ASCII case and an optional `XCUIElementType` prefix,
    /// so `"Table"`, `"table"` and `"XCUIElementTypeTable"` are equivalent.
    pub fn from_type_name(name: &str) -> Self {
        let trimmed = name.trim();
        let bare = trimmed
            .strip_prefix("XCUIElementType")
            .unwrap_or(trimmed)
            .to_ascii_lowercase();
        match bare.as_str() {
            "table" => ElementKind::Table,
            "collectionview" => ElementKind::CollectionView,
            "scrollview" => ElementKind::ScrollView,
            _ => ElementKind::Other,
        }
    }

    /// Table, collection view, or generic scroll container.
    pub fn is_scrollable(self) -> bool {
        matches!(
            self,
            ElementKind::Table | ElementKind::CollectionView | ElementKind::ScrollView
        )
    }
}
