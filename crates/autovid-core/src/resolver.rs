//! Scroll target resolution.
//!
//! Given any element, [`resolve`] picks the element a directional swipe
//! should be performed on. Priority is fixed:
//!
//! 1. the element itself, if it is a table, collection view or scroll view;
//! 2. its first table descendant;
//! 3. its first collection-view descendant;
//! 4. its first scroll-view descendant;
//! 5. the element itself, as a fallback.
//!
//! Resolution is a pure query over a snapshot. Callers re-capture the tree
//! before every gesture, so nothing here is memoized.

use crate::element::{ElementKind, UIElement};

/// Descendant probes in priority order.
const PROBE_ORDER: [ElementKind; 3] = [
    ElementKind::Table,
    ElementKind::CollectionView,
    ElementKind::ScrollView,
];

/// Returns the most specific scrollable element for `root`.
pub fn resolve(root: &UIElement) -> &UIElement {
    if root.kind().is_scrollable() {
        return root;
    }

    PROBE_ORDER
        .iter()
        .find_map(|&kind| root.first_descendant(move |e| e.kind() == kind))
        .unwrap_or(root)
}
