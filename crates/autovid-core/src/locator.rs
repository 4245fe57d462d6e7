//! Re-resolvable element handles.
//!
//! A [`Locator`] describes *how* to find an element, not the element itself.
//! It is looked up against a fresh hierarchy snapshot every time a humanized
//! action runs, so existence and hittability always reflect the live UI.
//!
//! Identifier and label selectors accept glob wildcards: `*` matches any run
//! of characters and `?` a single character.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::UIElement;

/// How to find an element in the accessibility hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// The application root (first root of the hierarchy).
    App,
    /// Match by accessibility identifier.
    Id(String),
    /// Match by accessibility label.
    Label(String),
    /// Match by identifier or label, restricted to an element type.
    Typed {
        selector: String,
        #[serde(default)]
        by_label: bool,
        element_type: String,
    },
}

impl Locator {
    /// Builds a locator from CLI-style parts.
    pub fn from_parts(selector: impl Into<String>, by_label: bool, element_type: Option<String>) -> Self {
        let selector = selector.into();
        match element_type {
            Some(element_type) => Locator::Typed { selector, by_label, element_type },
            None if by_label => Locator::Label(selector),
            None => Locator::Id(selector),
        }
    }

    /// Finds the first matching element in depth-first pre-order.
    pub fn locate<'a>(&self, roots: &'a [UIElement]) -> Option<&'a UIElement> {
        match self {
            Locator::App => roots.first(),
            _ => search(roots, &|el: &UIElement| self.matches(el)),
        }
    }

    /// Whether a single element satisfies this locator (ignores children).
    pub fn matches(&self, element: &UIElement) -> bool {
        match self {
            Locator::App => false,
            Locator::Id(id) => matches_field(element.identifier.as_deref(), id),
            Locator::Label(label) => matches_field(element.label.as_deref(), label),
            Locator::Typed { selector, by_label, element_type } => {
                let field = if *by_label { &element.label } else { &element.identifier };
                matches_field(field.as_deref(), selector)
                    && element.element_type.as_deref() == Some(element_type.as_str())
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::App => write!(f, "app"),
            Locator::Id(id) => write!(f, "'{id}'"),
            Locator::Label(label) => write!(f, "label '{label}'"),
            Locator::Typed { selector, by_label: true, element_type } => {
                write!(f, "{element_type} with label '{selector}'")
            }
            Locator::Typed { selector, element_type, .. } => write!(f, "{element_type} '{selector}'"),
        }
    }
}

fn matches_field(value: Option<&str>, pattern: &str) -> bool {
    value.is_some_and(|v| glob_match(pattern, v))
}

fn search<'a>(elements: &'a [UIElement], pred: &dyn Fn(&UIElement) -> bool) -> Option<&'a UIElement> {
    for element in elements {
        if pred(element) {
            return Some(element);
        }
        if let Some(found) = search(&element.children, pred) {
            return Some(found);
        }
    }
    None
}

fn has_wildcard(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Matches `text` against a glob `pattern`; exact equality when the pattern
/// has no wildcards.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if !has_wildcard(pattern) {
        return pattern == text;
    }

    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();

    // reachable[j]: pat[..i] matches txt[..j], rolled over i
    let mut reachable = vec![false; txt.len() + 1];
    reachable[0] = true;

    for &p in &pat {
        let mut next = vec![false; txt.len() + 1];
        if p == '*' {
            let mut seen = false;
            for j in 0..=txt.len() {
                seen |= reachable[j];
                next[j] = seen;
            }
        } else {
            for j in 1..=txt.len() {
                next[j] = reachable[j - 1] && (p == '?' || p == txt[j - 1]);
            }
        }
        reachable = next;
    }

    reachable[txt.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Vec<UIElement> {
        vec![UIElement::new("Application")
            .with_identifier("app-root")
            .with_child(
                UIElement::new("Other")
                    .with_child(UIElement::new("TextField").with_identifier("email-field").with_label("Email"))
                    .with_child(UIElement::new("Button").with_identifier("login-button").with_label("Log In")),
            )
            .with_child(UIElement::new("StaticText").with_label("Log In"))]
    }

    #[test]
    fn app_locates_first_root() {
        let tree = screen();
        let found = Locator::App.locate(&tree).unwrap();
        assert_eq!(found.identifier.as_deref(), Some("app-root"));
        assert!(Locator::App.locate(&[]).is_none());
    }

    #[test]
    fn locate_by_id_and_label() {
        let tree = screen();
        let by_id = Locator::Id("login-button".into()).locate(&tree).unwrap();
        assert_eq!(by_id.label.as_deref(), Some("Log In"));

        let by_label = Locator::Label("Email".into()).locate(&tree).unwrap();
        assert_eq!(by_label.identifier.as_deref(), Some("email-field"));

        assert!(Locator::Id("missing".into()).locate(&tree).is_none());
    }

    #[test]
    fn typed_locator_filters_by_type() {
        let tree = screen();
        let text = Locator::Typed {
            selector: "Log In".into(),
            by_label: true,
            element_type: "StaticText".into(),
        };
        let found = text.locate(&tree).unwrap();
        assert!(found.identifier.is_none());

        let wrong = Locator::Typed {
            selector: "login-button".into(),
            by_label: false,
            element_type: "TextField".into(),
        };
        assert!(wrong.locate(&tree).is_none());
    }

    #[test]
    fn glob_selectors() {
        let tree = screen();
        let found = Locator::Id("*-field".into()).locate(&tree).unwrap();
        assert_eq!(found.label.as_deref(), Some("Email"));
    }

    #[test]
    fn from_parts_picks_variant() {
        assert_eq!(Locator::from_parts("a", false, None), Locator::Id("a".into()));
        assert_eq!(Locator::from_parts("a", true, None), Locator::Label("a".into()));
        assert!(matches!(
            Locator::from_parts("a", true, Some("Button".into())),
            Locator::Typed { by_label: true, .. }
        ));
    }

    #[test]
    fn deserializes_script_forms() {
        let app: Locator = serde_json::from_str(r#""app""#).unwrap();
        assert_eq!(app, Locator::App);
        let id: Locator = serde_json::from_str(r#"{"id":"save"}"#).unwrap();
        assert_eq!(id, Locator::Id("save".into()));
        let typed: Locator =
            serde_json::from_str(r#"{"typed":{"selector":"Save","element_type":"Button"}}"#).unwrap();
        assert_eq!(
            typed,
            Locator::Typed { selector: "Save".into(), by_label: false, element_type: "Button".into() }
        );
    }

    #[test]
    fn glob_match_exact() {
        assert!(glob_match("hello", "hello"));
        assert!(!glob_match("hello", "world"));
    }

    #[test]
    fn glob_match_star() {
        assert!(glob_match("Log*", "Log In"));
        assert!(glob_match("Log*", "Log"));
        assert!(!glob_match("Log*", "Blog"));
        assert!(glob_match("*", ""));
    }

    #[test]
    fn glob_match_question_mark() {
        assert!(glob_match("Item ?", "Item 1"));
        assert!(!glob_match("Item ?", "Item 12"));
        assert!(glob_match("Tab ?*", "Tab 1 Selected"));
        assert!(!glob_match("Tab ?*", "Tab "));
    }
}
