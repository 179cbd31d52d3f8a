//! # Editable Surfaces
//!
//! A surface is any element that accepts user text. Its kind is decided once,
//! when it gains focus, and every later read or write is selected by that tag
//! instead of probing the element again.
//!
//! - **`tracker`**: remembers the most recently focused surface
//! - **`selection`**: raw offsets to line/column positions and back

pub mod selection;
pub mod tracker;

pub use selection::{NativeSelection, Position, SelectionDirection, SelectionRange};
pub use tracker::SurfaceTracker;

use surface_relay_config::Config;

use crate::host::Surface;

/// Kind tag fixed at classification time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Input-like element with a native value and native selection offsets
    PlainField,
    /// Rich region whose selection is only visible through the document selection
    ContentEditable,
}

/// Classify `element`, returning `None` for unsupported elements.
///
/// An element qualifies when it is rendered and is either content-editable
/// or one of the recognized field node kinds. Content-editable wins when both
/// hold.
pub fn classify<S: Surface>(element: &S, config: &Config) -> Option<SurfaceKind> {
    if !element.is_rendered() {
        return None;
    }
    if element.is_content_editable() {
        Some(SurfaceKind::ContentEditable)
    } else if config.recognizes(&element.node_name()) {
        Some(SurfaceKind::PlainField)
    } else {
        None
    }
}

/// A classified element handle
#[derive(Debug, Clone)]
pub struct TrackedSurface<S> {
    element: S,
    kind: SurfaceKind,
}

impl<S: Surface> TrackedSurface<S> {
    pub fn new(element: S, kind: SurfaceKind) -> Self {
        Self { element, kind }
    }

    pub fn element(&self) -> &S {
        &self.element
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// Text a user would currently see in the surface, without touching the
    /// document selection.
    pub fn visible_text(&self) -> String {
        match self.kind {
            SurfaceKind::ContentEditable => self.element.text_content().unwrap_or_default(),
            SurfaceKind::PlainField => self
                .element
                .value()
                .or_else(|| self.element.text_content())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemorySurface;
    use rstest::rstest;

    #[rstest]
    #[case("INPUT", false, Some(SurfaceKind::PlainField))]
    #[case("TEXTAREA", false, Some(SurfaceKind::PlainField))]
    #[case("OBJECT", false, Some(SurfaceKind::PlainField))]
    #[case("textarea", false, Some(SurfaceKind::PlainField))]
    #[case("DIV", true, Some(SurfaceKind::ContentEditable))]
    #[case("TEXTAREA", true, Some(SurfaceKind::ContentEditable))]
    #[case("DIV", false, None)]
    #[case("BUTTON", false, None)]
    fn test_classify(
        #[case] node_name: &str,
        #[case] content_editable: bool,
        #[case] expected: Option<SurfaceKind>,
    ) {
        let element = MemorySurface::new(node_name);
        element.set_content_editable(content_editable);

        assert_eq!(classify(&element, &Config::default()), expected);
    }

    #[test]
    fn test_unrendered_elements_are_unsupported() {
        let field = MemorySurface::field("hello");
        field.set_rendered(false);

        assert_eq!(classify(&field, &Config::default()), None);
    }

    #[test]
    fn test_recognized_nodes_follow_config() {
        let config = Config {
            recognized_nodes: vec!["SELECT".to_string()],
            ..Config::default()
        };

        assert_eq!(
            classify(&MemorySurface::new("SELECT"), &config),
            Some(SurfaceKind::PlainField)
        );
        assert_eq!(classify(&MemorySurface::new("INPUT"), &config), None);
    }

    #[test]
    fn test_visible_text_per_kind() {
        let field = MemorySurface::field("value text");
        field.set_text_content("default text");
        let tracked = TrackedSurface::new(field, SurfaceKind::PlainField);
        assert_eq!(tracked.visible_text(), "value text");

        let region = MemorySurface::rich("rich text");
        let tracked = TrackedSurface::new(region, SurfaceKind::ContentEditable);
        assert_eq!(tracked.visible_text(), "rich text");
    }

    #[test]
    fn test_field_without_value_falls_back_to_text_content() {
        let object = MemorySurface::new("OBJECT");
        object.set_text_content("fallback");
        let tracked = TrackedSurface::new(object, SurfaceKind::PlainField);

        assert_eq!(tracked.visible_text(), "fallback");
    }
}
