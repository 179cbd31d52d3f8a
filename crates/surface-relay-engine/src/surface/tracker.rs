use surface_relay_config::Config;

use crate::host::Surface;
use crate::surface::{SurfaceKind, TrackedSurface, classify};

/// Remembers the most recently focused editable surface.
///
/// There is no history: every qualifying focus event replaces the previous
/// surface. The tracker only holds a weak handle and never controls the
/// element's lifetime; once the element leaves the document or is released
/// it is reported as absent.
#[derive(Debug)]
pub struct SurfaceTracker<S: Surface> {
    config: Config,
    current: Option<(S::Weak, SurfaceKind)>,
}

impl<S: Surface> SurfaceTracker<S> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            current: None,
        }
    }

    /// Handle a (capture-phase) focus event. Returns whether `target` is now tracked.
    pub fn on_focus(&mut self, target: S) -> bool {
        match classify(&target, &self.config) {
            Some(kind) => {
                log::trace!("Tracking {} as {kind:?}", target.node_name());
                self.current = Some((target.downgrade(), kind));
                true
            }
            None => false,
        }
    }

    /// The tracked surface, if it is still alive and attached to the document
    pub fn current(&self) -> Option<TrackedSurface<S>> {
        let (weak, kind) = self.current.as_ref()?;
        S::upgrade(weak)
            .filter(|element| element.is_connected())
            .map(|element| TrackedSurface::new(element, *kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemorySurface;
    use crate::surface::SurfaceKind;

    fn tracker() -> SurfaceTracker<MemorySurface> {
        SurfaceTracker::new(Config::default())
    }

    #[test]
    fn test_starts_empty() {
        assert!(tracker().current().is_none());
    }

    #[test]
    fn test_tracks_focused_field() {
        let mut tracker = tracker();
        let field = MemorySurface::field("abc");

        assert!(tracker.on_focus(field.clone()));

        let current = tracker.current().unwrap();
        assert!(current.element().same_node(&field));
        assert_eq!(current.kind(), SurfaceKind::PlainField);
    }

    #[test]
    fn test_most_recent_focus_wins() {
        let mut tracker = tracker();
        let first = MemorySurface::field("first");
        let second = MemorySurface::rich("second");

        tracker.on_focus(first.clone());
        tracker.on_focus(second.clone());

        let current = tracker.current().unwrap();
        assert!(current.element().same_node(&second));
        assert_eq!(current.kind(), SurfaceKind::ContentEditable);
    }

    #[test]
    fn test_unsupported_focus_keeps_previous_surface() {
        let mut tracker = tracker();
        let field = MemorySurface::field("kept");

        tracker.on_focus(field.clone());
        assert!(!tracker.on_focus(MemorySurface::new("BUTTON")));

        assert!(tracker.current().unwrap().element().same_node(&field));
    }

    #[test]
    fn test_refocusing_same_surface_is_idempotent() {
        let mut tracker = tracker();
        let field = MemorySurface::field("same");

        tracker.on_focus(field.clone());
        tracker.on_focus(field.clone());

        assert!(tracker.current().unwrap().element().same_node(&field));
    }

    #[test]
    fn test_detached_surface_goes_stale() {
        let mut tracker = tracker();
        let field = MemorySurface::field("gone soon");

        tracker.on_focus(field.clone());
        field.detach();

        assert!(tracker.current().is_none());
    }

    #[test]
    fn test_released_surface_is_not_kept_alive() {
        let mut tracker = tracker();
        let field = MemorySurface::field("released");
        let weak = field.downgrade();

        tracker.on_focus(field);

        assert!(tracker.current().is_none());
        assert!(MemorySurface::upgrade(&weak).is_none());
    }

    #[test]
    fn test_kind_is_fixed_at_focus_time() {
        let mut tracker = tracker();
        let field = MemorySurface::field("plain");

        tracker.on_focus(field.clone());
        field.set_content_editable(true);

        assert_eq!(tracker.current().unwrap().kind(), SurfaceKind::PlainField);
    }
}
