//! # Sessions
//!
//! One [`SessionContext`] exists per document context. It owns the surface
//! tracker and the session identity that every message on that context's
//! channels is tagged with, so concurrent documents sharing one external
//! endpoint never write into each other's surfaces.
//!
//! - **`protocol`**: wire envelopes and the closed [`Command`] type
//! - **`router`**: decodes inbound commands and runs them one at a time
//!
//! [`Command`]: protocol::Command

pub mod protocol;
pub mod router;

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use surface_relay_config::Config;
use uuid::Uuid;

use crate::host::Surface;
use crate::surface::{SurfaceTracker, TrackedSurface};

/// Opaque per-context token; only compared for equality
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new random session ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of one document context: its identity and its focused surface.
///
/// Contexts are single-threaded; the tracker is only borrowed for the
/// duration of a focus update or a lookup, never across an await.
#[derive(Debug)]
pub struct SessionContext<S: Surface> {
    id: SessionId,
    tracker: RefCell<SurfaceTracker<S>>,
}

impl<S: Surface> SessionContext<S> {
    pub fn new(config: Config) -> Self {
        Self::with_id(SessionId::generate(), config)
    }

    pub fn with_id(id: SessionId, config: Config) -> Self {
        log::debug!("Session {id} started");
        Self {
            id,
            tracker: RefCell::new(SurfaceTracker::new(config)),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn matches(&self, other: &SessionId) -> bool {
        &self.id == other
    }

    /// Forward a focus event to the tracker
    pub fn on_focus(&self, target: S) -> bool {
        self.tracker.borrow_mut().on_focus(target)
    }

    /// Handle to the current surface, detached from the tracker borrow
    pub fn current_surface(&self) -> Option<TrackedSurface<S>> {
        self.tracker.borrow().current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemorySurface;

    #[test]
    fn test_generated_ids_are_unique() {
        let first = SessionId::generate();
        let second = SessionId::generate();
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 36);
    }

    #[test]
    fn test_id_is_stable_for_context_lifetime() {
        let context: SessionContext<MemorySurface> = SessionContext::new(Config::default());
        let id = context.id().clone();

        context.on_focus(MemorySurface::field("a"));
        context.on_focus(MemorySurface::rich("b"));

        assert_eq!(context.id(), &id);
        assert!(context.matches(&id));
        assert!(!context.matches(&SessionId::from("someone-else")));
    }

    #[test]
    fn test_contexts_do_not_share_surfaces() {
        let left: SessionContext<MemorySurface> = SessionContext::new(Config::default());
        let right: SessionContext<MemorySurface> = SessionContext::new(Config::default());

        let field = MemorySurface::field("left only");
        left.on_focus(field.clone());

        assert!(left.current_surface().is_some());
        assert!(right.current_surface().is_none());
        assert_ne!(left.id(), right.id());
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let id = SessionId::from("abc-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-123\"");
    }
}
