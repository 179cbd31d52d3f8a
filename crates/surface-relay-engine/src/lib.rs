//! Core of surface-relay: keeps an in-page editable surface and an external
//! editing session in sync.
//!
//! Focus events feed the [`SessionContext`]; the external session pulls the
//! focused surface's text and selection with `edit-text-input` and pushes
//! replacement text back with `fill-text-input`. Host environments plug in
//! through the traits in [`host`].

pub mod host;
pub mod injection;
pub mod session;
pub mod surface;

// Re-export key types for easier usage
pub use host::{Host, HostError, Port, Surface};
pub use injection::{AttemptStatus, FillOutcome, FillReport, InjectionEngine, InjectionStrategy};
pub use session::protocol::{Command, CommandEnvelope, EditRequest, OutboundMessage};
pub use session::router::{Dispatch, RelayError, SessionRouter};
pub use session::{SessionContext, SessionId};
pub use surface::selection::{offset_at, position_at};
pub use surface::{Position, SelectionRange, SurfaceKind, SurfaceTracker, TrackedSurface};
