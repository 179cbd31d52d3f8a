//! # Host Capabilities
//!
//! The engine never touches a real document. Everything it needs from the
//! embedding environment goes through three traits:
//!
//! - [`Surface`]: one element that may accept text (read/write value, text
//!   content, native selection, focus, synthetic events)
//! - [`Host`]: document-wide capabilities (visibility, the document-level
//!   selection, clipboard, timers)
//! - [`Port`]: the outbound half of the channel to the external session
//!
//! Hosts are single-threaded, so the async methods are `?Send`.
//!
//! [`memory`] provides an in-memory host used by tests and the replay tool.

pub mod memory;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::session::protocol::OutboundMessage;
use crate::surface::TrackedSurface;
use crate::surface::selection::NativeSelection;

/// Failure reported by a host capability
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("{operation} was rejected: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },

    #[error("{0} is not available in this context")]
    Unavailable(&'static str),

    #[error("Channel closed")]
    ChannelClosed,
}

impl HostError {
    pub fn rejected(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            reason: reason.into(),
        }
    }
}

/// An element handle owned by the document.
///
/// Cloning must be cheap and must not copy the element: every clone refers
/// to the same node.
pub trait Surface: Clone {
    /// Non-owning counterpart of the handle
    type Weak: Clone + fmt::Debug;

    fn downgrade(&self) -> Self::Weak;

    /// The element again, unless the document has released it
    fn upgrade(weak: &Self::Weak) -> Option<Self>;

    /// Upper- or lower-case node name, e.g. `TEXTAREA`
    fn node_name(&self) -> String;

    fn is_content_editable(&self) -> bool;

    /// Whether the element currently has a containing layout box
    fn is_rendered(&self) -> bool;

    /// Whether the element is still attached to its document
    fn is_connected(&self) -> bool;

    /// Native `value` property, if the element has one
    fn value(&self) -> Option<String>;

    fn set_value(&self, text: &str) -> Result<(), HostError>;

    fn text_content(&self) -> Option<String>;

    fn set_text_content(&self, text: &str) -> Result<(), HostError>;

    /// Native selection offsets, when the element exposes them
    fn native_selection(&self) -> Option<NativeSelection>;

    fn focus(&self) -> Result<(), HostError>;

    /// Dispatch a bubbling, composed `beforeinput` event of type `insertText`
    fn dispatch_insert_text(&self, text: &str) -> Result<(), HostError>;

    /// Dispatch a synthetic `paste` event whose clipboard payload is `text`
    fn dispatch_paste(&self, text: &str) -> Result<(), HostError>;
}

/// Document-level capabilities of one document context
#[async_trait(?Send)]
pub trait Host {
    type Surface: Surface;

    /// Whether the document is currently hidden (e.g. a background tab)
    fn is_hidden(&self) -> bool;

    /// Anchor and focus offsets of the document-level selection
    fn selection_offsets(&self) -> Option<(usize, usize)>;

    /// Select the full contents of `surface`.
    ///
    /// Plain fields select their own value (the element's native `select()`);
    /// content-editable regions replace the document selection.
    fn select_contents(&self, surface: &TrackedSurface<Self::Surface>) -> Result<(), HostError>;

    /// Stringified text of the document-level selection
    fn selected_text(&self) -> Option<String>;

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError>;

    async fn sleep(&self, delay: Duration);
}

/// Outbound side of the channel to the external session
pub trait Port {
    fn post(&self, message: &OutboundMessage) -> Result<(), HostError>;
}
