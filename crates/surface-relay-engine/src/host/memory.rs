//! In-memory host for headless runs and tests.
//!
//! Elements react to synthetic events the way the caller configures them,
//! which lets each write-back strategy be exercised on its own.

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::{self, Rc};
use std::time::Duration;

use super::{Host, HostError, Port, Surface};
use crate::session::protocol::OutboundMessage;
use crate::surface::selection::{NativeSelection, SelectionDirection};
use crate::surface::{SurfaceKind, TrackedSurface};

/// How an element reacts to a synthetic event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EventResponse {
    /// No listener acts on the event (the browser default for synthetic events)
    #[default]
    Ignore,
    /// An editor listener replaces the element's content with the payload
    Apply,
    /// Dispatching throws
    Fail(String),
}

/// Everything observable that happened to an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Focus,
    InsertText(String),
    Paste(String),
    SetValue(String),
    SetTextContent(String),
}

#[derive(Debug)]
struct ElementState {
    node_name: String,
    content_editable: bool,
    rendered: bool,
    connected: bool,
    value: Option<String>,
    text_content: String,
    selection: Option<NativeSelection>,
    insert_text: EventResponse,
    paste: EventResponse,
    events: Vec<SurfaceEvent>,
}

/// Shared handle to an in-memory element; clones refer to the same element.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    state: Rc<RefCell<ElementState>>,
}

/// Weak handle to a [`MemorySurface`]
#[derive(Debug, Clone)]
pub struct WeakMemorySurface {
    state: rc::Weak<RefCell<ElementState>>,
}

impl MemorySurface {
    /// A rendered, connected element with no value and empty text content
    pub fn new(node_name: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(ElementState {
                node_name: node_name.to_string(),
                content_editable: false,
                rendered: true,
                connected: true,
                value: None,
                text_content: String::new(),
                selection: None,
                insert_text: EventResponse::Ignore,
                paste: EventResponse::Ignore,
                events: Vec::new(),
            })),
        }
    }

    /// A `TEXTAREA` holding `value`
    pub fn field(value: &str) -> Self {
        Self::new("TEXTAREA").with_value(value)
    }

    /// A content-editable `DIV` holding `text`
    pub fn rich(text: &str) -> Self {
        let surface = Self::new("DIV").with_text_content(text);
        surface.set_content_editable(true);
        surface
    }

    pub fn with_value(self, value: &str) -> Self {
        self.state.borrow_mut().value = Some(value.to_string());
        self
    }

    pub fn with_text_content(self, text: &str) -> Self {
        self.state.borrow_mut().text_content = text.to_string();
        self
    }

    pub fn with_selection(self, start: usize, end: usize, direction: SelectionDirection) -> Self {
        self.state.borrow_mut().selection = Some(NativeSelection::new(start, end, direction));
        self
    }

    pub fn on_insert_text(self, response: EventResponse) -> Self {
        self.state.borrow_mut().insert_text = response;
        self
    }

    pub fn on_paste(self, response: EventResponse) -> Self {
        self.state.borrow_mut().paste = response;
        self
    }

    pub fn set_content_editable(&self, content_editable: bool) {
        self.state.borrow_mut().content_editable = content_editable;
    }

    pub fn set_rendered(&self, rendered: bool) {
        self.state.borrow_mut().rendered = rendered;
    }

    /// Remove the element from its document
    pub fn detach(&self) {
        self.state.borrow_mut().connected = false;
    }

    pub fn same_node(&self, other: &MemorySurface) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.state.borrow().events.clone()
    }

    fn record(&self, event: SurfaceEvent) {
        self.state.borrow_mut().events.push(event);
    }

    fn replace_content(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        if state.content_editable {
            state.text_content = text.to_string();
        } else {
            state.value = Some(text.to_string());
        }
    }

    fn respond(&self, response: EventResponse, text: &str) -> Result<(), HostError> {
        match response {
            EventResponse::Ignore => Ok(()),
            EventResponse::Apply => {
                self.replace_content(text);
                Ok(())
            }
            EventResponse::Fail(reason) => Err(HostError::rejected("event dispatch", reason)),
        }
    }
}

impl Surface for MemorySurface {
    type Weak = WeakMemorySurface;

    fn downgrade(&self) -> WeakMemorySurface {
        WeakMemorySurface {
            state: Rc::downgrade(&self.state),
        }
    }

    fn upgrade(weak: &WeakMemorySurface) -> Option<Self> {
        weak.state.upgrade().map(|state| Self { state })
    }

    fn node_name(&self) -> String {
        self.state.borrow().node_name.clone()
    }

    fn is_content_editable(&self) -> bool {
        self.state.borrow().content_editable
    }

    fn is_rendered(&self) -> bool {
        self.state.borrow().rendered
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    fn value(&self) -> Option<String> {
        self.state.borrow().value.clone()
    }

    fn set_value(&self, text: &str) -> Result<(), HostError> {
        self.record(SurfaceEvent::SetValue(text.to_string()));
        self.state.borrow_mut().value = Some(text.to_string());
        Ok(())
    }

    fn text_content(&self) -> Option<String> {
        Some(self.state.borrow().text_content.clone())
    }

    fn set_text_content(&self, text: &str) -> Result<(), HostError> {
        self.record(SurfaceEvent::SetTextContent(text.to_string()));
        self.state.borrow_mut().text_content = text.to_string();
        Ok(())
    }

    fn native_selection(&self) -> Option<NativeSelection> {
        self.state.borrow().selection
    }

    fn focus(&self) -> Result<(), HostError> {
        self.record(SurfaceEvent::Focus);
        Ok(())
    }

    fn dispatch_insert_text(&self, text: &str) -> Result<(), HostError> {
        self.record(SurfaceEvent::InsertText(text.to_string()));
        let response = self.state.borrow().insert_text.clone();
        self.respond(response, text)
    }

    fn dispatch_paste(&self, text: &str) -> Result<(), HostError> {
        self.record(SurfaceEvent::Paste(text.to_string()));
        let response = self.state.borrow().paste.clone();
        self.respond(response, text)
    }
}

#[derive(Debug, Default)]
struct HostState {
    hidden: Cell<bool>,
    document_selection: Cell<Option<(usize, usize)>>,
    selected_text: RefCell<Option<String>>,
    clipboard: RefCell<Option<String>>,
    clipboard_error: RefCell<Option<String>>,
    sleeps: RefCell<Vec<Duration>>,
}

/// Shared handle to an in-memory document context
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    state: Rc<HostState>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document_selection(self, anchor: usize, focus: usize) -> Self {
        self.state.document_selection.set(Some((anchor, focus)));
        self
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.state.hidden.set(hidden);
    }

    /// Make every clipboard write fail with `reason`
    pub fn fail_clipboard(&self, reason: &str) {
        *self.state.clipboard_error.borrow_mut() = Some(reason.to_string());
    }

    pub fn clipboard(&self) -> Option<String> {
        self.state.clipboard.borrow().clone()
    }

    /// Delays requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.sleeps.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Host for MemoryHost {
    type Surface = MemorySurface;

    fn is_hidden(&self) -> bool {
        self.state.hidden.get()
    }

    fn selection_offsets(&self) -> Option<(usize, usize)> {
        self.state.document_selection.get()
    }

    fn select_contents(&self, surface: &TrackedSurface<MemorySurface>) -> Result<(), HostError> {
        let element = surface.element();
        match surface.kind() {
            SurfaceKind::PlainField => {
                // A field's own selection; the document selection is untouched
                let len = element.value().unwrap_or_default().encode_utf16().count();
                element.state.borrow_mut().selection =
                    Some(NativeSelection::new(0, len, SelectionDirection::Forward));
            }
            SurfaceKind::ContentEditable => {
                let text = element.text_content().unwrap_or_default();
                let len = text.encode_utf16().count();
                self.state.document_selection.set(Some((0, len)));
                *self.state.selected_text.borrow_mut() = Some(text);
            }
        }
        Ok(())
    }

    fn selected_text(&self) -> Option<String> {
        self.state.selected_text.borrow().clone()
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError> {
        if let Some(reason) = self.state.clipboard_error.borrow().as_ref() {
            return Err(HostError::rejected("clipboard write", reason.clone()));
        }
        *self.state.clipboard.borrow_mut() = Some(text.to_string());
        Ok(())
    }

    async fn sleep(&self, delay: Duration) {
        self.state.sleeps.borrow_mut().push(delay);
    }
}

#[derive(Debug, Default)]
struct PortState {
    sent: Vec<OutboundMessage>,
    closed: bool,
}

/// Port that keeps every posted message; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryPort {
    state: Rc<RefCell<PortState>>,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.state.borrow().sent.clone()
    }

    /// Make later posts fail as if the external session disconnected
    pub fn close(&self) {
        self.state.borrow_mut().closed = true;
    }
}

impl Port for MemoryPort {
    fn post(&self, message: &OutboundMessage) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(HostError::ChannelClosed);
        }
        state.sent.push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_clones_share_element_state() {
        let field = MemorySurface::field("before");
        let alias = field.clone();

        alias.set_value("after").unwrap();

        assert_eq!(field.value().as_deref(), Some("after"));
        assert!(field.same_node(&alias));
        assert!(!field.same_node(&MemorySurface::field("after")));
    }

    #[test]
    fn test_weak_handle_does_not_keep_element_alive() {
        let field = MemorySurface::field("short lived");
        let weak = field.downgrade();

        assert!(MemorySurface::upgrade(&weak).is_some_and(|alias| alias.same_node(&field)));
        drop(field);
        assert!(MemorySurface::upgrade(&weak).is_none());
    }

    #[test]
    fn test_applied_insert_text_replaces_rich_content() {
        let region = MemorySurface::rich("old").on_insert_text(EventResponse::Apply);

        region.dispatch_insert_text("new").unwrap();

        assert_eq!(region.text_content().as_deref(), Some("new"));
        assert_eq!(region.events(), vec![SurfaceEvent::InsertText("new".into())]);
    }

    #[test]
    fn test_failing_paste_reports_rejection() {
        let region = MemorySurface::rich("old").on_paste(EventResponse::Fail("csp".into()));

        let err = region.dispatch_paste("new").unwrap_err();

        assert_eq!(err, HostError::rejected("event dispatch", "csp"));
        assert_eq!(region.text_content().as_deref(), Some("old"));
    }

    #[test]
    fn test_select_contents_of_field_uses_native_selection() {
        let host = MemoryHost::new().with_document_selection(1, 1);
        let field = MemorySurface::field("héllo").with_selection(2, 2, SelectionDirection::Forward);
        let tracked = TrackedSurface::new(field.clone(), SurfaceKind::PlainField);

        host.select_contents(&tracked).unwrap();

        assert_eq!(
            field.native_selection(),
            Some(NativeSelection::new(0, 5, SelectionDirection::Forward))
        );
        assert_eq!(host.selection_offsets(), Some((1, 1)));
        assert_eq!(host.selected_text(), None);
    }

    #[test]
    fn test_select_contents_follows_kind_tag_not_element() {
        // Classified as a field, later made content-editable by the page
        let field = MemorySurface::field("value").with_text_content("text");
        let tracked = TrackedSurface::new(field.clone(), SurfaceKind::PlainField);
        field.set_content_editable(true);
        let host = MemoryHost::new();

        host.select_contents(&tracked).unwrap();

        assert_eq!(host.selected_text(), None);
        assert_eq!(
            field.native_selection(),
            Some(NativeSelection::new(0, 5, SelectionDirection::Forward))
        );
    }

    #[test]
    fn test_clipboard_failure() {
        let host = MemoryHost::new();
        host.fail_clipboard("denied");

        let result = block_on(host.write_clipboard("text"));

        assert!(result.is_err());
        assert_eq!(host.clipboard(), None);
    }

    #[test]
    fn test_closed_port_rejects_posts() {
        let port = MemoryPort::new();
        port.close();

        let message = OutboundMessage {
            command: "edit".to_string(),
            arguments: Vec::new(),
        };

        assert_eq!(port.post(&message), Err(HostError::ChannelClosed));
        assert!(port.sent().is_empty());
    }
}
