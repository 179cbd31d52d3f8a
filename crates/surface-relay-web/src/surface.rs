//! DOM elements as [`Surface`]s.

use js_sys::{Object, Reflect, WeakRef};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    ClipboardEvent, ClipboardEventInit, DataTransfer, HtmlElement, InputEvent, InputEventInit,
};

use surface_relay_engine::surface::{NativeSelection, SelectionDirection};
use surface_relay_engine::{HostError, Surface};

/// Handle to a live element; clones share the node.
#[derive(Debug, Clone)]
pub struct DomSurface {
    element: HtmlElement,
}

/// Weak reference to a [`DomSurface`]; the page may collect the element.
#[derive(Debug, Clone)]
pub struct WeakDomSurface {
    element: WeakRef,
}

impl DomSurface {
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    fn property(&self, name: &str) -> Option<JsValue> {
        Reflect::get(&self.element, &JsValue::from_str(name))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
    }

    fn offset_property(&self, name: &str) -> Option<usize> {
        self.property(name)
            .and_then(|value| value.as_f64())
            .map(|offset| offset as usize)
    }
}

/// Turn a thrown JS value into a [`HostError`]
pub(crate) fn js_error(operation: &'static str) -> impl Fn(JsValue) -> HostError {
    move |value| HostError::rejected(operation, describe_js(&value))
}

pub(crate) fn describe_js(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

impl Surface for DomSurface {
    type Weak = WeakDomSurface;

    fn downgrade(&self) -> WeakDomSurface {
        WeakDomSurface {
            element: WeakRef::new(self.element.unchecked_ref::<Object>()),
        }
    }

    fn upgrade(weak: &WeakDomSurface) -> Option<Self> {
        WeakRef::deref(&weak.element)
            .and_then(|object| object.dyn_into::<HtmlElement>().ok())
            .map(DomSurface::new)
    }

    fn node_name(&self) -> String {
        self.element.node_name()
    }

    fn is_content_editable(&self) -> bool {
        self.element.is_content_editable()
    }

    fn is_rendered(&self) -> bool {
        self.element.offset_parent().is_some()
    }

    fn is_connected(&self) -> bool {
        self.element.is_connected()
    }

    fn value(&self) -> Option<String> {
        self.property("value").and_then(|value| value.as_string())
    }

    fn set_value(&self, text: &str) -> Result<(), HostError> {
        Reflect::set(
            &self.element,
            &JsValue::from_str("value"),
            &JsValue::from_str(text),
        )
        .map_err(js_error("value assignment"))?;
        Ok(())
    }

    fn text_content(&self) -> Option<String> {
        self.element.text_content()
    }

    fn set_text_content(&self, text: &str) -> Result<(), HostError> {
        self.element.set_text_content(Some(text));
        Ok(())
    }

    fn native_selection(&self) -> Option<NativeSelection> {
        let start = self.offset_property("selectionStart")?;
        let end = self.offset_property("selectionEnd")?;
        let direction = self
            .property("selectionDirection")
            .and_then(|value| value.as_string())
            .and_then(|value| value.parse().ok())
            .unwrap_or(SelectionDirection::Unknown);
        Some(NativeSelection::new(start, end, direction))
    }

    fn focus(&self) -> Result<(), HostError> {
        self.element.focus().map_err(js_error("focus"))
    }

    fn dispatch_insert_text(&self, text: &str) -> Result<(), HostError> {
        let init = InputEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_composed(true);
        init.set_input_type("insertText");
        init.set_data(Some(text));

        let event = InputEvent::new_with_event_init_dict("beforeinput", &init)
            .map_err(js_error("beforeinput"))?;
        self.element
            .dispatch_event(&event)
            .map_err(js_error("beforeinput"))?;
        Ok(())
    }

    fn dispatch_paste(&self, text: &str) -> Result<(), HostError> {
        let data = DataTransfer::new().map_err(js_error("paste"))?;
        data.set_data("text/plain", text)
            .map_err(js_error("paste"))?;

        let init = ClipboardEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_composed(true);
        init.set_clipboard_data(Some(&data));

        let event = ClipboardEvent::new_with_event_init_dict("paste", &init)
            .map_err(js_error("paste"))?;
        self.element
            .dispatch_event(&event)
            .map_err(js_error("paste"))?;
        Ok(())
    }
}
