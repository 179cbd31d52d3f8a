use async_trait::async_trait;
use js_sys::Promise;
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlInputElement, HtmlTextAreaElement, Selection, Window};

use surface_relay_engine::{Host, HostError, SurfaceKind, TrackedSurface};

use crate::surface::{DomSurface, js_error};

#[wasm_bindgen]
extern "C" {
    /// `navigator.clipboard.writeText`; throws when the clipboard API is missing
    #[wasm_bindgen(js_namespace = ["navigator", "clipboard"], js_name = writeText, catch)]
    fn clipboard_write_text(text: &str) -> Result<Promise, JsValue>;
}

/// The document the content script runs in
#[derive(Debug, Clone)]
pub struct WebHost {
    window: Window,
    document: Document,
}

impl WebHost {
    pub fn new() -> Result<Self, HostError> {
        let window = web_sys::window().ok_or(HostError::Unavailable("window"))?;
        let document = window
            .document()
            .ok_or(HostError::Unavailable("document"))?;
        Ok(Self { window, document })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    fn selection(&self) -> Option<Selection> {
        self.window.get_selection().ok().flatten()
    }
}

#[async_trait(?Send)]
impl Host for WebHost {
    type Surface = DomSurface;

    fn is_hidden(&self) -> bool {
        self.document.hidden()
    }

    fn selection_offsets(&self) -> Option<(usize, usize)> {
        self.selection()
            .map(|selection| (selection.anchor_offset() as usize, selection.focus_offset() as usize))
    }

    fn select_contents(&self, surface: &TrackedSurface<DomSurface>) -> Result<(), HostError> {
        let element = surface.element().element();
        match surface.kind() {
            SurfaceKind::PlainField => {
                if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
                    input.select();
                } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
                    area.select();
                } else {
                    return Err(HostError::Unavailable("field selection"));
                }
                Ok(())
            }
            SurfaceKind::ContentEditable => {
                let selection = self
                    .selection()
                    .ok_or(HostError::Unavailable("document selection"))?;
                selection
                    .select_all_children(element)
                    .map_err(js_error("select all"))
            }
        }
    }

    fn selected_text(&self) -> Option<String> {
        self.selection().map(|selection| String::from(selection.to_string()))
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError> {
        let promise = clipboard_write_text(text).map_err(js_error("clipboard write"))?;
        JsFuture::from(promise)
            .await
            .map_err(js_error("clipboard write"))?;
        Ok(())
    }

    async fn sleep(&self, delay: Duration) {
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let window = self.window.clone();
        let promise = Promise::new(&mut |resolve, _reject| {
            if window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                .is_err()
            {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        if let Err(err) = JsFuture::from(promise).await {
            log::warn!("Timer failed: {err:?}");
        }
    }
}
