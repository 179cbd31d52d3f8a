//! Extension runtime channel (`chrome.runtime.Port`).

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use surface_relay_engine::{CommandEnvelope, HostError, OutboundMessage, Port};

use crate::surface::describe_js;

#[wasm_bindgen]
extern "C" {
    #[derive(Debug, Clone)]
    pub type RuntimePort;

    #[wasm_bindgen(method, catch, js_name = postMessage)]
    fn post_message(this: &RuntimePort, message: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, getter, js_name = onMessage)]
    fn on_message(this: &RuntimePort) -> RuntimeEvent;

    #[wasm_bindgen(method, getter, js_name = onDisconnect)]
    fn on_disconnect(this: &RuntimePort) -> RuntimeEvent;

    pub type RuntimeEvent;

    #[wasm_bindgen(method, js_name = addListener)]
    fn add_listener(this: &RuntimeEvent, callback: &js_sys::Function);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onConnect"], js_name = addListener, catch)]
    pub fn add_connect_listener(callback: &js_sys::Function) -> Result<(), JsValue>;
}

/// Outbound half of one connected port
#[derive(Debug, Clone)]
pub struct ChromePort {
    port: RuntimePort,
}

impl ChromePort {
    pub fn new(port: RuntimePort) -> Self {
        Self { port }
    }

    /// Stream of decoded inbound envelopes, ending when the port disconnects.
    ///
    /// Messages that are not envelopes are dropped here; unknown commands are
    /// left for the router. The message listener lives until the port
    /// disconnects and is released together with the sender.
    pub fn inbound(&self) -> UnboundedReceiver<CommandEnvelope> {
        let (sender, receiver) = mpsc::unbounded();
        let connection = Rc::new(Connection::new(sender));

        let on_message_connection = connection.clone();
        let on_message = Closure::<dyn FnMut(JsValue)>::new(move |message: JsValue| {
            if let Some(envelope) = decode_message(&message) {
                on_message_connection.deliver(envelope);
            }
        });
        self.port
            .on_message()
            .add_listener(on_message.as_ref().unchecked_ref());
        connection.attach(on_message);

        // Fires at most once; a one-shot closure frees itself after the call
        let on_disconnect = Closure::once_into_js(move || connection.close());
        self.port
            .on_disconnect()
            .add_listener(on_disconnect.unchecked_ref());

        receiver
    }
}

/// Inbound state of one port: the channel sender and the listener feeding it.
///
/// The listener holds the connection and the connection holds the listener;
/// [`Connection::close`] breaks that cycle.
struct Connection<L> {
    sender: RefCell<Option<UnboundedSender<CommandEnvelope>>>,
    listener: RefCell<Option<L>>,
}

impl<L> Connection<L> {
    fn new(sender: UnboundedSender<CommandEnvelope>) -> Self {
        Self {
            sender: RefCell::new(Some(sender)),
            listener: RefCell::new(None),
        }
    }

    fn attach(&self, listener: L) {
        *self.listener.borrow_mut() = Some(listener);
    }

    /// Forward `envelope` to the router; false once the connection is closed
    fn deliver(&self, envelope: CommandEnvelope) -> bool {
        match self.sender.borrow().as_ref() {
            Some(sender) => sender.unbounded_send(envelope).is_ok(),
            None => false,
        }
    }

    /// End the inbound stream and release the listener
    fn close(&self) {
        self.sender.borrow_mut().take();
        let listener = self.listener.borrow_mut().take();
        drop(listener);
    }
}

impl Port for ChromePort {
    fn post(&self, message: &OutboundMessage) -> Result<(), HostError> {
        let json = message
            .to_json()
            .map_err(|err| HostError::rejected("post", err.to_string()))?;
        let value = js_sys::JSON::parse(&json)
            .map_err(|err| HostError::rejected("post", describe_js(&err)))?;
        // Posting on a disconnected port throws
        self.port
            .post_message(&value)
            .map_err(|_| HostError::ChannelClosed)
    }
}

fn decode_message(message: &JsValue) -> Option<CommandEnvelope> {
    let json = js_sys::JSON::stringify(message).ok()?.as_string()?;
    decode_envelope(&json)
}

pub(crate) fn decode_envelope(json: &str) -> Option<CommandEnvelope> {
    match CommandEnvelope::from_json(json) {
        Ok(envelope) => Some(envelope),
        Err(err) => {
            log::debug!("Dropping malformed message: {err}");
            None
        }
    }
}
