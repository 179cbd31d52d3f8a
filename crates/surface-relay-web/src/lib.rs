//! Content-script binding: tracks focus in the page and serves every
//! extension port that connects to it.
//!
//! One [`SessionContext`] exists per document. Each connected port gets its
//! own [`SessionRouter`] sharing that context, fed by the port's inbound
//! message stream.

pub mod host;
pub mod port;
pub mod surface;

use anyhow::{Context, Result, anyhow};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlElement};

use surface_relay_config::{Config, InjectionConfig};
use surface_relay_engine::{InjectionEngine, SessionContext, SessionRouter};

pub use host::WebHost;
pub use port::{ChromePort, RuntimePort};
pub use surface::DomSurface;

const DEFAULT_CONFIG: &str = include_str!("../relay.toml");

pub fn bundled_config() -> Result<Config> {
    Config::from_toml_str(DEFAULT_CONFIG).context("Bundled relay.toml is invalid")
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    bootstrap().map_err(|err| JsValue::from_str(&format!("{err:#}")))
}

fn bootstrap() -> Result<()> {
    let config = bundled_config()?;
    if let Some(level) = config.level_filter()?.to_level() {
        console_log::init_with_level(level).map_err(|err| anyhow!("{err}"))?;
    }

    let host = WebHost::new()?;
    let context = Rc::new(SessionContext::new(config.clone()));
    log::debug!("Content script ready, session {}", context.id());

    install_focus_listener(&host, context.clone())?;
    install_connect_listener(host, context, config.injection)?;
    Ok(())
}

/// Capture-phase focus listener on the window: every focus in the document
/// reaches the tracker, including focus on elements that stop propagation.
fn install_focus_listener(host: &WebHost, context: Rc<SessionContext<DomSurface>>) -> Result<()> {
    let on_focus = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(element) = event
            .target()
            .and_then(|target| target.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        context.on_focus(DomSurface::new(element));
    });
    host.window()
        .add_event_listener_with_callback_and_bool("focus", on_focus.as_ref().unchecked_ref(), true)
        .map_err(|err| anyhow!("Failed to install focus listener: {err:?}"))?;
    on_focus.forget();
    Ok(())
}

fn install_connect_listener(
    host: WebHost,
    context: Rc<SessionContext<DomSurface>>,
    injection: InjectionConfig,
) -> Result<()> {
    let on_connect = Closure::<dyn FnMut(RuntimePort)>::new(move |runtime_port: RuntimePort| {
        let port = ChromePort::new(runtime_port);
        let inbound = port.inbound();
        let router = SessionRouter::new(
            context.clone(),
            host.clone(),
            port,
            InjectionEngine::new(injection.clone()),
        );
        log::debug!("Port connected to session {}", context.id());
        wasm_bindgen_futures::spawn_local(async move {
            router.run(inbound).await;
        });
    });
    port::add_connect_listener(on_connect.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Extension runtime is not available: {err:?}"))?;
    on_connect.forget();
    Ok(())
}
