//! Browser entry point
//!
//! Reads the server-injected configuration, wires a [`WebPage`] to the
//! engine and routes every DOM callback back through one [`Dispatcher`].

mod page;

use anyhow::{Context, Result, anyhow};
use gloo::events::EventListener;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{Level as TraceLevel, debug, error, info, warn};
use wasm_bindgen::prelude::*;

use crate::config::ConfigSnapshot;
use crate::constants::markup::CONFIG_GLOBAL;
use crate::page::{PageEvent, document_parsed};
use crate::preview::HoverTrailer;

use page::WebPage;

struct Shared {
    queue: RefCell<VecDeque<PageEvent>>,
    app: RefCell<Option<(WebPage, HoverTrailer)>>,
}

/// Hands DOM callbacks to the engine one at a time.
///
/// Events raised while the engine is already running (a synchronous DOM
/// callback, for instance) are queued and drained by the outer call.
#[derive(Clone)]
pub(crate) struct Dispatcher(Rc<Shared>);

impl Dispatcher {
    fn new() -> Self {
        Self(Rc::new(Shared {
            queue: RefCell::new(VecDeque::new()),
            app: RefCell::new(None),
        }))
    }

    fn install(&self, page: WebPage, app: HoverTrailer) {
        *self.0.app.borrow_mut() = Some((page, app));
        self.drain();
    }

    pub(crate) fn dispatch(&self, event: PageEvent) {
        self.0.queue.borrow_mut().push_back(event);
        self.drain();
    }

    fn drain(&self) {
        let Ok(mut slot) = self.0.app.try_borrow_mut() else {
            return;
        };
        let Some((page, app)) = slot.as_mut() else {
            return;
        };
        loop {
            let next = self.0.queue.borrow_mut().pop_front();
            let Some(event) = next else { break };
            app.handle_event(page, event);
        }
    }
}

fn read_config(window: &web_sys::Window) -> Result<Option<ConfigSnapshot>> {
    let value = js_sys::Reflect::get(window, &JsValue::from_str(CONFIG_GLOBAL))
        .map_err(|e| anyhow!("{e:?}"))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    let json: String = js_sys::JSON::stringify(&value)
        .map_err(|e| anyhow!("{e:?}"))?
        .into();
    let snapshot = serde_json::from_str(&json).context("Malformed client configuration")?;
    Ok(Some(snapshot))
}

fn init_tracing(debug: bool) {
    let level = if debug { TraceLevel::DEBUG } else { TraceLevel::WARN };
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(level)
            .build(),
    );
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let Some(window) = web_sys::window() else {
        return;
    };
    let loaded = read_config(&window);
    init_tracing(loaded.as_ref().is_ok_and(|c| c.as_ref().is_some_and(|c| c.debug_logging)));

    let config = match loaded {
        Ok(Some(config)) => config,
        Ok(None) => {
            info!(global = CONFIG_GLOBAL, "No client configuration published, using defaults");
            ConfigSnapshot::default()
        }
        Err(e) => {
            warn!(error = %e, "Ignoring client configuration, using defaults");
            ConfigSnapshot::default()
        }
    };

    let Some(document) = window.document() else {
        return;
    };
    if document_parsed(&document.ready_state()) {
        launch(window, config);
    } else {
        debug!("Document still loading, deferring start");
        EventListener::once(&document, "DOMContentLoaded", move |_| launch(window, config))
            .forget();
    }
}

fn launch(window: web_sys::Window, config: ConfigSnapshot) {
    if let Err(e) = run(window, config) {
        error!(error = ?e, "Failed to start hover trailer");
    }
}

fn run(window: web_sys::Window, config: ConfigSnapshot) -> Result<(), JsValue> {
    let dispatcher = Dispatcher::new();
    let mut page = WebPage::new(window, dispatcher.clone())?;
    let mut app = HoverTrailer::new(config);
    app.start(&mut page);
    page.observe_mutations()?;
    dispatcher.install(page, app);
    Ok(())
}
