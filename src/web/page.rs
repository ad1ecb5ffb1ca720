use gloo::events::EventListener;
use gloo::net::http::Request;
use gloo::timers::callback::Timeout;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, HtmlElement, HtmlIFrameElement, HtmlVideoElement, MutationObserver,
    MutationObserverInit, Window,
};

use crate::config::CardMarkup;
use crate::constants::{markup, media, remote, style, timing};
use crate::error::ResolveError;
use crate::page::{
    CardKey, CardRef, FoundCard, MediaSource, OverlayId, OverlaySpec, Page, PageEvent, Ticket,
    Timer, TimerHandle,
};
use crate::trailer::TrailerDescriptor;
use crate::types::{Geometry, Rect, Viewport};

use super::Dispatcher;

enum Media {
    Video(HtmlVideoElement),
    Frame(HtmlIFrameElement),
}

struct MountedOverlay {
    container: HtmlElement,
    media: Media,
    _listeners: Vec<EventListener>,
}

/// [`Page`] backed by the live document
pub(crate) struct WebPage {
    window: Window,
    document: Document,
    body: HtmlElement,
    dispatcher: Dispatcher,

    cards: HashMap<CardKey, Element>,
    card_listeners: Vec<EventListener>,
    next_card: u64,

    timers: HashMap<TimerHandle, Timeout>,
    fired: Rc<RefCell<Vec<TimerHandle>>>,
    next_timer: u64,

    overlays: HashMap<OverlayId, MountedOverlay>,
    blur: Option<HtmlElement>,
    resize: Option<EventListener>,
    _mutations: Option<(MutationObserver, Closure<dyn FnMut(js_sys::Array, MutationObserver)>)>,
}

fn set_styles(element: &HtmlElement, styles: &[(&str, &str)]) -> Result<(), JsValue> {
    let css = element.style();
    for (name, value) in styles {
        css.set_property(name, value)?;
    }
    Ok(())
}

fn px(value: impl std::fmt::Display) -> String {
    format!("{value}px")
}

async fn fetch_trailer(url: &str) -> Result<TrailerDescriptor, ResolveError> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(|e| ResolveError::Transport(e.to_string()))?;
    match response.status() {
        404 => return Err(ResolveError::NotFound(url.to_string())),
        status if !response.ok() => return Err(ResolveError::Status(status)),
        _ => {}
    }
    response
        .json::<TrailerDescriptor>()
        .await
        .map_err(|e| ResolveError::Payload(e.to_string()))
}

impl WebPage {
    pub fn new(window: Window, dispatcher: Dispatcher) -> Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("no document body"))?;
        Ok(Self {
            window,
            document,
            body,
            dispatcher,
            cards: HashMap::new(),
            card_listeners: Vec::new(),
            next_card: 0,
            timers: HashMap::new(),
            fired: Rc::new(RefCell::new(Vec::new())),
            next_timer: 0,
            overlays: HashMap::new(),
            blur: None,
            resize: None,
            _mutations: None,
        })
    }

    /// Report subtree changes of the body as [`PageEvent::DomMutated`]
    pub fn observe_mutations(&mut self) -> Result<(), JsValue> {
        let dispatcher = self.dispatcher.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |_records: js_sys::Array, _observer: MutationObserver| {
                dispatcher.dispatch(PageEvent::DomMutated);
            },
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(&self.body, &init)?;
        self._mutations = Some((observer, callback));
        Ok(())
    }

    /// Stable key for a card element, stamping a new one on first sight
    fn key_for(&mut self, element: &Element) -> CardKey {
        if let Some(raw) = element.get_attribute(markup::KEY_ATTRIBUTE)
            && let Ok(value) = raw.parse::<u64>()
            && self
                .cards
                .get(&CardKey(value))
                .is_some_and(|known| known.is_same_node(Some(element)))
        {
            return CardKey(value);
        }
        // Unknown, or a clone carrying another card's stamp
        self.next_card += 1;
        let key = CardKey(self.next_card);
        if let Err(e) = element.set_attribute(markup::KEY_ATTRIBUTE, &key.0.to_string()) {
            warn!(error = ?e, "Cannot stamp card element");
        }
        self.cards.insert(key, element.clone());
        key
    }

    fn prune_fired(&mut self) {
        for handle in self.fired.borrow_mut().drain(..) {
            self.timers.remove(&handle);
        }
    }

    fn overlay(&self, id: OverlayId) -> Option<&MountedOverlay> {
        let overlay = self.overlays.get(&id);
        if overlay.is_none() {
            debug!(overlay = id.0, "No mounted overlay");
        }
        overlay
    }

    fn build_overlay(&self, spec: &OverlaySpec) -> Result<MountedOverlay, JsValue> {
        let container: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        container.set_class_name("hover-trailer-overlay");
        set_styles(
            &container,
            &[
                ("position", "fixed"),
                ("z-index", &style::OVERLAY_Z_INDEX.to_string()),
                ("pointer-events", "none"),
                ("overflow", "hidden"),
                ("background", "#000"),
                ("border-radius", &px(spec.border_radius)),
                ("opacity", "0"),
                ("transition", &format!("opacity {}ms ease", timing::FADE_OUT_MS)),
            ],
        )?;
        apply_geometry(&container, spec.geometry)?;

        let id = spec.id;
        let mut listeners = Vec::new();
        let media = match &spec.media {
            MediaSource::Video { src, muted, volume } => {
                let video: HtmlVideoElement = self.document.create_element("video")?.dyn_into()?;
                video.set_src(src);
                video.set_muted(*muted);
                video.set_volume(*volume);
                video.set_loop(true);
                video.set_autoplay(false);
                video.set_attribute("playsinline", "")?;
                video.set_attribute("preload", "auto")?;
                set_styles(
                    &video,
                    &[("width", "100%"), ("height", "100%"), ("object-fit", "cover")],
                )?;

                let dispatcher = self.dispatcher.clone();
                listeners.push(EventListener::new(&video, media::READY_EVENT, move |_| {
                    dispatcher.dispatch(PageEvent::MediaReady(id));
                }));
                let dispatcher = self.dispatcher.clone();
                let probe = video.clone();
                listeners.push(EventListener::new(&video, media::METADATA_EVENT, move |_| {
                    let (width, height) = (probe.video_width(), probe.video_height());
                    if width > 0 && height > 0 {
                        dispatcher.dispatch(PageEvent::MetadataLoaded {
                            overlay: id,
                            aspect_ratio: width as f64 / height as f64,
                        });
                    }
                }));
                container.append_child(&video)?;
                Media::Video(video)
            }
            MediaSource::Frame { src } => {
                let frame: HtmlIFrameElement = self.document.create_element("iframe")?.dyn_into()?;
                frame.set_src(src);
                frame.set_attribute("allow", "autoplay; encrypted-media")?;
                frame.set_attribute("frameborder", "0")?;
                set_styles(&frame, &[("width", "100%"), ("height", "100%"), ("border", "0")])?;

                let dispatcher = self.dispatcher.clone();
                listeners.push(EventListener::new(&frame, "load", move |_| {
                    dispatcher.dispatch(PageEvent::FrameLoaded(id));
                }));
                container.append_child(&frame)?;
                Media::Frame(frame)
            }
        };

        Ok(MountedOverlay {
            container,
            media,
            _listeners: listeners,
        })
    }

    fn build_blur(&self) -> Result<HtmlElement, JsValue> {
        let layer: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        layer.set_class_name("hover-trailer-blur");
        let filter = format!("blur({}px)", style::BLUR_RADIUS_PX);
        set_styles(
            &layer,
            &[
                ("position", "fixed"),
                ("inset", "0"),
                ("z-index", &style::BLUR_Z_INDEX.to_string()),
                ("pointer-events", "none"),
                ("background", style::BLUR_BACKGROUND),
                ("backdrop-filter", &filter),
                ("-webkit-backdrop-filter", &filter),
                ("opacity", "0"),
                ("transition", &format!("opacity {}ms ease", timing::FADE_OUT_MS)),
            ],
        )?;
        self.body.append_child(&layer)?;
        Ok(layer)
    }
}

fn apply_geometry(element: &HtmlElement, geometry: Geometry) -> Result<(), JsValue> {
    set_styles(
        element,
        &[
            ("left", &px(geometry.x)),
            ("top", &px(geometry.y)),
            ("width", &px(geometry.width)),
            ("height", &px(geometry.height)),
        ],
    )
}

fn log_failure(what: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        warn!(error = ?e, "{what} failed");
    }
}

impl Page for WebPage {
    fn viewport(&self) -> Viewport {
        let dimension = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn card_bounds(&self, card: &CardRef) -> Option<Rect> {
        let element = self.cards.get(&card.key)?;
        if !element.is_connected() {
            return None;
        }
        let rect = element.get_bounding_client_rect();
        Some(Rect::new(rect.left(), rect.top(), rect.width(), rect.height()))
    }

    fn find_cards(&mut self, markup: &CardMarkup) -> Vec<FoundCard> {
        let nodes = match self.document.query_selector_all(&markup.card_selector) {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(selector = %markup.card_selector, error = ?e, "Card query failed");
                return Vec::new();
            }
        };
        let mut found = Vec::new();
        for index in 0..nodes.length() {
            let Some(element) = nodes.item(index).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let key = self.key_for(&element);
            found.push(FoundCard {
                key,
                type_marker: element.get_attribute(&markup.type_attribute),
                item_id: element.get_attribute(&markup.id_attribute),
            });
        }
        found
    }

    fn bind_card(&mut self, card: &CardRef) {
        let Some(element) = self.cards.get(&card.key) else {
            return;
        };
        let events: [(&'static str, fn(CardRef) -> PageEvent); 3] = [
            ("mouseenter", PageEvent::PointerEnter),
            ("mouseleave", PageEvent::PointerLeave),
            ("click", PageEvent::Click),
        ];
        for (name, event) in events {
            let dispatcher = self.dispatcher.clone();
            let card = card.clone();
            self.card_listeners.push(EventListener::new(element, name, move |_| {
                dispatcher.dispatch(event(card.clone()));
            }));
        }
    }

    fn set_timer(&mut self, delay: Duration, timer: Timer) -> TimerHandle {
        self.prune_fired();
        self.next_timer += 1;
        let handle = TimerHandle(self.next_timer);
        let dispatcher = self.dispatcher.clone();
        let fired = Rc::clone(&self.fired);
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        let timeout = Timeout::new(millis, move || {
            dispatcher.dispatch(PageEvent::TimerFired(timer));
            // Dropped on a later prune, never from inside its own callback
            fired.borrow_mut().push(handle);
        });
        self.timers.insert(handle, timeout);
        handle
    }

    fn clear_timer(&mut self, handle: TimerHandle) {
        if let Some(timeout) = self.timers.remove(&handle) {
            timeout.cancel();
        }
    }

    fn request_trailer(&mut self, url: &str, ticket: Ticket) {
        let dispatcher = self.dispatcher.clone();
        let url = url.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            let result = fetch_trailer(&url).await;
            dispatcher.dispatch(PageEvent::TrailerResolved { ticket, result });
        });
    }

    fn mount_overlay(&mut self, spec: &OverlaySpec) {
        let mounted = self
            .build_overlay(spec)
            .and_then(|overlay| self.body.append_child(&overlay.container).map(|_| overlay));
        match mounted {
            Ok(overlay) => {
                self.overlays.insert(spec.id, overlay);
            }
            Err(e) => warn!(overlay = spec.id.0, error = ?e, "Cannot mount overlay"),
        }
    }

    fn apply_geometry(&mut self, overlay: OverlayId, geometry: Geometry) {
        if let Some(mounted) = self.overlay(overlay) {
            log_failure("Overlay positioning", apply_geometry(&mounted.container, geometry));
        }
    }

    fn set_opacity(&mut self, overlay: OverlayId, opacity: f64) {
        if let Some(mounted) = self.overlay(overlay) {
            log_failure(
                "Overlay reveal",
                set_styles(&mounted.container, &[("opacity", &opacity.to_string())]),
            );
        }
    }

    fn start_fade_out(&mut self, overlay: OverlayId) {
        if let Some(mounted) = self.overlay(overlay) {
            log_failure("Overlay fade-out", set_styles(&mounted.container, &[("opacity", "0")]));
        }
    }

    fn remove_overlay(&mut self, overlay: OverlayId) {
        if let Some(mounted) = self.overlays.remove(&overlay) {
            mounted.container.remove();
        }
    }

    fn play_video(&mut self, overlay: OverlayId, muted: bool) {
        let Some(MountedOverlay {
            media: Media::Video(video),
            ..
        }) = self.overlay(overlay)
        else {
            return;
        };
        video.set_muted(muted);
        let dispatcher = self.dispatcher.clone();
        match video.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                if JsFuture::from(promise).await.is_err() {
                    dispatcher.dispatch(PageEvent::PlaybackRejected(overlay));
                }
            }),
            Err(_) => dispatcher.dispatch(PageEvent::PlaybackRejected(overlay)),
        }
    }

    fn stop_media(&mut self, overlay: OverlayId) {
        let Some(mounted) = self.overlay(overlay) else {
            return;
        };
        match &mounted.media {
            Media::Video(video) => {
                log_failure("Pause", video.pause());
                video.remove_attribute("src").ok();
                video.load();
            }
            Media::Frame(frame) => frame.set_src(remote::BLANK_TARGET),
        }
    }

    fn post_player_command(&mut self, overlay: OverlayId, message: &str) {
        let Some(MountedOverlay {
            media: Media::Frame(frame),
            ..
        }) = self.overlay(overlay)
        else {
            return;
        };
        if let Some(player) = frame.content_window() {
            log_failure(
                "Player command",
                player.post_message(&JsValue::from_str(message), remote::PLAYER_ORIGIN),
            );
        }
    }

    fn show_blur(&mut self) {
        if self.blur.is_none() {
            match self.build_blur() {
                Ok(layer) => self.blur = Some(layer),
                Err(e) => {
                    warn!(error = ?e, "Cannot create blur layer");
                    return;
                }
            }
        }
        if let Some(layer) = &self.blur {
            log_failure("Blur reveal", set_styles(layer, &[("opacity", "1")]));
        }
    }

    fn hide_blur(&mut self) {
        if let Some(layer) = &self.blur {
            log_failure("Blur fade-out", set_styles(layer, &[("opacity", "0")]));
        }
    }

    fn remove_blur(&mut self) {
        if let Some(layer) = self.blur.take() {
            layer.remove();
        }
    }

    fn watch_resize(&mut self, enabled: bool) {
        if !enabled {
            self.resize = None;
            return;
        }
        if self.resize.is_none() {
            let dispatcher = self.dispatcher.clone();
            self.resize = Some(EventListener::new(&self.window, "resize", move |_| {
                dispatcher.dispatch(PageEvent::Resize);
            }));
        }
    }
}
