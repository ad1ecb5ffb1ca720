//! Recording page used by unit tests

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::CardMarkup;
use crate::page::{
    CardKey, CardRef, FoundCard, OverlayId, OverlaySpec, Page, Ticket, Timer, TimerHandle,
};
use crate::trailer::{TrailerDescriptor, TrailerType};
use crate::types::{Geometry, Rect, Viewport};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Bind(CardRef),
    Mount(OverlaySpec),
    ApplyGeometry(OverlayId, Geometry),
    SetOpacity(OverlayId, f64),
    FadeOut(OverlayId),
    Remove(OverlayId),
    PlayVideo(OverlayId, bool),
    StopMedia(OverlayId),
    PostCommand(OverlayId, String),
    ShowBlur,
    HideBlur,
    RemoveBlur,
}

#[derive(Debug, Clone)]
struct FakeCard {
    type_marker: Option<String>,
    item_id: Option<String>,
    bounds: Rect,
}

#[derive(Debug)]
pub struct FakePage {
    pub viewport: Viewport,
    pub calls: Vec<Call>,
    pub requests: Vec<(String, Ticket)>,
    pub bound: Vec<CardRef>,
    pub resize_watched: bool,
    pub blur_present: bool,
    pub blur_visible: bool,
    pub max_live_overlays: usize,
    cards: BTreeMap<CardKey, FakeCard>,
    timers: Vec<(TimerHandle, Duration, Timer)>,
    live: Vec<OverlayId>,
    next_timer: u64,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(1920.0, 1080.0),
            calls: Vec::new(),
            requests: Vec::new(),
            bound: Vec::new(),
            resize_watched: false,
            blur_present: false,
            blur_visible: false,
            max_live_overlays: 0,
            cards: BTreeMap::new(),
            timers: Vec::new(),
            live: Vec::new(),
            next_timer: 0,
        }
    }

    pub fn add_card(&mut self, key: CardKey, type_marker: &str, item_id: Option<&str>, bounds: Rect) {
        self.cards.insert(
            key,
            FakeCard {
                type_marker: Some(type_marker.to_string()),
                item_id: item_id.map(str::to_string),
                bounds,
            },
        );
    }

    pub fn move_card(&mut self, key: CardKey, bounds: Rect) {
        if let Some(card) = self.cards.get_mut(&key) {
            card.bounds = bounds;
        }
    }

    pub fn remove_card(&mut self, key: CardKey) {
        self.cards.remove(&key);
    }

    /// Timers armed and not yet cleared or taken, in arming order
    pub fn pending_timers(&self) -> Vec<Timer> {
        self.timers.iter().map(|(_, _, timer)| timer.clone()).collect()
    }

    pub fn timer_delay(&self, wanted: &Timer) -> Option<Duration> {
        self.timers
            .iter()
            .find(|(_, _, timer)| timer == wanted)
            .map(|(_, delay, _)| *delay)
    }

    /// Remove the oldest pending timer, as if it fired
    pub fn take_next_timer(&mut self) -> Option<Timer> {
        (!self.timers.is_empty()).then(|| self.timers.remove(0).2)
    }

    /// Remove the oldest pending hover timer and return its attempt number
    pub fn take_hover_attempt(&mut self) -> Option<u64> {
        let index = self
            .timers
            .iter()
            .position(|(_, _, timer)| matches!(timer, Timer::HoverDelay { .. }))?;
        match self.timers.remove(index).2 {
            Timer::HoverDelay { attempt, .. } => Some(attempt),
            _ => None,
        }
    }

    pub fn last_request(&self) -> Option<(String, Ticket)> {
        self.requests.last().cloned()
    }

    pub fn live_overlays(&self) -> Vec<OverlayId> {
        self.live.clone()
    }

    pub fn mounted(&self, id: OverlayId) -> Option<&OverlaySpec> {
        self.calls.iter().find_map(|call| match call {
            Call::Mount(spec) if spec.id == id => Some(spec),
            _ => None,
        })
    }
}

impl Page for FakePage {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn card_bounds(&self, card: &CardRef) -> Option<Rect> {
        self.cards.get(&card.key).map(|c| c.bounds)
    }

    fn find_cards(&mut self, _markup: &CardMarkup) -> Vec<FoundCard> {
        self.cards
            .iter()
            .map(|(key, card)| FoundCard {
                key: *key,
                type_marker: card.type_marker.clone(),
                item_id: card.item_id.clone(),
            })
            .collect()
    }

    fn bind_card(&mut self, card: &CardRef) {
        self.bound.push(card.clone());
        self.calls.push(Call::Bind(card.clone()));
    }

    fn set_timer(&mut self, delay: Duration, timer: Timer) -> TimerHandle {
        self.next_timer += 1;
        let handle = TimerHandle(self.next_timer);
        self.timers.push((handle, delay, timer));
        handle
    }

    fn clear_timer(&mut self, handle: TimerHandle) {
        self.timers.retain(|(h, _, _)| *h != handle);
    }

    fn request_trailer(&mut self, url: &str, ticket: Ticket) {
        self.requests.push((url.to_string(), ticket));
    }

    fn mount_overlay(&mut self, spec: &OverlaySpec) {
        self.live.push(spec.id);
        self.max_live_overlays = self.max_live_overlays.max(self.live.len());
        self.calls.push(Call::Mount(spec.clone()));
    }

    fn apply_geometry(&mut self, overlay: OverlayId, geometry: Geometry) {
        self.calls.push(Call::ApplyGeometry(overlay, geometry));
    }

    fn set_opacity(&mut self, overlay: OverlayId, opacity: f64) {
        self.calls.push(Call::SetOpacity(overlay, opacity));
    }

    fn start_fade_out(&mut self, overlay: OverlayId) {
        self.calls.push(Call::FadeOut(overlay));
    }

    fn remove_overlay(&mut self, overlay: OverlayId) {
        self.live.retain(|id| *id != overlay);
        self.calls.push(Call::Remove(overlay));
    }

    fn play_video(&mut self, overlay: OverlayId, muted: bool) {
        self.calls.push(Call::PlayVideo(overlay, muted));
    }

    fn stop_media(&mut self, overlay: OverlayId) {
        self.calls.push(Call::StopMedia(overlay));
    }

    fn post_player_command(&mut self, overlay: OverlayId, message: &str) {
        self.calls.push(Call::PostCommand(overlay, message.to_string()));
    }

    fn show_blur(&mut self) {
        self.blur_present = true;
        self.blur_visible = true;
        self.calls.push(Call::ShowBlur);
    }

    fn hide_blur(&mut self) {
        self.blur_visible = false;
        self.calls.push(Call::HideBlur);
    }

    fn remove_blur(&mut self) {
        self.blur_present = false;
        self.calls.push(Call::RemoveBlur);
    }

    fn watch_resize(&mut self, enabled: bool) {
        self.resize_watched = enabled;
    }
}

pub fn local_trailer(id: &str) -> TrailerDescriptor {
    TrailerDescriptor {
        id: id.to_string(),
        name: format!("{id} trailer"),
        path: format!("/media/trailers/{id}.mp4"),
        run_time_ticks: Some(1_200_000_000),
        has_subtitles: false,
        trailer_type: TrailerType::Local,
        is_remote: false,
        source: "Local".to_string(),
    }
}

pub fn remote_trailer(url: &str) -> TrailerDescriptor {
    TrailerDescriptor {
        id: "remote".to_string(),
        name: "Remote trailer".to_string(),
        path: url.to_string(),
        run_time_ticks: None,
        has_subtitles: false,
        trailer_type: TrailerType::Remote,
        is_remote: true,
        source: "Remote".to_string(),
    }
}
