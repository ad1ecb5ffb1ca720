//! Hover session controller
//!
//! Drives the Idle → Pending → Fetching → Active → Idle cycle. Every
//! continuation (timer, lookup, media event) checks that it still belongs to
//! the current attempt before touching the session or the page; stale ones
//! are dropped with a debug log.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ConfigSnapshot;
use crate::constants::timing;
use crate::error::ResolveError;
use crate::page::{CardRef, OverlayId, Page, Ticket, Timer};
use crate::trailer::TrailerDescriptor;

use super::overlay::OverlayHandle;
use super::session::{HoverSession, Phase};

#[derive(Debug)]
pub struct HoverController {
    config: ConfigSnapshot,
    session: HoverSession,
}

impl HoverController {
    pub fn new(config: ConfigSnapshot) -> Self {
        Self {
            config,
            session: HoverSession::new(),
        }
    }

    pub fn config(&self) -> &ConfigSnapshot {
        &self.config
    }

    pub fn session(&self) -> &HoverSession {
        &self.session
    }

    pub fn pointer_enter<P: Page>(&mut self, page: &mut P, card: CardRef) {
        let rearm = match &self.session.phase {
            Phase::Idle => false,
            Phase::Pending { card: pending, .. } if *pending == card => return,
            // Missed leave for the previous card, re-arm for this one
            Phase::Pending { .. } => true,
            Phase::Fetching { .. } | Phase::Active(_) => {
                debug!(card = %card, phase = self.session.phase_name(), "Hover ignored, preview in progress");
                return;
            }
        };
        if rearm && let Phase::Pending { timer, .. } = std::mem::take(&mut self.session.phase) {
            page.clear_timer(timer);
        }

        let attempt = self.session.next_id();
        let timer = page.set_timer(
            self.config.hover_delay(),
            Timer::HoverDelay {
                card: card.clone(),
                attempt,
            },
        );
        debug!(card = %card, attempt, delay_ms = self.config.hover_delay_ms, "Hover delay armed");
        self.session.phase = Phase::Pending {
            card,
            timer,
            attempt,
        };
    }

    pub fn pointer_leave<P: Page>(&mut self, page: &mut P, card: &CardRef) {
        if self.session.active_card() != Some(card) {
            return;
        }
        match std::mem::take(&mut self.session.phase) {
            Phase::Pending { timer, .. } => {
                page.clear_timer(timer);
                debug!(card = %card, "Hover cancelled before delay elapsed");
            }
            Phase::Fetching { ticket, .. } => {
                debug!(card = %card, ticket = ticket.0, "Left card during lookup, result will be dropped");
            }
            Phase::Active(overlay) => {
                self.session.phase = Phase::Active(overlay);
                self.teardown(page);
            }
            Phase::Idle => {}
        }
    }

    /// A click starts navigation: tear everything down and lock out previews
    pub fn click<P: Page>(&mut self, page: &mut P, card: &CardRef) {
        info!(card = %card, "Card clicked, suppressing previews");
        self.session.transient_lock = true;
        if let Some(handle) = self.session.lock_timer.take() {
            page.clear_timer(handle);
        }
        self.session.lock_timer = Some(page.set_timer(
            Duration::from_millis(timing::CLICK_LOCK_MS),
            Timer::ClickLock,
        ));
        self.cancel(page);
    }

    pub fn on_lock_expired(&mut self) {
        self.session.transient_lock = false;
        self.session.lock_timer = None;
        debug!("Click lock released");
    }

    pub fn on_hover_delay<P: Page>(&mut self, page: &mut P, attempt: u64) {
        let card = match std::mem::take(&mut self.session.phase) {
            Phase::Pending {
                card,
                attempt: current,
                ..
            } if current == attempt => card,
            other => {
                self.session.phase = other;
                debug!(attempt, "Dropping stale hover timer");
                return;
            }
        };

        if self.session.transient_lock || self.session.active_overlay().is_some() {
            debug!(card = %card, "Hover delay elapsed while locked, ignoring");
            return;
        }

        let ticket = Ticket(self.session.next_id());
        let url = self.config.trailer_info_url(&card.item_id);
        debug!(card = %card, ticket = ticket.0, url = %url, "Requesting trailer info");
        page.request_trailer(&url, ticket);
        self.session.phase = Phase::Fetching { card, ticket };
    }

    pub fn on_trailer_resolved<P: Page>(
        &mut self,
        page: &mut P,
        ticket: Ticket,
        result: Result<TrailerDescriptor, ResolveError>,
    ) {
        let card = match std::mem::take(&mut self.session.phase) {
            Phase::Fetching {
                card,
                ticket: current,
            } if current == ticket => card,
            other => {
                self.session.phase = other;
                debug!(ticket = ticket.0, "Discarding stale trailer lookup");
                return;
            }
        };

        if self.session.transient_lock {
            debug!(card = %card, "Lookup finished while locked, ignoring");
            return;
        }

        let trailer = match result {
            Ok(trailer) => trailer,
            Err(e) => {
                debug!(card = %card, error = %e, "No preview for card");
                return;
            }
        };

        let Some(bounds) = page.card_bounds(&card) else {
            debug!(card = %card, "Card left the document before render");
            return;
        };

        // Only one overlay subtree may exist at any time
        self.flush_retiring(page);

        let id = OverlayId(self.session.next_id());
        match OverlayHandle::render(page, &self.config, id, &trailer, card, bounds) {
            Ok(overlay) => {
                self.session.phase = Phase::Active(overlay);
                if !self.session.resize_watched {
                    page.watch_resize(true);
                    self.session.resize_watched = true;
                }
            }
            Err(e) => warn!(trailer = %trailer.name, error = %e, "Cannot render trailer preview"),
        }
    }

    pub fn on_media_ready<P: Page>(&mut self, page: &mut P, id: OverlayId) {
        let Some(overlay) = self.session.overlay_mut(id) else {
            debug!(overlay = id.0, "Media ready for stale overlay");
            return;
        };
        if overlay.on_media_ready(page, &self.config) {
            self.show_blur(page);
        }
    }

    pub fn on_metadata<P: Page>(&mut self, page: &mut P, id: OverlayId, aspect_ratio: f64) {
        let Some(overlay) = self.session.overlay_mut(id) else {
            return;
        };
        let bounds = page.card_bounds(&overlay.card);
        overlay.on_metadata(page, aspect_ratio, bounds, &self.config);
    }

    pub fn on_playback_rejected<P: Page>(&mut self, page: &mut P, id: OverlayId) {
        if let Some(overlay) = self.session.overlay_mut(id) {
            overlay.on_playback_rejected(page);
        }
    }

    pub fn on_frame_loaded<P: Page>(&mut self, page: &mut P, id: OverlayId) {
        if let Some(overlay) = self.session.overlay_mut(id) {
            overlay.on_frame_loaded(page, &self.config);
        }
    }

    pub fn on_remote_reveal<P: Page>(&mut self, page: &mut P, id: OverlayId) {
        let Some(overlay) = self.session.overlay_mut(id) else {
            return;
        };
        if overlay.on_remote_reveal(page, &self.config) {
            self.show_blur(page);
        }
    }

    /// Fade-out finished for a torn-down overlay
    pub fn on_overlay_removal<P: Page>(&mut self, page: &mut P, id: OverlayId) {
        match self.session.retiring {
            Some(retired) if retired.id == id => {
                self.session.retiring = None;
                page.remove_overlay(id);
            }
            _ => debug!(overlay = id.0, "Overlay already removed"),
        }
    }

    pub fn on_blur_removal<P: Page>(&mut self, page: &mut P) {
        self.session.blur.removal = None;
        if !self.session.blur.shown {
            page.remove_blur();
        }
    }

    pub fn on_resize<P: Page>(&mut self, page: &mut P) {
        let card_gone = match &mut self.session.phase {
            Phase::Active(overlay) => match page.card_bounds(&overlay.card) {
                Some(bounds) => {
                    overlay.refresh_geometry(page, bounds, &self.config);
                    false
                }
                None => true,
            },
            _ => false,
        };
        if card_gone {
            debug!("Hovered card left the document, closing preview");
            self.teardown(page);
        }
    }

    /// Abandon whatever the current attempt is doing
    fn cancel<P: Page>(&mut self, page: &mut P) {
        match std::mem::take(&mut self.session.phase) {
            Phase::Pending { timer, .. } => page.clear_timer(timer),
            Phase::Active(overlay) => {
                self.session.phase = Phase::Active(overlay);
                self.teardown(page);
            }
            Phase::Fetching { .. } | Phase::Idle => {}
        }
    }

    /// Tear down the active overlay. References are cleared immediately, the
    /// DOM node goes away after the fade.
    fn teardown<P: Page>(&mut self, page: &mut P) {
        let mut overlay = match std::mem::take(&mut self.session.phase) {
            Phase::Active(overlay) => overlay,
            other => {
                self.session.phase = other;
                return;
            }
        };

        if let Some(retired) = overlay.teardown(page) {
            self.flush_retiring(page);
            self.session.retiring = Some(retired);
        }
        if self.session.resize_watched {
            page.watch_resize(false);
            self.session.resize_watched = false;
        }
        self.hide_blur(page);
        info!(overlay = overlay.id.0, card = %overlay.card, "Preview closed");
    }

    /// Remove a still-fading overlay right away
    fn flush_retiring<P: Page>(&mut self, page: &mut P) {
        if let Some(retired) = self.session.retiring.take() {
            page.clear_timer(retired.removal);
            page.remove_overlay(retired.id);
        }
    }

    fn show_blur<P: Page>(&mut self, page: &mut P) {
        if !self.config.enable_background_blur {
            return;
        }
        if let Some(handle) = self.session.blur.removal.take() {
            page.clear_timer(handle);
        }
        page.show_blur();
        self.session.blur.shown = true;
    }

    fn hide_blur<P: Page>(&mut self, page: &mut P) {
        if !self.session.blur.shown {
            return;
        }
        self.session.blur.shown = false;
        page.hide_blur();
        if let Some(handle) = self.session.blur.removal.take() {
            page.clear_timer(handle);
        }
        self.session.blur.removal = Some(page.set_timer(
            Duration::from_millis(timing::FADE_OUT_MS),
            Timer::RemoveBlur,
        ));
    }
}
