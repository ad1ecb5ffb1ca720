//! Hover preview engine: card discovery, the hover state machine and the
//! overlay lifecycle, all driven through [`crate::page::Page`].

mod controller;
mod event_handler;
pub mod geometry;
mod overlay;
mod session;
mod watcher;

pub use controller::HoverController;
pub use geometry::compute_geometry;
pub use overlay::{OverlayHandle, Retired};
pub use session::{HoverSession, Phase};
pub use watcher::CardWatcher;

use tracing::info;

use crate::config::ConfigSnapshot;
use crate::page::{Page, PageEvent};

use event_handler::handle_event;

/// One instance per page lifetime
#[derive(Debug)]
pub struct HoverTrailer {
    watcher: CardWatcher,
    controller: HoverController,
}

impl HoverTrailer {
    pub fn new(config: ConfigSnapshot) -> Self {
        Self {
            watcher: CardWatcher::new(),
            controller: HoverController::new(config),
        }
    }

    pub fn config(&self) -> &ConfigSnapshot {
        self.controller.config()
    }

    pub fn session(&self) -> &HoverSession {
        self.controller.session()
    }

    pub fn watcher(&self) -> &CardWatcher {
        &self.watcher
    }

    /// Initial scan; later cards are picked up from mutation events
    pub fn start<P: Page>(&mut self, page: &mut P) {
        let bound = self.watcher.scan(page, &self.controller.config().markup);
        info!(
            cards = bound,
            hover_delay_ms = self.config().hover_delay_ms,
            "Hover trailer started"
        );
    }

    pub fn handle_event<P: Page>(&mut self, page: &mut P, event: PageEvent) {
        handle_event(page, &mut self.watcher, &mut self.controller, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{CardKey, CardRef, Ticket, Timer};
    use crate::testing::{FakePage, local_trailer, remote_trailer};
    use crate::types::Rect;

    fn page_with_cards() -> FakePage {
        let mut page = FakePage::new();
        page.add_card(CardKey(1), "Movie", Some("m1"), Rect::new(100.0, 100.0, 200.0, 300.0));
        page.add_card(CardKey(2), "Movie", Some("m2"), Rect::new(400.0, 100.0, 200.0, 300.0));
        page
    }

    /// Fire pending timers oldest-first until none are left
    fn drain_timers(page: &mut FakePage, app: &mut HoverTrailer) {
        while let Some(timer) = page.take_next_timer() {
            app.handle_event(page, PageEvent::TimerFired(timer));
        }
    }

    fn fire_hover(page: &mut FakePage, app: &mut HoverTrailer) -> Ticket {
        let attempt = page.take_hover_attempt().expect("hover armed");
        app.handle_event(
            page,
            PageEvent::TimerFired(Timer::HoverDelay {
                card: CardRef::new(CardKey(0), ""),
                attempt,
            }),
        );
        page.last_request().expect("lookup started").1
    }

    #[test]
    fn test_start_binds_existing_cards() {
        let mut page = page_with_cards();
        let mut app = HoverTrailer::new(ConfigSnapshot::default());
        app.start(&mut page);
        assert_eq!(app.watcher().bound_count(), 2);
        assert_eq!(page.bound.len(), 2);
    }

    #[test]
    fn test_dom_mutation_binds_new_cards() {
        let mut page = page_with_cards();
        let mut app = HoverTrailer::new(ConfigSnapshot::default());
        app.start(&mut page);

        page.add_card(CardKey(3), "Movie", Some("m3"), Rect::new(0.0, 500.0, 200.0, 300.0));
        app.handle_event(&mut page, PageEvent::DomMutated);
        drain_timers(&mut page, &mut app);
        assert_eq!(app.watcher().bound_count(), 3);
    }

    #[test]
    fn test_hover_sequence_keeps_single_overlay() {
        let mut page = page_with_cards();
        let mut app = HoverTrailer::new(ConfigSnapshot::default());
        app.start(&mut page);
        let first = CardRef::new(CardKey(1), "m1");
        let second = CardRef::new(CardKey(2), "m2");

        for _ in 0..3 {
            for card in [&first, &second] {
                app.handle_event(&mut page, PageEvent::PointerEnter(card.clone()));
                let ticket = fire_hover(&mut page, &mut app);
                app.handle_event(
                    &mut page,
                    PageEvent::TrailerResolved {
                        ticket,
                        result: Ok(local_trailer(&card.item_id)),
                    },
                );
                app.handle_event(&mut page, PageEvent::PointerLeave(card.clone()));
            }
        }
        assert!(page.max_live_overlays <= 1);

        drain_timers(&mut page, &mut app);
        assert!(page.live_overlays().is_empty());
        assert!(app.session().is_idle());
    }

    #[test]
    fn test_quick_leave_reenter_drops_first_lookup() {
        let mut page = page_with_cards();
        let mut app = HoverTrailer::new(ConfigSnapshot::default());
        app.start(&mut page);
        let card = CardRef::new(CardKey(1), "m1");

        app.handle_event(&mut page, PageEvent::PointerEnter(card.clone()));
        let stale = fire_hover(&mut page, &mut app);
        app.handle_event(&mut page, PageEvent::PointerLeave(card.clone()));
        app.handle_event(&mut page, PageEvent::PointerEnter(card.clone()));
        let fresh = fire_hover(&mut page, &mut app);

        app.handle_event(
            &mut page,
            PageEvent::TrailerResolved {
                ticket: stale,
                result: Ok(local_trailer("stale")),
            },
        );
        assert!(page.live_overlays().is_empty());

        app.handle_event(
            &mut page,
            PageEvent::TrailerResolved {
                ticket: fresh,
                result: Ok(remote_trailer("https://youtu.be/abc123")),
            },
        );
        assert_eq!(page.live_overlays().len(), 1);
        assert!(app.session().active_overlay().is_some_and(|o| o.is_remote()));
    }

    #[test]
    fn test_click_lock_expires_through_timer() {
        let mut page = page_with_cards();
        let mut app = HoverTrailer::new(ConfigSnapshot::default());
        app.start(&mut page);
        let card = CardRef::new(CardKey(1), "m1");

        app.handle_event(&mut page, PageEvent::Click(card.clone()));
        assert!(app.session().transient_lock);
        drain_timers(&mut page, &mut app);
        assert!(!app.session().transient_lock);
    }
}
