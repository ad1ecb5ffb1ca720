//! Card discovery: scan the document for movie cards and bind them once

use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::CardMarkup;
use crate::constants::timing;
use crate::page::{CardKey, CardRef, Page, Timer, TimerHandle};

#[derive(Debug, Default)]
pub struct CardWatcher {
    /// Cards that already carry hover listeners
    registry: HashSet<CardKey>,
    debounce: Option<TimerHandle>,
}

impl CardWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound_count(&self) -> usize {
        self.registry.len()
    }

    /// Bind every eligible card not seen before; returns how many were bound
    pub fn scan<P: Page>(&mut self, page: &mut P, markup: &CardMarkup) -> usize {
        let mut bound = 0;
        for found in page.find_cards(markup) {
            if found.type_marker.as_deref() != Some(markup.type_value.as_str()) {
                continue;
            }
            let Some(item_id) = found.item_id.filter(|id| !id.is_empty()) else {
                trace!(key = found.key.0, "Card without item id, skipping");
                continue;
            };
            if !self.registry.insert(found.key) {
                continue;
            }
            page.bind_card(&CardRef::new(found.key, item_id));
            bound += 1;
        }
        if bound > 0 {
            debug!(bound, total = self.registry.len(), "Bound hover listeners to new cards");
        }
        bound
    }

    /// The document changed; re-scan once it has been quiet for a while
    pub fn on_mutation<P: Page>(&mut self, page: &mut P) {
        if let Some(handle) = self.debounce.take() {
            page.clear_timer(handle);
        }
        self.debounce = Some(page.set_timer(
            Duration::from_millis(timing::SCAN_DEBOUNCE_MS),
            Timer::ScanDebounce,
        ));
    }

    pub fn on_debounce<P: Page>(&mut self, page: &mut P, markup: &CardMarkup) -> usize {
        self.debounce = None;
        self.scan(page, markup)
    }
}
