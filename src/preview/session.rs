use crate::page::{CardRef, OverlayId, Ticket, TimerHandle};

use super::overlay::{OverlayHandle, Retired};

/// Where the current hover attempt stands
#[derive(Debug, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Delay timer armed after pointer-enter
    Pending {
        card: CardRef,
        timer: TimerHandle,
        attempt: u64,
    },
    /// Trailer lookup in flight
    Fetching { card: CardRef, ticket: Ticket },
    /// Overlay mounted and playing (or about to)
    Active(OverlayHandle),
}

/// Page-lifetime hover state, mutated only by the controller
#[derive(Debug, Default)]
pub struct HoverSession {
    pub phase: Phase,

    /// Set briefly after a click so navigation completes without a preview
    pub transient_lock: bool,
    pub lock_timer: Option<TimerHandle>,

    /// Previous overlay still fading out
    pub retiring: Option<Retired>,

    pub resize_watched: bool,

    pub blur: BlurState,

    next_id: u64,
}

/// Background blur layer lifecycle
#[derive(Debug, Default)]
pub struct BlurState {
    pub shown: bool,
    pub removal: Option<TimerHandle>,
}

impl HoverSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic counter shared by attempts, tickets and overlay ids
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// The card the current attempt is about, if any
    pub fn active_card(&self) -> Option<&CardRef> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Pending { card, .. } | Phase::Fetching { card, .. } => Some(card),
            Phase::Active(overlay) => Some(&overlay.card),
        }
    }

    pub fn active_overlay(&self) -> Option<&OverlayHandle> {
        match &self.phase {
            Phase::Active(overlay) => Some(overlay),
            _ => None,
        }
    }

    /// Mutable access to the active overlay when it matches `id`
    pub fn overlay_mut(&mut self, id: OverlayId) -> Option<&mut OverlayHandle> {
        match &mut self.phase {
            Phase::Active(overlay) if overlay.id == id => Some(overlay),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Name of the current state, for logging
    pub fn phase_name(&self) -> &'static str {
        match self.phase {
            Phase::Idle => "idle",
            Phase::Pending { .. } => "pending",
            Phase::Fetching { .. } => "fetching",
            Phase::Active(_) => "active",
        }
    }
}
