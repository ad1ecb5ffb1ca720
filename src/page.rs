//! The page seam: everything the hover engine needs from the host document.
//!
//! The engine only issues synchronous calls through [`Page`]. Anything that
//! completes later (timers, the trailer fetch, media readiness, pointer
//! input) comes back in as a [`PageEvent`] via
//! [`crate::preview::HoverTrailer::handle_event`].

use std::fmt;
use std::time::Duration;

use crate::config::CardMarkup;
use crate::error::ResolveError;
use crate::trailer::TrailerDescriptor;
use crate::types::{Geometry, Rect, Viewport};

/// Stable identity of one card element for the page lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardKey(pub u64);

/// A bound card: element identity plus the item it shows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardRef {
    pub key: CardKey,
    pub item_id: String,
}

impl CardRef {
    pub fn new(key: CardKey, item_id: impl Into<String>) -> Self {
        Self {
            key,
            item_id: item_id.into(),
        }
    }
}

impl fmt::Display for CardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.item_id, self.key.0)
    }
}

/// A candidate element matched by the card selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundCard {
    pub key: CardKey,
    pub type_marker: Option<String>,
    pub item_id: Option<String>,
}

/// Identifies one rendered overlay subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

/// Identifies one trailer lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// What a timer means when it fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timer {
    /// Hover delay elapsed for a pointer-enter
    HoverDelay { card: CardRef, attempt: u64 },
    /// Post-click cooldown is over
    ClickLock,
    /// Grace delay before revealing an embedded player
    RemoteReveal(OverlayId),
    /// Fade-out finished, detach the overlay subtree
    RemoveOverlay(OverlayId),
    /// Fade-out finished, detach the blur layer
    RemoveBlur,
    /// DOM has been quiet long enough to re-scan cards
    ScanDebounce,
}

/// Media element inside an overlay
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    /// Native looping video element
    Video {
        src: String,
        muted: bool,
        /// `0.0..=1.0`, only meaningful when not muted
        volume: f64,
    },
    /// Embedded third-party player frame
    Frame { src: String },
}

/// Everything needed to build an overlay subtree; it starts fully transparent
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySpec {
    pub id: OverlayId,
    pub geometry: Geometry,
    pub border_radius: u32,
    pub media: MediaSource,
}

/// Inputs delivered to the hover engine
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    PointerEnter(CardRef),
    PointerLeave(CardRef),
    Click(CardRef),
    TimerFired(Timer),
    TrailerResolved {
        ticket: Ticket,
        result: Result<TrailerDescriptor, ResolveError>,
    },
    /// Native video has its first frame
    MediaReady(OverlayId),
    /// Native video reported its intrinsic size
    MetadataLoaded { overlay: OverlayId, aspect_ratio: f64 },
    /// `play()` was refused (autoplay policy)
    PlaybackRejected(OverlayId),
    /// Embedded frame finished loading
    FrameLoaded(OverlayId),
    Resize,
    DomMutated,
}

/// Whether a document in `ready_state` has parsed its markup; until then the
/// body may be missing or partial and the initial card scan must wait
pub fn document_parsed(ready_state: &str) -> bool {
    ready_state != "loading"
}

/// Host document operations
pub trait Page {
    fn viewport(&self) -> Viewport;

    /// Current bounds of a card, `None` once it has left the document
    fn card_bounds(&self, card: &CardRef) -> Option<Rect>;

    /// All elements matching the card selector
    fn find_cards(&mut self, markup: &CardMarkup) -> Vec<FoundCard>;

    /// Attach pointer-enter, pointer-leave and click listeners to a card
    fn bind_card(&mut self, card: &CardRef);

    fn set_timer(&mut self, delay: Duration, timer: Timer) -> TimerHandle;
    fn clear_timer(&mut self, handle: TimerHandle);

    /// Start the trailer lookup; completes with [`PageEvent::TrailerResolved`]
    fn request_trailer(&mut self, url: &str, ticket: Ticket);

    /// Build and append the overlay subtree
    fn mount_overlay(&mut self, spec: &OverlaySpec);
    fn apply_geometry(&mut self, overlay: OverlayId, geometry: Geometry);
    fn set_opacity(&mut self, overlay: OverlayId, opacity: f64);
    fn start_fade_out(&mut self, overlay: OverlayId);
    fn remove_overlay(&mut self, overlay: OverlayId);

    /// Start native playback; refusal comes back as [`PageEvent::PlaybackRejected`]
    fn play_video(&mut self, overlay: OverlayId, muted: bool);

    /// Pause and clear a native video, or blank an embedded frame
    fn stop_media(&mut self, overlay: OverlayId);

    fn post_player_command(&mut self, overlay: OverlayId, message: &str);

    /// Create (or reuse) the blur layer and fade it in
    fn show_blur(&mut self);
    fn hide_blur(&mut self);
    fn remove_blur(&mut self);

    fn watch_resize(&mut self, enabled: bool);
}
