//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the extension, providing a single source of truth for constant values.

/// Timing constants for the hover lifecycle (milliseconds)
pub mod timing {
    /// Quiet period after the last DOM mutation before cards are re-scanned
    pub const SCAN_DEBOUNCE_MS: u64 = 500;

    /// Length of the overlay fade-out; DOM removal is deferred by this much
    pub const FADE_OUT_MS: u64 = 300;

    /// Cooldown after a click during which no preview may start
    pub const CLICK_LOCK_MS: u64 = 2000;

    /// Embedded players expose no readiness signal, reveal after this grace delay
    pub const REMOTE_REVEAL_DELAY_MS: u64 = 500;
}

/// Host UI markup contract defaults
pub mod markup {
    /// Selector matching candidate card elements
    pub const CARD_SELECTOR: &str = ".card[data-type]";

    /// Attribute carrying the item type marker
    pub const TYPE_ATTRIBUTE: &str = "data-type";

    /// Type marker value identifying a movie card
    pub const TYPE_VALUE: &str = "Movie";

    /// Attribute carrying the item identifier
    pub const ID_ATTRIBUTE: &str = "data-id";

    /// Attribute stamped on bound cards so re-scans recognise them
    pub const KEY_ATTRIBUTE: &str = "data-hover-trailer-key";

    /// Global the server-injected client configuration is published under
    pub const CONFIG_GLOBAL: &str = "HoverTrailerConfig";
}

/// Server endpoints consumed by the browser build
pub mod endpoints {
    /// Trailer lookup for one item, `{id}` is replaced by the item identifier
    pub const TRAILER_INFO: &str = "/HoverTrailer/TrailerInfo/{id}";

    /// Host streaming endpoint for local trailers
    pub const STREAM: &str = "/Videos/{id}/stream?static=true";

    /// Placeholder substituted in URL templates
    pub const ID_PLACEHOLDER: &str = "{id}";
}

/// Embedded player constants
pub mod remote {
    /// Privacy-enhanced embed host
    pub const EMBED_BASE: &str = "https://www.youtube-nocookie.com/embed/";

    /// Quality value that leaves quality selection to the player
    pub const ADAPTIVE_QUALITY: &str = "adaptive";

    /// Aspect ratio of the embedded player
    pub const ASPECT_RATIO: f64 = 16.0 / 9.0;

    /// Frame target used to force playback to stop
    pub const BLANK_TARGET: &str = "about:blank";

    /// Target origin for player commands, the origin of [`EMBED_BASE`]
    pub const PLAYER_ORIGIN: &str = "https://www.youtube-nocookie.com";
}

/// Native video element events
pub mod media {
    /// First frame is decoded; playback starts and the overlay is revealed
    pub const READY_EVENT: &str = "loadeddata";

    /// Intrinsic dimensions are known
    pub const METADATA_EVENT: &str = "loadedmetadata";
}

/// Overlay styling
pub mod style {
    /// Stacking order of the overlay container
    pub const OVERLAY_Z_INDEX: i32 = 9999;

    /// Stacking order of the background blur layer (just below the overlay)
    pub const BLUR_Z_INDEX: i32 = 9998;

    /// Blur radius of the background layer in pixels
    pub const BLUR_RADIUS_PX: u32 = 8;

    pub const BLUR_BACKGROUND: &str = "rgba(0, 0, 0, 0.3)";
}

/// Configuration bounds enforced before a snapshot is handed out
pub mod validation {
    pub const MAX_HOVER_DELAY_MS: u64 = 10_000;
    pub const MIN_SIZE_PERCENTAGE: u32 = 50;
    pub const MAX_SIZE_PERCENTAGE: u32 = 1500;
    pub const MIN_OPACITY: f64 = 0.1;
    pub const MAX_OPACITY: f64 = 1.0;
    pub const MAX_BORDER_RADIUS: u32 = 50;
    pub const MAX_VOLUME: u32 = 100;
    pub const MIN_DIMENSION: u32 = 100;
    pub const MAX_DIMENSION: u32 = 4096;
}

/// Configuration file location and environment
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "hover-trailer";

    /// Settings file name
    pub const FILENAME: &str = "config.toml";

    /// Prefix for environment overrides
    pub const ENV_PREFIX: &str = "HOVER_TRAILER_";
}

/// Trailer model constants
pub mod trailer {
    /// Runtime ticks are 100 ns units
    pub const TICKS_PER_SECOND: i64 = 10_000_000;
}
