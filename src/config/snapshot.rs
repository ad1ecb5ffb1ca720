//! Immutable configuration snapshot consumed by the browser build
//!
//! The snapshot is produced once by [`super::PluginSettings::snapshot`] after
//! validation and delivered to the page as a JSON data object. The hover
//! engine trusts every value as-is.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{endpoints, markup, remote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositioningMode {
    /// Anchor the overlay center to the card center plus offsets
    #[default]
    Custom,
    /// Viewport center, card position is ignored
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizingMode {
    /// Configured width/height verbatim
    Fixed,
    /// Derived from media aspect ratio, card box and a percentage
    #[default]
    FitContent,
}

/// Host UI markup contract used to discover movie cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardMarkup {
    pub card_selector: String,
    pub type_attribute: String,
    pub type_value: String,
    pub id_attribute: String,
}

impl Default for CardMarkup {
    fn default() -> Self {
        Self {
            card_selector: markup::CARD_SELECTOR.to_string(),
            type_attribute: markup::TYPE_ATTRIBUTE.to_string(),
            type_value: markup::TYPE_VALUE.to_string(),
            id_attribute: markup::ID_ATTRIBUTE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigSnapshot {
    pub hover_delay_ms: u64,
    pub debug_logging: bool,
    pub positioning_mode: PositioningMode,
    pub offset_x: i32,
    pub offset_y: i32,
    pub sizing_mode: SizingMode,
    pub width: u32,
    pub height: u32,
    pub size_percentage: u32,
    pub opacity: f64,
    pub border_radius: u32,
    pub enable_audio: bool,
    pub volume: u32,
    pub remote_video_quality: String,
    pub enable_background_blur: bool,
    pub markup: CardMarkup,
    pub trailer_info_url: String,
    pub stream_url: String,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            hover_delay_ms: 1000,
            debug_logging: false,
            positioning_mode: PositioningMode::default(),
            offset_x: 0,
            offset_y: 0,
            sizing_mode: SizingMode::default(),
            width: 400,
            height: 225,
            size_percentage: 100,
            opacity: 1.0,
            border_radius: 8,
            enable_audio: false,
            volume: 50,
            remote_video_quality: remote::ADAPTIVE_QUALITY.to_string(),
            enable_background_blur: false,
            markup: CardMarkup::default(),
            trailer_info_url: endpoints::TRAILER_INFO.to_string(),
            stream_url: endpoints::STREAM.to_string(),
        }
    }
}

impl ConfigSnapshot {
    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }

    /// Media volume in `0.0..=1.0`
    pub fn volume_fraction(&self) -> f64 {
        f64::from(self.volume.min(100)) / 100.0
    }

    /// Audio is only audible when enabled and not at zero volume
    pub fn audible(&self) -> bool {
        self.enable_audio && self.volume > 0
    }

    pub fn fixed_quality(&self) -> Option<&str> {
        let quality = self.remote_video_quality.trim();
        (!quality.is_empty() && !quality.eq_ignore_ascii_case(remote::ADAPTIVE_QUALITY)).then_some(quality)
    }

    pub fn trailer_info_url(&self, item_id: &str) -> String {
        self.trailer_info_url.replace(endpoints::ID_PLACEHOLDER, item_id)
    }

    pub fn stream_url(&self, trailer_id: &str) -> String {
        self.stream_url.replace(endpoints::ID_PLACEHOLDER, trailer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_json_uses_camel_case() {
        let json = serde_json::to_value(ConfigSnapshot::default()).unwrap();
        assert_eq!(json["hoverDelayMs"], 1000);
        assert_eq!(json["positioningMode"], "Custom");
        assert_eq!(json["sizingMode"], "FitContent");
        assert_eq!(json["markup"]["idAttribute"], "data-id");
    }

    #[test]
    fn test_partial_payload_fills_defaults() {
        let snapshot: ConfigSnapshot =
            serde_json::from_str(r#"{"hoverDelayMs": 250, "positioningMode": "Center"}"#).unwrap();
        assert_eq!(snapshot.hover_delay_ms, 250);
        assert_eq!(snapshot.positioning_mode, PositioningMode::Center);
        assert_eq!(snapshot.size_percentage, 100);
    }

    #[test]
    fn test_fixed_quality_skips_adaptive_sentinel() {
        let mut snapshot = ConfigSnapshot::default();
        assert_eq!(snapshot.fixed_quality(), None);
        snapshot.remote_video_quality = "hd1080".to_string();
        assert_eq!(snapshot.fixed_quality(), Some("hd1080"));
    }

    #[test]
    fn test_url_templates() {
        let snapshot = ConfigSnapshot::default();
        assert_eq!(snapshot.trailer_info_url("abc"), "/HoverTrailer/TrailerInfo/abc");
        assert_eq!(snapshot.stream_url("t1"), "/Videos/t1/stream?static=true");
    }

    #[test]
    fn test_audible_requires_volume() {
        let snapshot = ConfigSnapshot {
            enable_audio: true,
            volume: 0,
            ..ConfigSnapshot::default()
        };
        assert!(!snapshot.audible());
    }
}
