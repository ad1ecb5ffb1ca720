//! Operator settings for the extension
//!
//! Flat TOML file with per-field defaults. Environment variables prefixed
//! with `HOVER_TRAILER_` override file values. Nothing here is trusted by the
//! browser build until [`PluginSettings::snapshot`] has validated it.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info};

use super::snapshot::{CardMarkup, ConfigSnapshot, PositioningMode, SizingMode};
use crate::constants::{config, endpoints, remote, validation::*};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    pub enabled: bool,
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

    /// Card markup contract, override when the host UI changes markup
    pub markup: CardMarkup,

    pub trailer_info_url: String,
    pub stream_url: String,
}

impl Default for PluginSettings {
    fn default() -> Self {
        let snapshot = ConfigSnapshot::default();
        Self {
            enabled: true,
            hover_delay_ms: snapshot.hover_delay_ms,
            debug_logging: snapshot.debug_logging,
            positioning_mode: snapshot.positioning_mode,
            offset_x: snapshot.offset_x,
            offset_y: snapshot.offset_y,
            sizing_mode: snapshot.sizing_mode,
            width: snapshot.width,
            height: snapshot.height,
            size_percentage: snapshot.size_percentage,
            opacity: snapshot.opacity,
            border_radius: snapshot.border_radius,
            enable_audio: snapshot.enable_audio,
            volume: snapshot.volume,
            remote_video_quality: snapshot.remote_video_quality,
            enable_background_blur: snapshot.enable_background_blur,
            markup: snapshot.markup,
            trailer_info_url: snapshot.trailer_info_url,
            stream_url: snapshot.stream_url,
        }
    }
}

impl PluginSettings {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load settings from `path` (or the default location) and apply env overrides.
    ///
    /// A missing file at the default location is not an error: defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some();
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        let mut settings = match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents).map_err(|source| {
                error!(path = %path.display(), error = %source, "Failed to parse settings file");
                ConfigError::Parse {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No settings file found, using defaults");
                Self::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Parse one `HOVER_TRAILER_*` override; unparsable values are logged and ignored
    fn override_value<T, F>(lookup: &F, name: &str) -> Option<T>
    where
        T: FromStr,
        <T as FromStr>::Err: std::fmt::Debug,
        F: Fn(&str) -> Option<String>,
    {
        let var = format!("{}{}", config::ENV_PREFIX, name);
        let raw = lookup(&var)?;
        raw.trim()
            .parse::<T>()
            .inspect_err(|e| error!(var = %var, error = ?e, "failed to parse env var"))
            .ok()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|var| env::var(var).ok());
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(enabled) = Self::override_value(&lookup, "ENABLED") {
            self.enabled = enabled;
        }
        if let Some(delay) = Self::override_value(&lookup, "HOVER_DELAY_MS") {
            self.hover_delay_ms = delay;
        }
        if let Some(debug) = Self::override_value(&lookup, "DEBUG_LOGGING") {
            self.debug_logging = debug;
        }
        if let Some(audio) = Self::override_value(&lookup, "ENABLE_AUDIO") {
            self.enable_audio = audio;
        }
        if let Some(volume) = Self::override_value(&lookup, "VOLUME") {
            self.volume = volume;
        }
        if let Some(opacity) = Self::override_value(&lookup, "OPACITY") {
            self.opacity = opacity;
        }
        if let Some(percentage) = Self::override_value(&lookup, "SIZE_PERCENTAGE") {
            self.size_percentage = percentage;
        }
        if let Some(quality) = Self::override_value::<String, _>(&lookup, "REMOTE_VIDEO_QUALITY") {
            self.remote_video_quality = quality;
        }
        if let Some(blur) = Self::override_value(&lookup, "ENABLE_BACKGROUND_BLUR") {
            self.enable_background_blur = blur;
        }
    }

    /// Validate every field and freeze the result into a snapshot
    pub fn snapshot(&self) -> Result<ConfigSnapshot, ConfigError> {
        if !self.enabled {
            return Err(ConfigError::Disabled);
        }

        if self.hover_delay_ms > MAX_HOVER_DELAY_MS {
            return Err(ConfigError::invalid(
                "hover_delay_ms",
                format!("must be at most {MAX_HOVER_DELAY_MS}"),
            ));
        }
        if self.sizing_mode == SizingMode::Fixed {
            check_dimension("width", self.width)?;
            check_dimension("height", self.height)?;
        }
        if !(MIN_SIZE_PERCENTAGE..=MAX_SIZE_PERCENTAGE).contains(&self.size_percentage) {
            return Err(ConfigError::invalid(
                "size_percentage",
                format!("must be between {MIN_SIZE_PERCENTAGE} and {MAX_SIZE_PERCENTAGE}"),
            ));
        }
        if !(MIN_OPACITY..=MAX_OPACITY).contains(&self.opacity) {
            return Err(ConfigError::invalid(
                "opacity",
                format!("must be between {MIN_OPACITY} and {MAX_OPACITY}"),
            ));
        }
        if self.border_radius > MAX_BORDER_RADIUS {
            return Err(ConfigError::invalid(
                "border_radius",
                format!("must be at most {MAX_BORDER_RADIUS}"),
            ));
        }
        if self.volume > MAX_VOLUME {
            return Err(ConfigError::invalid("volume", format!("must be at most {MAX_VOLUME}")));
        }
        if self.remote_video_quality.trim().is_empty() {
            return Err(ConfigError::invalid(
                "remote_video_quality",
                format!("must not be empty (use \"{}\")", remote::ADAPTIVE_QUALITY),
            ));
        }
        for (field, value) in [
            ("markup.card_selector", &self.markup.card_selector),
            ("markup.type_attribute", &self.markup.type_attribute),
            ("markup.id_attribute", &self.markup.id_attribute),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(field, "must not be empty"));
            }
        }
        for (field, value) in [
            ("trailer_info_url", &self.trailer_info_url),
            ("stream_url", &self.stream_url),
        ] {
            if !value.contains(endpoints::ID_PLACEHOLDER) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must contain the {} placeholder", endpoints::ID_PLACEHOLDER),
                ));
            }
        }

        debug!(settings = ?self, "Settings validated");

        Ok(ConfigSnapshot {
            hover_delay_ms: self.hover_delay_ms,
            debug_logging: self.debug_logging,
            positioning_mode: self.positioning_mode,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            sizing_mode: self.sizing_mode,
            width: self.width,
            height: self.height,
            size_percentage: self.size_percentage,
            opacity: self.opacity,
            border_radius: self.border_radius,
            enable_audio: self.enable_audio,
            volume: self.volume,
            remote_video_quality: self.remote_video_quality.trim().to_string(),
            enable_background_blur: self.enable_background_blur,
            markup: self.markup.clone(),
            trailer_info_url: self.trailer_info_url.clone(),
            stream_url: self.stream_url.clone(),
        })
    }
}

fn check_dimension(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if (MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be between {MIN_DIMENSION} and {MAX_DIMENSION}"),
        ))
    }
}
