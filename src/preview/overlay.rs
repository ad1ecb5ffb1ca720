use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{ConfigSnapshot, SizingMode};
use crate::constants::{remote, timing};
use crate::error::RenderError;
use crate::page::{CardRef, MediaSource, OverlayId, OverlaySpec, Page, Timer, TimerHandle};
use crate::remote::{commands_after_load, embed_url, extract_video_id};
use crate::trailer::TrailerDescriptor;
use crate::types::{Geometry, Rect, Viewport};

use super::geometry::compute_geometry;

#[derive(Debug)]
enum Backend {
    /// Native video element
    Local {
        muted: bool,
        retried_muted: bool,
        aspect_ratio: Option<f64>,
    },
    /// Embedded player frame
    Remote {
        video_id: String,
        reveal_timer: Option<TimerHandle>,
    },
}

/// A mounted overlay that is fading out and awaiting DOM removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retired {
    pub id: OverlayId,
    pub removal: TimerHandle,
}

/// Owner of one overlay subtree from mount to teardown
#[derive(Debug)]
pub struct OverlayHandle {
    // === Identity ===
    pub id: OverlayId,
    pub card: CardRef,
    pub trailer_name: String,

    // === Presentation state ===
    pub geometry: Geometry,
    pub revealed: bool,
    torn_down: bool,

    backend: Backend,
}

impl OverlayHandle {
    /// Build the overlay for a resolved trailer and append it to the page.
    ///
    /// Fails without touching the page when a remote trailer has no
    /// recognisable video id.
    pub fn render<P: Page>(
        page: &mut P,
        config: &ConfigSnapshot,
        id: OverlayId,
        trailer: &TrailerDescriptor,
        card: CardRef,
        card_bounds: Rect,
    ) -> Result<Self, RenderError> {
        let viewport = page.viewport();

        let (backend, media) = if trailer.plays_remotely() {
            let video_id = extract_video_id(&trailer.path)
                .ok_or_else(|| RenderError::InvalidRemoteSource(trailer.path.clone()))?;
            let media = MediaSource::Frame {
                src: embed_url(&video_id),
            };
            (
                Backend::Remote {
                    video_id,
                    reveal_timer: None,
                },
                media,
            )
        } else {
            let muted = !config.enable_audio;
            let media = MediaSource::Video {
                src: config.stream_url(&trailer.id),
                muted,
                volume: if muted { 0.0 } else { config.volume_fraction() },
            };
            (
                Backend::Local {
                    muted,
                    retried_muted: false,
                    aspect_ratio: None,
                },
                media,
            )
        };

        let mut overlay = Self {
            id,
            card,
            trailer_name: trailer.name.clone(),
            geometry: Geometry::default(),
            revealed: false,
            torn_down: false,
            backend,
        };
        overlay.geometry = overlay.compute(card_bounds, viewport, config);

        page.mount_overlay(&OverlaySpec {
            id,
            geometry: overlay.geometry,
            border_radius: config.border_radius,
            media,
        });

        if let Backend::Remote { reveal_timer, video_id } = &mut overlay.backend {
            *reveal_timer = Some(page.set_timer(
                Duration::from_millis(timing::REMOTE_REVEAL_DELAY_MS),
                Timer::RemoteReveal(id),
            ));
            debug!(overlay = id.0, video_id = %video_id, "Mounted embedded player");
        } else {
            debug!(overlay = id.0, trailer = %overlay.trailer_name, "Mounted native video");
        }

        info!(
            overlay = id.0,
            card = %overlay.card,
            x = overlay.geometry.x,
            y = overlay.geometry.y,
            width = overlay.geometry.width,
            height = overlay.geometry.height,
            "Rendered trailer preview"
        );
        Ok(overlay)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.backend, Backend::Remote { .. })
    }

    /// Last known media aspect ratio; the embedded player is always 16:9
    pub fn aspect_ratio(&self) -> Option<f64> {
        match &self.backend {
            Backend::Local { aspect_ratio, .. } => *aspect_ratio,
            Backend::Remote { .. } => Some(remote::ASPECT_RATIO),
        }
    }

    fn compute(&self, card_bounds: Rect, viewport: Viewport, config: &ConfigSnapshot) -> Geometry {
        compute_geometry(card_bounds, viewport, config, self.aspect_ratio())
    }

    /// Reposition (and in fit-content mode resize) without rebuilding the subtree
    pub fn update_geometry<P: Page>(&mut self, page: &mut P, geometry: Geometry) {
        if self.torn_down || geometry == self.geometry {
            return;
        }
        self.geometry = geometry;
        page.apply_geometry(self.id, geometry);
    }

    /// Recompute from current card bounds and apply
    pub fn refresh_geometry<P: Page>(&mut self, page: &mut P, card_bounds: Rect, config: &ConfigSnapshot) {
        let geometry = self.compute(card_bounds, page.viewport(), config);
        self.update_geometry(page, geometry);
    }

    /// First frame of the native video is available: start playback and reveal.
    ///
    /// Returns `true` when this call revealed the overlay.
    pub fn on_media_ready<P: Page>(&mut self, page: &mut P, config: &ConfigSnapshot) -> bool {
        let Backend::Local { muted, .. } = &self.backend else {
            return false;
        };
        if self.torn_down {
            return false;
        }
        page.play_video(self.id, *muted);
        self.reveal(page, config)
    }

    /// Autoplay with audio was refused; retry once muted
    pub fn on_playback_rejected<P: Page>(&mut self, page: &mut P) {
        if self.torn_down {
            return;
        }
        if let Backend::Local {
            muted,
            retried_muted,
            ..
        } = &mut self.backend
        {
            if *muted || *retried_muted {
                warn!(overlay = self.id.0, "Muted playback refused, giving up");
                return;
            }
            *retried_muted = true;
            *muted = true;
            info!(overlay = self.id.0, "Autoplay with audio refused, retrying muted");
            page.play_video(self.id, true);
        }
    }

    /// Native video reported its intrinsic aspect ratio
    pub fn on_metadata<P: Page>(
        &mut self,
        page: &mut P,
        aspect: f64,
        card_bounds: Option<Rect>,
        config: &ConfigSnapshot,
    ) {
        if self.torn_down || !aspect.is_finite() || aspect <= 0.0 {
            return;
        }
        let Backend::Local { aspect_ratio, .. } = &mut self.backend else {
            return;
        };
        *aspect_ratio = Some(aspect);
        if config.sizing_mode == SizingMode::FitContent
            && let Some(bounds) = card_bounds
        {
            self.refresh_geometry(page, bounds, config);
        }
    }

    /// Grace delay for the embedded player elapsed.
    ///
    /// Returns `true` when this call revealed the overlay.
    pub fn on_remote_reveal<P: Page>(&mut self, page: &mut P, config: &ConfigSnapshot) -> bool {
        let Backend::Remote { reveal_timer, .. } = &mut self.backend else {
            return false;
        };
        *reveal_timer = None;
        if self.torn_down {
            return false;
        }
        self.reveal(page, config)
    }

    /// Embedded frame loaded: push quality and audio settings to the player
    pub fn on_frame_loaded<P: Page>(&mut self, page: &mut P, config: &ConfigSnapshot) {
        if self.torn_down || !self.is_remote() {
            return;
        }
        for command in commands_after_load(config) {
            debug!(overlay = self.id.0, func = %command.func, "Posting player command");
            page.post_player_command(self.id, &command.to_message());
        }
    }

    fn reveal<P: Page>(&mut self, page: &mut P, config: &ConfigSnapshot) -> bool {
        if self.revealed {
            return false;
        }
        self.revealed = true;
        page.set_opacity(self.id, config.opacity);
        true
    }

    /// Stop playback, start the fade-out and schedule DOM removal.
    ///
    /// Safe to call repeatedly: only the first call does anything.
    pub fn teardown<P: Page>(&mut self, page: &mut P) -> Option<Retired> {
        if self.torn_down {
            return None;
        }
        self.torn_down = true;

        if let Backend::Remote { reveal_timer, .. } = &mut self.backend
            && let Some(handle) = reveal_timer.take()
        {
            page.clear_timer(handle);
        }

        page.stop_media(self.id);
        page.start_fade_out(self.id);
        let removal = page.set_timer(
            Duration::from_millis(timing::FADE_OUT_MS),
            Timer::RemoveOverlay(self.id),
        );
        debug!(overlay = self.id.0, card = %self.card, "Overlay torn down");
        Some(Retired { id: self.id, removal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::CardKey;
    use crate::testing::{Call, FakePage, local_trailer, remote_trailer};

    fn card() -> CardRef {
        CardRef::new(CardKey(1), "item-1")
    }

    fn bounds() -> Rect {
        Rect::new(100.0, 100.0, 300.0, 200.0)
    }

    #[test]
    fn test_local_render_starts_transparent_with_stream_url() {
        let mut page = FakePage::new();
        let config = ConfigSnapshot::default();
        let overlay = OverlayHandle::render(
            &mut page, &config, OverlayId(1), &local_trailer("t9"), card(), bounds(),
        )
        .unwrap();

        assert!(!overlay.revealed);
        let spec = page.mounted(OverlayId(1)).unwrap();
        assert_eq!(
            spec.media,
            MediaSource::Video {
                src: "/Videos/t9/stream?static=true".to_string(),
                muted: true,
                volume: 0.0,
            }
        );
        assert!(!page.calls.iter().any(|c| matches!(c, Call::SetOpacity(..))));
    }

    #[test]
    fn test_audio_enabled_sets_volume() {
        let mut page = FakePage::new();
        let config = ConfigSnapshot {
            enable_audio: true,
            volume: 40,
            ..ConfigSnapshot::default()
        };
        OverlayHandle::render(&mut page, &config, OverlayId(1), &local_trailer("t"), card(), bounds())
            .unwrap();
        match &page.mounted(OverlayId(1)).unwrap().media {
            MediaSource::Video { muted, volume, .. } => {
                assert!(!muted);
                assert!((volume - 0.4).abs() < f64::EPSILON);
            }
            other => panic!("unexpected media {other:?}"),
        }
    }

    #[test]
    fn test_media_ready_plays_and_reveals_once() {
        let mut page = FakePage::new();
        let config = ConfigSnapshot {
            opacity: 0.8,
            ..ConfigSnapshot::default()
        };
        let mut overlay =
            OverlayHandle::render(&mut page, &config, OverlayId(1), &local_trailer("t"), card(), bounds())
                .unwrap();
        assert!(overlay.on_media_ready(&mut page, &config));
        assert!(page.calls.contains(&Call::PlayVideo(OverlayId(1), true)));
        assert!(page.calls.contains(&Call::SetOpacity(OverlayId(1), 0.8)));
        assert!(!overlay.on_media_ready(&mut page, &config));
    }

    #[test]
    fn test_playback_rejection_retries_muted_once() {
        let mut page = FakePage::new();
        let config = ConfigSnapshot {
            enable_audio: true,
            ..ConfigSnapshot::default()
        };
        let mut overlay =
            OverlayHandle::render(&mut page, &config, OverlayId(1), &local_trailer("t"), card(), bounds())
                .unwrap();
        overlay.on_media_ready(&mut page, &config);
        assert!(page.calls.contains(&Call::PlayVideo(OverlayId(1), false)));

        overlay.on_playback_rejected(&mut page);
        overlay.on_playback_rejected(&mut page);
        let muted_retries = page
            .calls
            .iter()
            .filter(|c| **c == Call::PlayVideo(OverlayId(1), true))
            .count();
        assert_eq!(muted_retries, 1);
    }

    #[test]
    fn test_metadata_resizes_in_fit_mode() {
        let mut page = FakePage::new();
        let config = ConfigSnapshot {
            sizing_mode: SizingMode::FitContent,
            size_percentage: 200,
            ..ConfigSnapshot::default()
        };
        let mut overlay =
            OverlayHandle::render(&mut page, &config, OverlayId(1), &local_trailer("t"), card(), bounds())
                .unwrap();
        assert_eq!((overlay.geometry.width, overlay.geometry.height), (300, 200));

        overlay.on_metadata(&mut page, 16.0 / 9.0, Some(bounds()), &config);
        assert_eq!((overlay.geometry.width, overlay.geometry.height), (600, 338));
        assert!(page.calls.iter().any(|c| matches!(c, Call::ApplyGeometry(OverlayId(1), g) if g.width == 600)));
    }

    #[test]
    fn test_remote_render_uses_embed_and_grace_reveal() {
        let mut page = FakePage::new();
        let config = ConfigSnapshot::default();
        let mut overlay = OverlayHandle::render(
            &mut page,
            &config,
            OverlayId(2),
            &remote_trailer("https://www.youtube.com/watch?v=abc123&t=5"),
            card(),
            bounds(),
        )
        .unwrap();

        match &page.mounted(OverlayId(2)).unwrap().media {
            MediaSource::Frame { src } => assert!(src.contains("/embed/abc123?")),
            other => panic!("unexpected media {other:?}"),
        }
        assert_eq!(page.pending_timers(), vec![Timer::RemoteReveal(OverlayId(2))]);
        assert!(overlay.on_remote_reveal(&mut page, &config));
        assert!(overlay.revealed);
    }

    #[test]
    fn test_remote_render_rejects_unknown_url() {
        let mut page = FakePage::new();
        let result = OverlayHandle::render(
            &mut page,
            &ConfigSnapshot::default(),
            OverlayId(3),
            &remote_trailer("https://example.com/trailer"),
            card(),
            bounds(),
        );
        assert!(matches!(result, Err(RenderError::InvalidRemoteSource(_))));
        assert!(page.calls.is_empty());
    }

    #[test]
    fn test_frame_loaded_posts_commands() {
        let mut page = FakePage::new();
        let config = ConfigSnapshot {
            enable_audio: true,
            volume: 70,
            remote_video_quality: "hd720".to_string(),
            ..ConfigSnapshot::default()
        };
        let mut overlay = OverlayHandle::render(
            &mut page, &config, OverlayId(4), &remote_trailer("https://youtu.be/abc123"), card(), bounds(),
        )
        .unwrap();
        overlay.on_frame_loaded(&mut page, &config);
        let posted: Vec<_> = page
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::PostCommand(_, message) => Some(message.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(posted.len(), 3);
        assert!(posted[0].contains("setPlaybackQuality"));
        assert!(posted[2].contains(r#""args":[70]"#));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut page = FakePage::new();
        let config = ConfigSnapshot::default();
        let mut overlay = OverlayHandle::render(
            &mut page, &config, OverlayId(5), &remote_trailer("https://youtu.be/abc123"), card(), bounds(),
        )
        .unwrap();

        let retired = overlay.teardown(&mut page).unwrap();
        assert_eq!(retired.id, OverlayId(5));
        assert!(overlay.teardown(&mut page).is_none());

        let stops = page.calls.iter().filter(|c| **c == Call::StopMedia(OverlayId(5))).count();
        assert_eq!(stops, 1);
        // Pending reveal was cancelled, only the removal remains
        assert_eq!(page.pending_timers(), vec![Timer::RemoveOverlay(OverlayId(5))]);
        assert!(!overlay.on_remote_reveal(&mut page, &config));
    }
}
