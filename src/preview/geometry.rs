//! Overlay geometry: where the preview sits and how big it is.
//!
//! Everything here is pure so the same numbers come out on first render,
//! when video metadata arrives and on every window resize.

use crate::config::{ConfigSnapshot, PositioningMode, SizingMode};
use crate::types::{Geometry, Rect, Viewport};

/// Compute overlay placement for a card.
///
/// `media_aspect_ratio` is `None` until the media reports its intrinsic size;
/// in fit-content mode the card box is used as a placeholder until then.
pub fn compute_geometry(
    card: Rect,
    viewport: Viewport,
    config: &ConfigSnapshot,
    media_aspect_ratio: Option<f64>,
) -> Geometry {
    let (width, height) = overlay_size(card, config, media_aspect_ratio);

    let (left, top) = match config.positioning_mode {
        PositioningMode::Center => (
            (viewport.width - width as f64) / 2.0,
            (viewport.height - height as f64) / 2.0,
        ),
        PositioningMode::Custom => {
            let (cx, cy) = card.center();
            (
                cx + config.offset_x as f64 - width as f64 / 2.0,
                cy + config.offset_y as f64 - height as f64 / 2.0,
            )
        }
    };

    Geometry::new(left.round() as i32, top.round() as i32, width, height)
}

fn overlay_size(card: Rect, config: &ConfigSnapshot, media_aspect_ratio: Option<f64>) -> (u32, u32) {
    match config.sizing_mode {
        SizingMode::Fixed => (config.width, config.height),
        SizingMode::FitContent => {
            let Some(media_ratio) = media_aspect_ratio.filter(|r| r.is_finite() && *r > 0.0) else {
                // Placeholder until the media has loaded
                return (to_px(card.width), to_px(card.height));
            };
            let (base_w, base_h) = fit_within(card, media_ratio);
            let scale = config.size_percentage as f64 / 100.0;
            (to_px(base_w as f64 * scale), to_px(base_h as f64 * scale))
        }
    }
}

/// Largest rectangle with `media_ratio` that fits inside the card, in whole pixels
fn fit_within(card: Rect, media_ratio: f64) -> (u32, u32) {
    let Some(card_ratio) = card.aspect_ratio() else {
        return (0, 0);
    };
    if media_ratio > card_ratio {
        (to_px(card.width), to_px(card.width / media_ratio))
    } else {
        (to_px(card.height * media_ratio), to_px(card.height))
    }
}

fn to_px(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}
