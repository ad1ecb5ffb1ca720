use tracing::trace;

use crate::page::{Page, PageEvent, Timer};

use super::controller::HoverController;
use super::watcher::CardWatcher;

pub fn handle_event<P: Page>(
    page: &mut P,
    watcher: &mut CardWatcher,
    controller: &mut HoverController,
    event: PageEvent,
) {
    trace!(event = ?event, phase = controller.session().phase_name(), "Page event");
    match event {
        PageEvent::PointerEnter(card) => controller.pointer_enter(page, card),
        PageEvent::PointerLeave(card) => controller.pointer_leave(page, &card),
        PageEvent::Click(card) => controller.click(page, &card),
        PageEvent::TimerFired(timer) => match timer {
            Timer::HoverDelay { attempt, .. } => controller.on_hover_delay(page, attempt),
            Timer::ClickLock => controller.on_lock_expired(),
            Timer::RemoteReveal(id) => controller.on_remote_reveal(page, id),
            Timer::RemoveOverlay(id) => controller.on_overlay_removal(page, id),
            Timer::RemoveBlur => controller.on_blur_removal(page),
            Timer::ScanDebounce => {
                watcher.on_debounce(page, &controller.config().markup);
            }
        },
        PageEvent::TrailerResolved { ticket, result } => {
            controller.on_trailer_resolved(page, ticket, result)
        }
        PageEvent::MediaReady(id) => controller.on_media_ready(page, id),
        PageEvent::MetadataLoaded {
            overlay,
            aspect_ratio,
        } => controller.on_metadata(page, overlay, aspect_ratio),
        PageEvent::PlaybackRejected(id) => controller.on_playback_rejected(page, id),
        PageEvent::FrameLoaded(id) => controller.on_frame_loaded(page, id),
        PageEvent::Resize => controller.on_resize(page),
        PageEvent::DomMutated => watcher.on_mutation(page),
    }
}
