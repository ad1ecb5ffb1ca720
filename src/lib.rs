//! Hover-to-preview trailers for media library cards.
//!
//! The engine in [`preview`] is platform-independent and talks to the host
//! document only through [`page::Page`]. The browser binding lives in `web`
//! and is compiled for `wasm32` only.

pub mod config;
pub mod constants;
pub mod error;
pub mod page;
pub mod preview;
pub mod remote;
pub mod trailer;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(target_arch = "wasm32")]
mod web;

pub use config::{ConfigSnapshot, PluginSettings};
pub use error::{ConfigError, ErrorBody, RenderError, ResolveError};
pub use preview::HoverTrailer;
pub use trailer::{TrailerCandidates, TrailerDescriptor, select_trailer};
