//! Trailer descriptors as returned by the trailer info endpoint

use serde::{Deserialize, Serialize};

use crate::constants::trailer::TICKS_PER_SECOND;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailerType {
    Local,
    Remote,
    Downloaded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrailerDescriptor {
    pub id: String,
    pub name: String,
    /// Local file path or remote web video URL
    pub path: String,
    #[serde(default)]
    pub run_time_ticks: Option<i64>,
    #[serde(default)]
    pub has_subtitles: bool,
    pub trailer_type: TrailerType,
    #[serde(default)]
    pub is_remote: bool,
    #[serde(default)]
    pub source: String,
}

impl TrailerDescriptor {
    pub fn runtime_seconds(&self) -> Option<f64> {
        self.run_time_ticks
            .map(|ticks| ticks as f64 / TICKS_PER_SECOND as f64)
    }

    /// Remote trailers play through the embedded player, everything else natively
    pub fn plays_remotely(&self) -> bool {
        self.trailer_type == TrailerType::Remote
    }
}

/// Everything the host library knows about trailers for one item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TrailerCandidates {
    /// Trailer files found next to the media, in discovery order
    pub local: Vec<TrailerDescriptor>,
    /// Remote trailer links, oldest first
    pub remote: Vec<TrailerDescriptor>,
}

/// Pick the trailer to preview.
///
/// Local trailers win over remote ones. Among local trailers the first found
/// is used, among remote trailers the most recently added (last) one.
pub fn select_trailer(candidates: &TrailerCandidates) -> Option<&TrailerDescriptor> {
    candidates
        .local
        .first()
        .or_else(|| candidates.remote.last())
}
