//! Embedded web player support: URL parsing, embed URLs and the
//! post-message command protocol.

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::ConfigSnapshot;
use crate::constants::remote::EMBED_BASE;

const WATCH_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Extract the platform video identifier from a known URL shape.
///
/// Recognised: `watch?v=ID`, `youtu.be/ID`, `/embed/ID` and `/v/ID`.
pub fn extract_video_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let url = Url::parse(raw)
        .or_else(|_| Url::parse(&format!("https://{raw}")))
        .ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let candidate = if SHORT_HOSTS.contains(&host.as_str()) {
        segments.next().map(str::to_string)
    } else if WATCH_HOSTS.contains(&host.as_str()) {
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed") | Some("v") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };

    candidate.filter(|id| is_valid_id(id))
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Privacy-enhanced embed URL: autoplay muted, no controls, looping via the
/// single-item playlist, inline, no related videos, JS API enabled.
pub fn embed_url(video_id: &str) -> String {
    format!(
        "{EMBED_BASE}{video_id}?autoplay=1&mute=1&controls=0&loop=1&playlist={video_id}\
         &playsinline=1&rel=0&modestbranding=1&enablejsapi=1"
    )
}

/// A command posted to the embedded player frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCommand {
    pub event: String,
    pub func: String,
    pub args: Vec<Value>,
}

impl PlayerCommand {
    fn call(func: &str, args: Vec<Value>) -> Self {
        Self {
            event: "command".to_string(),
            func: func.to_string(),
            args,
        }
    }

    pub fn set_playback_quality(quality: &str) -> Self {
        Self::call("setPlaybackQuality", vec![Value::from(quality)])
    }

    pub fn unmute() -> Self {
        Self::call("unMute", Vec::new())
    }

    pub fn mute() -> Self {
        Self::call("mute", Vec::new())
    }

    pub fn set_volume(percent: u32) -> Self {
        Self::call("setVolume", vec![Value::from(percent.min(100))])
    }

    /// Wire form posted to the frame
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Commands to issue once the embedded frame has loaded.
///
/// The player starts muted; it stays muted unless audio is enabled with a
/// non-zero volume.
pub fn commands_after_load(config: &ConfigSnapshot) -> Vec<PlayerCommand> {
    let mut commands = Vec::new();
    if let Some(quality) = config.fixed_quality() {
        commands.push(PlayerCommand::set_playback_quality(quality));
    }
    if config.audible() {
        commands.push(PlayerCommand::unmute());
        commands.push(PlayerCommand::set_volume(config.volume));
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::remote::PLAYER_ORIGIN;

    #[test]
    fn test_player_commands_target_embed_origin() {
        let embed = Url::parse(&embed_url("abc123")).unwrap();
        assert_eq!(embed.origin().ascii_serialization(), PLAYER_ORIGIN);
    }

    #[test]
    fn test_short_and_watch_urls() {
        assert_eq!(extract_video_id("https://youtu.be/abc123").as_deref(), Some("abc123"));
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc123&t=5").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_embed_and_v_urls() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/Xy_9-z?rel=0").as_deref(),
            Some("Xy_9-z")
        );
        assert_eq!(extract_video_id("http://youtube.com/v/abc123").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_scheme_less_and_mobile() {
        assert_eq!(extract_video_id("m.youtube.com/watch?feature=share&v=q1").as_deref(), Some("q1"));
        assert_eq!(extract_video_id("youtu.be/q2?si=tracking").as_deref(), Some("q2"));
    }

    #[test]
    fn test_unknown_shapes() {
        assert_eq!(extract_video_id("https://vimeo.com/12345"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/channel/UC123"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?list=PL1"), None);
        assert_eq!(extract_video_id("https://youtu.be/"), None);
        assert_eq!(extract_video_id("not a url at all"), None);
        assert_eq!(extract_video_id("https://youtu.be/bad%20id"), None);
    }

    #[test]
    fn test_embed_url_parameters() {
        let url = embed_url("abc123");
        assert!(url.starts_with("https://www.youtube-nocookie.com/embed/abc123?"));
        for param in [
            "autoplay=1", "mute=1", "controls=0", "loop=1", "playlist=abc123",
            "playsinline=1", "rel=0", "modestbranding=1", "enablejsapi=1",
        ] {
            assert!(url.contains(param), "missing {param} in {url}");
        }
    }

    #[test]
    fn test_command_wire_format() {
        let message = PlayerCommand::set_playback_quality("hd720").to_message();
        assert_eq!(message, r#"{"event":"command","func":"setPlaybackQuality","args":["hd720"]}"#);
    }

    #[test]
    fn test_commands_after_load_muted() {
        let config = ConfigSnapshot::default();
        assert!(commands_after_load(&config).is_empty());
    }

    #[test]
    fn test_commands_after_load_with_audio_and_quality() {
        let config = ConfigSnapshot {
            enable_audio: true,
            volume: 35,
            remote_video_quality: "hd1080".to_string(),
            ..ConfigSnapshot::default()
        };
        let funcs: Vec<_> = commands_after_load(&config).into_iter().map(|c| c.func).collect();
        assert_eq!(funcs, ["setPlaybackQuality", "unMute", "setVolume"]);
    }
}
