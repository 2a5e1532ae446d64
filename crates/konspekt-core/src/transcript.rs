//! Transcript types and the YouTube caption source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{KonspektError, Result};

/// One caption snippet in playback order. The pipeline consumes only `text`;
/// timing is preserved for callers that render or cache transcripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Fetches the caption transcript for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;
}

const VIDEO_ID_LEN: usize = 11;

fn is_valid_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Extract the 11-character video id from a YouTube URL.
///
/// Supports watch, youtu.be, embed, shorts, live and /v/ forms. The `v=`
/// query parameter always wins over path segments, so an id-shaped vanity
/// path cannot shadow the real id.
pub fn extract_video_id(raw_url: &str) -> Result<String> {
    let invalid = || KonspektError::InvalidVideoUrl {
        url: raw_url.to_string(),
    };

    let parsed = Url::parse(raw_url).map_err(|_| invalid())?;
    let host = parsed
        .host_str()
        .unwrap_or_default()
        .trim_start_matches("www.")
        .trim_start_matches("m.");

    match host {
        "youtube.com" | "youtube-nocookie.com" => {
            if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "v") {
                if is_valid_video_id(&id) {
                    return Ok(id.into_owned());
                }
                return Err(invalid());
            }
            let mut segments = parsed.path_segments().into_iter().flatten();
            while let Some(segment) = segments.next() {
                if matches!(segment, "embed" | "shorts" | "live" | "v") {
                    if let Some(id) = segments.next() {
                        if is_valid_video_id(id) {
                            return Ok(id.to_string());
                        }
                    }
                    return Err(invalid());
                }
            }
            Err(invalid())
        }
        "youtu.be" => {
            let id = parsed
                .path_segments()
                .into_iter()
                .flatten()
                .next()
                .unwrap_or_default();
            if is_valid_video_id(id) {
                Ok(id.to_string())
            } else {
                Err(invalid())
            }
        }
        _ => Err(invalid()),
    }
}

/// Concatenate segment texts into one document, preserving word boundaries.
pub fn concat_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Transcript source backed by YouTube's public caption endpoint.
///
/// Reads the watch page for the caption track list, then fetches the first
/// track in the json3 format.
pub struct YoutubeCaptions {
    client: reqwest::Client,
}

impl YoutubeCaptions {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for YoutubeCaptions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
}

#[derive(Debug, Deserialize)]
struct CaptionEvents {
    #[serde(default)]
    events: Vec<CaptionEvent>,
}

#[derive(Debug, Deserialize)]
struct CaptionEvent {
    #[serde(rename = "tStartMs")]
    start_ms: Option<u64>,
    #[serde(rename = "dDurationMs")]
    duration_ms: Option<u64>,
    #[serde(default)]
    segs: Vec<CaptionSeg>,
}

#[derive(Debug, Deserialize)]
struct CaptionSeg {
    #[serde(default)]
    utf8: String,
}

/// Locate the `"captionTracks": [...]` array embedded in the watch page's
/// player response and parse it. None when the page carries no track list.
fn extract_caption_tracks(page: &str) -> Option<Vec<CaptionTrack>> {
    let key = "\"captionTracks\":";
    let at = page.find(key)?;
    let rest = &page[at + key.len()..];
    let open = rest.find('[')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in rest[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '[' if !in_string => depth += 1,
            ']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let raw = &rest[open..open + offset + 1];
                    return serde_json::from_str(raw).ok();
                }
            }
            _ => {}
        }
    }
    None
}

fn events_to_segments(listing: CaptionEvents) -> Vec<TranscriptSegment> {
    listing
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|seg| seg.utf8.as_str()).collect();
            if text.trim().is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                text,
                start: event.start_ms.unwrap_or(0) as f64 / 1000.0,
                duration: event.duration_ms.unwrap_or(0) as f64 / 1000.0,
            })
        })
        .collect()
}

#[async_trait]
impl TranscriptSource for YoutubeCaptions {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        let page = self
            .client
            .get(&watch_url)
            .send()
            .await?
            .error_for_status()
            .map_err(|err| KonspektError::TranscriptFetchFailed {
                video_id: video_id.to_string(),
                reason: err.to_string(),
            })?
            .text()
            .await?;

        let tracks =
            extract_caption_tracks(&page).ok_or_else(|| KonspektError::TranscriptsDisabled {
                video_id: video_id.to_string(),
            })?;
        let track = tracks.first().ok_or_else(|| KonspektError::NoTranscript {
            video_id: video_id.to_string(),
        })?;
        tracing::debug!(video_id, language = %track.language_code, "fetching caption track");

        let caption_url = format!("{}&fmt=json3", track.base_url);
        let listing: CaptionEvents = self
            .client
            .get(&caption_url)
            .send()
            .await?
            .json()
            .await
            .map_err(|err| KonspektError::TranscriptFetchFailed {
                video_id: video_id.to_string(),
                reason: err.to_string(),
            })?;

        let segments = events_to_segments(listing);
        if segments.is_empty() {
            return Err(KonspektError::NoTranscript {
                video_id: video_id.to_string(),
            });
        }
        Ok(segments)
    }
}
