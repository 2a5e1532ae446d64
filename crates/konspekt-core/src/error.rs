use thiserror::Error;

#[derive(Error, Debug)]
pub enum KonspektError {
    #[error("Invalid YouTube URL: {url}")]
    InvalidVideoUrl { url: String },

    #[error("Transcripts are disabled for video {video_id}")]
    TranscriptsDisabled { video_id: String },

    #[error("No transcript found for video {video_id}")]
    NoTranscript { video_id: String },

    #[error("Transcript fetch failed for video {video_id}: {reason}")]
    TranscriptFetchFailed { video_id: String, reason: String },

    #[error("Completion request failed: {reason}")]
    CompletionFailed { reason: String },

    #[error("Malformed model response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, KonspektError>;
