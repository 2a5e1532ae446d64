pub mod chunker;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod provider;
pub mod transcript;
pub mod usage;

pub use chunker::{ChunkerConfig, split_text};
pub use error::{KonspektError, Result};
pub use llm::{ChatClient, Completion, CompletionBackend};
pub use pipeline::{
    DOC_SEPARATOR, MAP_PROMPT, NotesPipeline, PipelineConfig, PipelineResult, REDUCE_PROMPT,
};
pub use provider::{Provider, ProviderConfig};
pub use transcript::{
    TranscriptSegment, TranscriptSource, YoutubeCaptions, concat_segments, extract_video_id,
};
pub use usage::{CostStats, RATE_INPUT_PER_1K, RATE_OUTPUT_PER_1K, UsageTracker};
