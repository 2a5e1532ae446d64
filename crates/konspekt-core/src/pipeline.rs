//! Map-reduce synthesis of technical notes from a transcript.
//!
//! A run concatenates the transcript, chunks it, issues one "map" model call
//! per chunk under a concurrency cap, then synthesizes the intermediate
//! documents with "reduce" calls. When the joined intermediate text is too
//! large for one synthesis call, batched reduce rounds shrink the list first,
//! so a single call's input stays bounded for any transcript length.
//!
//! Token usage is accounted into a tracker created inside `run`, so
//! concurrent runs can never observe each other's counters.

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::Semaphore;

use crate::{
    chunker::{ChunkerConfig, split_text},
    error::{KonspektError, Result},
    llm::CompletionBackend,
    transcript::{TranscriptSegment, concat_segments},
    usage::{CostStats, UsageTracker},
};

pub static MAP_PROMPT: &str = r#"You are a Senior Technical Writer. Convert the following transcript excerpt into clean, structured Markdown notes.

Rules:
- Output pure Markdown only. No explanations outside Markdown.
- Use '###' for sub-section headers based on topic shifts.
- Preserve any described code into proper Markdown code blocks with language tags (e.g., ```python).
- Preserve mathematical expressions as formulas.
- Use bullet points for step-by-step processes.
- Bold important terms and concepts.
- Remove conversational filler (e.g., 'in this video', 'the speaker says').
- Focus strictly on the technical content: what is being explained and how it works.
"#;

pub static REDUCE_PROMPT: &str = r#"You are a Senior Technical Writer. You receive several partial Markdown notes generated from consecutive excerpts of one talk, separated by '---'. Merge them into a single cohesive document.

Rules:
- Output pure Markdown only.
- Deduplicate content repeated across adjacent parts.
- Impose a logical section ordering; the parts are in playback order.
- Add a Title and a Table of Contents at the top.
- Preserve code blocks and formulas verbatim.
"#;

/// Separator between intermediate documents handed to a reduce call.
pub const DOC_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub chunker: ChunkerConfig,
    /// Joined intermediate text at or above this many bytes triggers batched
    /// reduce rounds before the final synthesis call.
    pub reduce_threshold_chars: usize,
    /// Documents folded into one reduce call during a batched round.
    pub reduce_batch_size: usize,
    /// Cap on in-flight model calls within one stage.
    pub max_concurrent_calls: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            reduce_threshold_chars: 100_000,
            reduce_batch_size: 5,
            max_concurrent_calls: 4,
        }
    }
}

/// Final document plus the run's cost accounting.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub document: String,
    pub stats: CostStats,
}

pub struct NotesPipeline {
    backend: Arc<dyn CompletionBackend>,
    config: PipelineConfig,
}

impl NotesPipeline {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self::with_config(backend, PipelineConfig::default())
    }

    pub fn with_config(backend: Arc<dyn CompletionBackend>, config: PipelineConfig) -> Self {
        assert!(config.reduce_batch_size > 0);
        assert!(config.max_concurrent_calls > 0);
        Self { backend, config }
    }

    /// Generate notes for one transcript. An empty transcript yields an empty
    /// document with zero usage and issues no model call.
    pub async fn run(&self, segments: &[TranscriptSegment]) -> Result<PipelineResult> {
        let text = concat_segments(segments);
        let tracker = UsageTracker::new();

        if text.is_empty() {
            return Ok(PipelineResult {
                document: String::new(),
                stats: tracker.snapshot(),
            });
        }

        let chunks = split_text(&text, &self.config.chunker);
        tracing::info!(
            chars = text.len(),
            chunks = chunks.len(),
            "starting notes synthesis"
        );

        let intermediate = self.map_stage(&chunks, &tracker).await?;
        let document = self.reduce_stage(intermediate, &tracker).await?;

        let stats = tracker.snapshot();
        tracing::info!(
            input_tokens = stats.input_tokens,
            output_tokens = stats.output_tokens,
            cost_usd = stats.cost,
            "notes synthesis finished"
        );
        Ok(PipelineResult { document, stats })
    }

    /// One model call per chunk, concurrently, reassembled in chunk order.
    /// The first failed call fails the stage and drops its siblings.
    async fn map_stage(&self, chunks: &[String], tracker: &UsageTracker) -> Result<Vec<String>> {
        let indexed = self
            .bounded_calls(
                "map",
                MAP_PROMPT,
                chunks.iter().map(String::as_str),
                tracker,
            )
            .await?;
        Ok(indexed)
    }

    /// Synthesize intermediate documents into one. Batched rounds run while
    /// the joined text is too large for a single call; the final call always
    /// applies the synthesis instruction (title, table of contents).
    async fn reduce_stage(
        &self,
        mut documents: Vec<String>,
        tracker: &UsageTracker,
    ) -> Result<String> {
        if documents.is_empty() {
            return Ok(String::new());
        }

        while joined_len(&documents) >= self.config.reduce_threshold_chars && documents.len() > 1 {
            tracing::info!(
                documents = documents.len(),
                "joined notes exceed the synthesis window, running a batched reduce round"
            );
            let batches: Vec<String> = documents
                .chunks(self.config.reduce_batch_size)
                .map(|batch| batch.join(DOC_SEPARATOR))
                .collect();
            documents = self
                .bounded_calls(
                    "reduce",
                    REDUCE_PROMPT,
                    batches.iter().map(String::as_str),
                    tracker,
                )
                .await?;
        }

        let joined = documents.join(DOC_SEPARATOR);
        self.completion("reduce", REDUCE_PROMPT, &joined, tracker)
            .await
    }

    /// Run one call per input under the concurrency cap and return the
    /// outputs in input order, regardless of completion order.
    async fn bounded_calls<'a>(
        &self,
        stage: &'static str,
        system_prompt: &str,
        inputs: impl Iterator<Item = &'a str>,
        tracker: &UsageTracker,
    ) -> Result<Vec<String>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_calls));
        let calls = inputs.enumerate().map(|(index, input)| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("call semaphore never closed");
                let text = self.completion(stage, system_prompt, input, tracker).await?;
                Ok::<_, KonspektError>((index, text))
            }
        });

        let completed = try_join_all(calls).await?;
        let mut ordered = vec![String::new(); completed.len()];
        for (index, text) in completed {
            ordered[index] = text;
        }
        Ok(ordered)
    }

    async fn completion(
        &self,
        stage: &'static str,
        system_prompt: &str,
        user_content: &str,
        tracker: &UsageTracker,
    ) -> Result<String> {
        let completion = self
            .backend
            .complete(system_prompt, user_content)
            .await
            .inspect_err(|err| tracing::error!(stage, error = %err, "model call failed"))?;
        tracker.add(completion.input_tokens, completion.output_tokens);
        tracing::debug!(
            stage,
            input_tokens = completion.input_tokens,
            output_tokens = completion.output_tokens,
            "model call finished"
        );
        Ok(completion.text)
    }
}

fn joined_len(documents: &[String]) -> usize {
    let separators = DOC_SEPARATOR.len() * documents.len().saturating_sub(1);
    documents.iter().map(String::len).sum::<usize>() + separators
}
