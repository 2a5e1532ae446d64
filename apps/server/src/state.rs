use std::sync::Arc;

use konspekt_core::{NotesPipeline, TranscriptSource};

use crate::{quota::QuotaLedger, store::NoteStore};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<NotesPipeline>,
    pub transcripts: Arc<dyn TranscriptSource>,
    pub store: NoteStore,
    pub quota: Arc<QuotaLedger>,
}
