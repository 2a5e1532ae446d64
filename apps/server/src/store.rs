//! File-backed note persistence: one JSON document per video id.

use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use konspekt_core::{CostStats, PipelineResult, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: Uuid,
    pub video_id: String,
    pub url: String,
    pub title: String,
    pub markdown: String,
    pub stats: CostStats,
    pub created_at: SystemTime,
    pub user_ip: Option<String>,
}

impl NoteRecord {
    pub fn new(video_id: String, url: String, result: PipelineResult, user_ip: String) -> Self {
        Self {
            // Title comes from the video id until metadata lookup exists.
            title: format!("Notes for {video_id}"),
            id: Uuid::new_v4(),
            video_id,
            url,
            markdown: result.document,
            stats: result.stats,
            created_at: SystemTime::now(),
            user_ip: Some(user_ip),
        }
    }
}

#[derive(Clone)]
pub struct NoteStore {
    root: PathBuf,
}

impl NoteStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join("notes"),
        }
    }

    fn note_path(&self, video_id: &str) -> PathBuf {
        self.root.join(format!("{video_id}.json"))
    }

    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub async fn save(&self, note: &NoteRecord) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        let pretty_json = serde_json::to_string_pretty(note)?;
        fs::write(self.note_path(&note.video_id), &pretty_json).await?;
        Ok(())
    }

    pub async fn find(&self, video_id: &str) -> Result<Option<NoteRecord>> {
        let path = self.note_path(video_id);
        if !path.exists() {
            return Ok(None);
        }
        let json_content = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&json_content)?))
    }

    pub async fn delete(&self, video_id: &str) -> Result<()> {
        let path = self.note_path(video_id);
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<NoteRecord>> {
        let mut notes = Vec::new();
        let Ok(mut entries) = fs::read_dir(&self.root).await else {
            return Ok(notes);
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let json_content = fs::read_to_string(&path).await?;
                match serde_json::from_str(&json_content) {
                    Ok(note) => notes.push(note),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "skipping unreadable note")
                    }
                }
            }
        }
        Ok(notes)
    }
}
