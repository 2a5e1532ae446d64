use std::sync::Arc;

use anyhow::{Context, Result};
use konspekt_core::{ChatClient, NotesPipeline, YoutubeCaptions};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use konspekt_server::{
    quota::QuotaLedger, routes, settings::Settings, state::AppState, store::NoteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env();

    // Fail on a missing API key now rather than on the first request.
    let backend =
        ChatClient::new(settings.provider.clone()).context("LLM provider is not configured")?;
    let pipeline = Arc::new(NotesPipeline::new(Arc::new(backend)));

    let store = NoteStore::new(&settings.data_dir);
    store.init().await?;

    let quota = Arc::new(QuotaLedger::new(
        settings.note_limit,
        settings.admin_ips.clone(),
    ));
    for note in store.list().await? {
        if let Some(ip) = &note.user_ip {
            quota.record(ip);
        }
    }

    let state = AppState {
        pipeline,
        transcripts: Arc::new(YoutubeCaptions::new()),
        store,
        quota,
    };

    let app = routes::router(state);
    tracing::info!(
        addr = %settings.bind_addr,
        provider = settings.provider.name(),
        data_dir = %settings.data_dir.display(),
        "konspekt API listening"
    );
    let listener = TcpListener::bind(settings.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
