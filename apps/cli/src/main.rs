use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;

use konspekt_core::{
    ChatClient, CostStats, NotesPipeline, Provider, TranscriptSegment, TranscriptSource,
    YoutubeCaptions, extract_video_id,
};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Grok,
    Openai,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Grok => Provider::Grok,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "konspekt")]
#[command(about = "Fetch a YouTube transcript and distill it into structured technical notes")]
struct Cli {
    /// Video URL
    url: String,

    /// AI provider for note generation
    #[arg(short, long, default_value = "grok")]
    provider: CliProvider,

    /// Force re-processing even if cached files exist
    #[arg(short, long)]
    force: bool,

    /// Also write the notes to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn get_cache_dir(video_id: &str) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("konspekt")
        .join(video_id)
}

fn provider_slug(provider: &Provider) -> String {
    provider.name().to_lowercase()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let provider: Provider = cli.provider.into();

    // Validate API key early
    if let Err(e) = provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    let video_id = extract_video_id(&cli.url)?;

    // Setup cache directory
    let cache_dir = get_cache_dir(&video_id);
    fs::create_dir_all(&cache_dir).await?;

    println!(
        "\n{}  {}\n",
        style("konspekt").cyan().bold(),
        style("Technical Notes").dim()
    );

    // Step 1: Transcript (check cache)
    let transcript_path = cache_dir.join("transcript.json");
    let segments: Vec<TranscriptSegment> = if !cli.force && transcript_path.exists() {
        let json_content = fs::read_to_string(&transcript_path).await?;
        let segments: Vec<TranscriptSegment> = serde_json::from_str(&json_content)?;
        println!(
            "{} Transcript: {} segments {}",
            style("✓").green().bold(),
            segments.len(),
            style("(cached)").dim()
        );
        segments
    } else {
        let spinner = create_spinner("Fetching transcript...");
        let segments = YoutubeCaptions::new().fetch(&video_id).await?;
        fs::write(&transcript_path, serde_json::to_string_pretty(&segments)?).await?;
        spinner.finish_with_message(format!(
            "{} Transcript: {} segments",
            style("✓").green().bold(),
            segments.len()
        ));
        segments
    };

    // Step 2: Generate notes (check cache with provider)
    let slug = provider_slug(&provider);
    let notes_path = cache_dir.join(format!("notes_{slug}.md"));
    let stats_path = cache_dir.join(format!("stats_{slug}.json"));

    let (markdown, stats) = if !cli.force && notes_path.exists() && stats_path.exists() {
        let markdown = fs::read_to_string(&notes_path).await?;
        let stats: CostStats = serde_json::from_str(&fs::read_to_string(&stats_path).await?)?;
        println!(
            "{} Notes generated ({}) {}",
            style("✓").green().bold(),
            provider.name(),
            style("(cached)").dim()
        );
        (markdown, stats)
    } else {
        let spinner = create_spinner(&format!("Generating notes with {}...", provider.name()));
        let backend = Arc::new(ChatClient::new(provider.clone())?);
        let pipeline = NotesPipeline::new(backend);
        let result = pipeline.run(&segments).await?;
        fs::write(&notes_path, &result.document).await?;
        fs::write(&stats_path, serde_json::to_string_pretty(&result.stats)?).await?;
        spinner.finish_with_message(format!(
            "{} Notes generated ({})",
            style("✓").green().bold(),
            provider.name()
        ));
        (result.document, result.stats)
    };

    println!(
        "\n{} {}\n",
        style("Saved:").dim(),
        style(notes_path.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());

    println!("{}", markdown);

    println!(
        "{} ${:.4} {}",
        style("Cost:").dim(),
        stats.cost,
        style(format!(
            "({} input / {} output tokens)",
            stats.input_tokens, stats.output_tokens
        ))
        .dim()
    );

    if let Some(output) = cli.output {
        fs::write(&output, &markdown).await?;
        println!(
            "{} {}",
            style("Copied to:").dim(),
            style(output.display()).cyan()
        );
    }

    Ok(())
}
