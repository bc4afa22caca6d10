use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use trackscope::{AnalysisReport, AudioPayload, PipelineConfig, ResolveError, TrackAnalysisService};

#[derive(Parser, Debug)]
#[command(name = "trackscope", version, about = "Resolve musical features for a track")]
struct Args {
    /// Artist name
    #[arg(short, long)]
    artist: String,

    /// Track title
    #[arg(short, long)]
    track: String,

    /// Audio file (mp3, wav, m4a, flac) to analyze locally
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn read_audio(path: &Path) -> anyhow::Result<AudioPayload> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read audio file {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(AudioPayload::new(file_name, bytes))
}

fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    value
        .map(|v| format!("{}{}", v, unit))
        .unwrap_or_else(|| "n/a".to_string())
}

fn print_report(report: &AnalysisReport) {
    let r = &report.record;
    println!("{} - {}", r.artist, r.track);
    println!("  Source:       {}", r.provenance.base);
    println!("  Tempo:        {}", fmt_opt(r.tempo, " BPM"));
    println!("  Key:          {}", r.key);
    println!("  Energy:       {}", fmt_opt(r.energy, ""));
    println!("  Loudness:     {}", fmt_opt(r.loudness_db, " dB"));
    println!("  Duration:     {}", fmt_opt(r.duration_minutes, " min"));
    if let Some(popularity) = r.popularity {
        println!("  Popularity:   {}", popularity);
    }
    if r.danceability.is_some() || r.valence.is_some() || r.acousticness.is_some() {
        println!("  Danceability: {}", fmt_opt(r.danceability, ""));
        println!("  Valence:      {}", fmt_opt(r.valence, ""));
        println!("  Acousticness: {}", fmt_opt(r.acousticness, ""));
    }
    if !r.tags.is_empty() {
        println!("  Tags:         {}", r.tags.join(", "));
    }
    if let (Some(plays), Some(listeners)) = (r.playcount, r.listeners) {
        println!("  Plays:        {} ({} listeners)", plays, listeners);
    }
    if let Some(url) = &r.external_url {
        println!("  Link:         {}", url);
    }
    if !r.provenance.local_overrides.is_empty() {
        println!("  From audio:   {:?}", r.provenance.local_overrides);
    }

    if report.recommendations.is_empty() {
        println!("\nNo recommendations available.");
    } else {
        println!("\nSimilar tracks:");
        for (i, rec) in report.recommendations.iter().enumerate() {
            println!("  {}. {} - {}", i + 1, rec.artist, rec.name);
        }
    }
}

fn describe(err: &ResolveError) -> String {
    match err {
        ResolveError::MissingInput(msg) => format!("Please provide both artist and track ({})", msg),
        ResolveError::NoData { .. } => format!("No data found for this track. {}", err),
        ResolveError::Upstream { .. } => format!("A music service could not be reached. {}", err),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let audio = args.audio.as_deref().map(read_audio).transpose()?;

    let service = TrackAnalysisService::new(PipelineConfig::from_env())
        .context("Failed to initialize analysis service")?;

    match service.analyze_input(&args.artist, &args.track, audio).await {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            if args.json {
                eprintln!("{}", serde_json::to_string_pretty(&err)?);
            } else {
                eprintln!("{}", describe(&err));
            }
            Ok(match err {
                ResolveError::MissingInput(_) => ExitCode::from(2),
                ResolveError::NoData { .. } => ExitCode::from(3),
                ResolveError::Upstream { .. } => ExitCode::from(4),
            })
        }
    }
}
