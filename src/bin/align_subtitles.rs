use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use subtitle_aligner::{
    AlignerConfig, AlignmentInput, AudioSource, BatchAligner, BatchOptions, ForcedAlignerBuilder,
    SegmentAlignment,
};
use tracing_subscriber::EnvFilter;

#[path = "align_subtitles/json_output.rs"]
mod json_output;

#[derive(Debug, Parser)]
#[command(name = "align_subtitles")]
#[command(about = "Word-level forced alignment of subtitle segments against their audio")]
struct Args {
    /// Aligner configuration JSON (language, model, vocabulary, device).
    #[arg(long, env = "SUBTITLE_ALIGNER_CONFIG")]
    config: PathBuf,
    /// Source audio, `.wav` or `.flac`.
    #[arg(long)]
    audio: PathBuf,
    /// JSON list of `{ "start": secs, "end": secs, "text": "..." }`.
    #[arg(long)]
    segments: PathBuf,
    /// Output JSON path; stdout when omitted.
    #[arg(long, env = "SUBTITLE_ALIGNER_OUT")]
    out: Option<PathBuf>,
    #[arg(long, env = "SUBTITLE_ALIGNER_WORKERS")]
    workers: Option<usize>,
    /// Per-segment timeout in milliseconds.
    #[arg(long, env = "SUBTITLE_ALIGNER_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct SubtitleSegment {
    start: f64,
    end: f64,
    text: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let config = AlignerConfig::load(&args.config).map_err(|err| {
        format!(
            "Failed to load aligner config '{}': {err}",
            args.config.display()
        )
    })?;
    let segments = load_segments(&args.segments)?;
    if segments.is_empty() {
        return Err(format!(
            "No subtitle segments found in '{}'.",
            args.segments.display()
        ));
    }

    let waveform = AudioSource::FilePath(args.audio.clone())
        .resolve()
        .map_err(|err| format!("Failed to read audio '{}': {err}", args.audio.display()))?;
    tracing::info!(
        audio = %args.audio.display(),
        sample_rate_hz = waveform.sample_rate_hz,
        duration_secs = waveform.duration_secs(),
        segments = segments.len(),
        "audio loaded"
    );

    let language = config.language.clone();
    let aligner = ForcedAlignerBuilder::new(config)
        .build()
        .map_err(|err| format!("Failed to build aligner: {err}"))?;
    let device = aligner.device_label();

    let inputs = segments
        .iter()
        .map(|segment| AlignmentInput {
            transcript: segment.text.clone(),
            audio: AudioSource::RawSamples {
                samples: waveform.slice_secs(segment.start, segment.end),
                sample_rate_hz: waveform.sample_rate_hz,
            },
            time_offset_secs: segment.start,
        })
        .collect::<Vec<_>>();

    let mut options = BatchOptions::default();
    if let Some(workers) = args.workers {
        options.workers = workers.max(1);
    }
    options.segment_timeout = args.timeout_ms.map(Duration::from_millis);

    let progress = ProgressBar::new(inputs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .map_err(|err| format!("Invalid progress template: {err}"))?
        .progress_chars("=>-"),
    );

    let batch = BatchAligner::new(Arc::new(aligner), options);
    let mut failed = 0usize;
    let results = batch.align_all_with_progress(inputs, |_, outcome| {
        if matches!(outcome, SegmentAlignment::Unknown { .. }) {
            failed += 1;
            progress.set_message(format!("{failed} unaligned"));
        }
        progress.inc(1);
    });
    progress.finish_and_clear();

    let records = segments
        .into_iter()
        .zip(results)
        .enumerate()
        .map(|(index, (segment, result))| json_output::SegmentRecord {
            index,
            start: segment.start,
            end: segment.end,
            text: segment.text,
            result,
        })
        .collect::<Vec<_>>();

    let document = json_output::AlignmentDocument {
        generated_at: Utc::now().to_rfc3339(),
        audio_path: args.audio.display().to_string(),
        language,
        device,
        segments: records,
    };
    json_output::write_document(args.out.as_deref(), &document)?;

    tracing::info!(
        segments = document.segments.len(),
        unaligned = failed,
        "alignment finished"
    );
    Ok(())
}

fn load_segments(path: &Path) -> Result<Vec<SubtitleSegment>, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read segments file '{}': {err}", path.display()))?;
    let segments: Vec<SubtitleSegment> = serde_json::from_str(&contents)
        .map_err(|err| format!("Failed to parse segments file '{}': {err}", path.display()))?;

    if let Some((idx, bad)) = segments
        .iter()
        .enumerate()
        .find(|(_, segment)| !(segment.start.is_finite() && segment.end >= segment.start))
    {
        return Err(format!(
            "Segment #{idx} has an invalid time range [{}, {}).",
            bad.start, bad.end
        ));
    }
    Ok(segments)
}
