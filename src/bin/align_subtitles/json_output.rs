use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use subtitle_aligner::SegmentAlignment;

#[derive(Debug, Serialize)]
pub struct AlignmentDocument {
    pub generated_at: String,
    pub audio_path: String,
    pub language: String,
    pub device: String,
    pub segments: Vec<SegmentRecord>,
}

#[derive(Debug, Serialize)]
pub struct SegmentRecord {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(flatten)]
    pub result: SegmentAlignment,
}

pub fn write_document(path: Option<&Path>, document: &AlignmentDocument) -> Result<(), String> {
    let Some(path) = path else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, document)
            .map_err(|err| format!("Failed to serialize alignment JSON: {err}"))?;
        return handle
            .write_all(b"\n")
            .map_err(|err| format!("Failed to write alignment JSON to stdout: {err}"));
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create output directory '{}': {err}",
                parent.display()
            )
        })?;
    }

    let mut file = File::create(path)
        .map_err(|err| format!("Failed to create output file '{}': {err}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, document).map_err(|err| {
        format!(
            "Failed to serialize alignment JSON '{}': {err}",
            path.display()
        )
    })?;
    file.write_all(b"\n")
        .map_err(|err| format!("Failed to finalize output file '{}': {err}", path.display()))?;
    Ok(())
}
