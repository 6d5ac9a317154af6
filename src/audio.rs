use std::path::{Path, PathBuf};

use claxon::FlacReader;

use crate::error::AlignmentError;

/// Where the audio for one alignment request comes from.
#[derive(Debug, Clone)]
pub enum AudioSource {
    RawSamples {
        samples: Vec<f32>,
        sample_rate_hz: u32,
    },
    /// `.wav` or `.flac`; decoded to mono when resolved.
    FilePath(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate_hz: u32,
}

impl AudioSource {
    pub fn resolve(&self) -> Result<Waveform, AlignmentError> {
        match self {
            Self::RawSamples {
                samples,
                sample_rate_hz,
            } => Ok(Waveform {
                samples: samples.clone(),
                sample_rate_hz: *sample_rate_hz,
            }),
            Self::FilePath(path) => read_audio_file(path),
        }
    }
}

impl Waveform {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate_hz as f64
    }

    /// Samples in `[start_secs, end_secs)`, clamped to the waveform bounds.
    pub fn slice_secs(&self, start_secs: f64, end_secs: f64) -> Vec<f32> {
        let rate = self.sample_rate_hz as f64;
        let len = self.samples.len();
        let start = ((start_secs.max(0.0) * rate) as usize).min(len);
        let end = ((end_secs.max(0.0) * rate) as usize).clamp(start, len);
        self.samples[start..end].to_vec()
    }
}

pub fn read_audio_file(path: &Path) -> Result<Waveform, AlignmentError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("flac") => read_flac_mono(path),
        Some("wav") => read_wav_mono(path),
        _ => Err(AlignmentError::invalid_input(format!(
            "unsupported audio file '{}', expected .wav or .flac",
            path.display()
        ))),
    }
}

fn read_flac_mono(path: &Path) -> Result<Waveform, AlignmentError> {
    let mut reader =
        FlacReader::open(path).map_err(|e| AlignmentError::runtime("decode FLAC", e))?;
    let streaminfo = reader.streaminfo();
    let channels = streaminfo.channels as usize;
    let bits_per_sample = streaminfo.bits_per_sample as i32;
    let scale = if bits_per_sample > 1 {
        ((1_i64 << (bits_per_sample - 1)) - 1) as f32
    } else {
        1.0
    };
    if channels == 0 {
        return Err(AlignmentError::invalid_input(format!(
            "FLAC has zero channels: {}",
            path.display()
        )));
    }

    let mut interleaved = Vec::new();
    for sample in reader.samples() {
        let sample = sample.map_err(|e| AlignmentError::runtime("read FLAC sample", e))?;
        interleaved.push(sample as f32 / scale);
    }
    Ok(Waveform {
        samples: downmix(interleaved, channels),
        sample_rate_hz: streaminfo.sample_rate,
    })
}

fn read_wav_mono(path: &Path) -> Result<Waveform, AlignmentError> {
    let reader = hound::WavReader::open(path).map_err(|e| AlignmentError::runtime("open WAV", e))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AlignmentError::invalid_input(format!(
            "WAV has zero channels: {}",
            path.display()
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<_, _>>()
                .map_err(|e| AlignmentError::runtime("read WAV sample", e))?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AlignmentError::runtime("read WAV sample", e))?,
    };
    Ok(Waveform {
        samples: downmix(interleaved, channels),
        sample_rate_hz: spec.sample_rate,
    })
}

fn downmix(interleaved: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved;
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
