use candle_core::{Device, Tensor, D};

#[cfg(feature = "onnx")]
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
#[cfg(feature = "onnx")]
use crate::pipeline::traits::EmissionProvider;
use crate::types::Emissions;

/// Converts a `[T x V]` logits buffer into log-probabilities with a
/// row-wise log-softmax.
pub fn emissions_from_logits(
    logits: Vec<f32>,
    num_frames: usize,
    vocab_size: usize,
    input_sample_count: usize,
    device: &Device,
) -> Result<Emissions, AlignmentError> {
    let expected_len = num_frames
        .checked_mul(vocab_size)
        .ok_or_else(|| AlignmentError::invalid_input("logits shape is too large"))?;
    if expected_len != logits.len() {
        return Err(AlignmentError::invalid_input(format!(
            "logits shape/data mismatch: shape implies {expected_len} values, got {}",
            logits.len()
        )));
    }
    if expected_len == 0 {
        return Ok(Emissions {
            log_probs: Vec::new(),
            input_sample_count,
        });
    }

    let logits = Tensor::from_vec(logits, (num_frames, vocab_size), device)
        .map_err(|e| AlignmentError::runtime("logits tensor creation", e))?;
    let log_probs = candle_nn::ops::log_softmax(&logits, D::Minus1)
        .and_then(|t| t.to_vec2::<f32>())
        .map_err(|e| AlignmentError::runtime("log_softmax", e))?;

    Ok(Emissions {
        log_probs,
        input_sample_count,
    })
}

/// Same as [`emissions_from_logits`] for model outputs shaped `[1, T, V]` or `[T, V]`.
pub fn emissions_from_raw_logits(
    dims: &[i64],
    logits: Vec<f32>,
    input_sample_count: usize,
) -> Result<Emissions, AlignmentError> {
    let (num_frames, vocab_size) = parse_logits_shape(dims)?;
    emissions_from_logits(
        logits,
        num_frames,
        vocab_size,
        input_sample_count,
        &Device::Cpu,
    )
}

fn parse_logits_shape(dims: &[i64]) -> Result<(usize, usize), AlignmentError> {
    match dims {
        [batch, t, v] => {
            if *batch != 1 {
                return Err(AlignmentError::invalid_input(format!(
                    "logits batch size must be 1, got {batch}"
                )));
            }
            Ok((non_negative_dim(*t, "time")?, positive_dim(*v, "vocab")?))
        }
        [t, v] => Ok((non_negative_dim(*t, "time")?, positive_dim(*v, "vocab")?)),
        _ => Err(AlignmentError::invalid_input(format!(
            "unsupported logits rank {}; expected [1, T, V] or [T, V]",
            dims.len()
        ))),
    }
}

fn non_negative_dim(value: i64, name: &'static str) -> Result<usize, AlignmentError> {
    usize::try_from(value).map_err(|_| {
        AlignmentError::invalid_input(format!("logits {name} dimension must be >= 0, got {value}"))
    })
}

fn positive_dim(value: i64, name: &'static str) -> Result<usize, AlignmentError> {
    match non_negative_dim(value, name)? {
        0 => Err(AlignmentError::invalid_input(format!(
            "logits {name} dimension must be > 0"
        ))),
        dim => Ok(dim),
    }
}

/// Zero-mean, unit-variance scaling expected by wav2vec2-style encoders.
pub fn normalize_waveform(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&x| x as f64).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&x| {
            let d = x as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let std = var.sqrt().max(1e-7);
    samples
        .iter()
        .map(|&x| ((x as f64 - mean) / std) as f32)
        .collect()
}

#[cfg(feature = "onnx")]
pub(crate) fn build_emission_provider(
    config: &AlignerConfig,
) -> Result<Box<dyn EmissionProvider>, AlignmentError> {
    Ok(Box::new(OnnxEmissionProvider::load(config)?))
}

#[cfg(not(feature = "onnx"))]
pub(crate) fn build_emission_provider(
    _config: &crate::config::AlignerConfig,
) -> Result<Box<dyn crate::pipeline::traits::EmissionProvider>, AlignmentError> {
    Err(AlignmentError::runtime(
        "build emission provider",
        "ONNX runtime support is disabled; enable the `onnx` cargo feature or supply a provider",
    ))
}

/// Exported CTC acoustic model run through ONNX Runtime.
///
/// The session sits behind a mutex: one inference at a time per device context.
#[cfg(feature = "onnx")]
pub struct OnnxEmissionProvider {
    session: std::sync::Mutex<ort::session::Session>,
    device_label: String,
}

#[cfg(feature = "onnx")]
impl OnnxEmissionProvider {
    pub fn load(config: &AlignerConfig) -> Result<Self, AlignmentError> {
        let device_label = parse_onnx_device(config.device.as_str())?;
        let execution_providers = match device_label {
            "cuda" => vec![
                ort::ep::CUDA::default()
                    .with_device_id(0)
                    .build()
                    .error_on_failure(),
                ort::ep::CPU::default().build(),
            ],
            _ => vec![ort::ep::CPU::default().build()],
        };
        let session = ort::session::Session::builder()
            .map_err(|e| AlignmentError::runtime("onnx session builder", e))?
            .with_execution_providers(execution_providers)
            .map_err(|e| AlignmentError::runtime("onnx execution providers", e))?
            .commit_from_file(std::path::Path::new(&config.model_path))
            .map_err(|e| AlignmentError::runtime("onnx model load", e))?;

        tracing::info!(
            language = %config.language,
            inputs = session.inputs().len(),
            outputs = session.outputs().len(),
            model_path = %config.model_path,
            device = device_label,
            "emission model loaded"
        );

        Ok(Self {
            session: std::sync::Mutex::new(session),
            device_label: device_label.to_string(),
        })
    }
}

#[cfg(feature = "onnx")]
impl EmissionProvider for OnnxEmissionProvider {
    fn infer(&self, samples: &[f32]) -> Result<Emissions, AlignmentError> {
        let normalized = normalize_waveform(samples);
        let input =
            ort::value::TensorRef::from_array_view(([1usize, normalized.len()], &normalized[..]))
                .map_err(|e| AlignmentError::runtime("onnx input tensor", e))?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| AlignmentError::runtime("onnx session lock", "session mutex poisoned"))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| AlignmentError::runtime("onnx forward pass", e))?;
        if outputs.len() == 0 {
            return Err(AlignmentError::runtime(
                "onnx forward pass",
                "model produced no outputs",
            ));
        }
        let (shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AlignmentError::runtime("onnx extract logits", e))?;
        let dims: Vec<i64> = shape.iter().copied().collect();
        let logits = logits.to_vec();
        drop(outputs);
        drop(session);

        emissions_from_raw_logits(&dims, logits, samples.len())
    }

    fn device_label(&self) -> String {
        self.device_label.clone()
    }
}

#[cfg(feature = "onnx")]
fn parse_onnx_device(device: &str) -> Result<&'static str, AlignmentError> {
    if device.eq_ignore_ascii_case("cpu") {
        Ok("cpu")
    } else if device.eq_ignore_ascii_case("cuda") {
        Ok("cuda")
    } else {
        Err(AlignmentError::invalid_input(format!(
            "unsupported ONNX device '{device}', expected 'cpu' or 'cuda'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_softmax_rows_are_stochastic() {
        let logits = vec![2.0, 1.0, 0.1, -3.0, 0.0, 5.0];
        let emissions = emissions_from_logits(logits, 2, 3, 640, &Device::Cpu).unwrap();

        assert_eq!(emissions.num_frames(), 2);
        assert_eq!(emissions.vocab_size(), 3);
        assert_eq!(emissions.input_sample_count, 640);
        for row in &emissions.log_probs {
            let total: f32 = row.iter().map(|lp| lp.exp()).sum();
            assert!((total - 1.0).abs() < 1e-5);
            assert!(row.iter().all(|lp| *lp <= 0.0));
        }
        // argmax is preserved
        assert!(emissions.log_probs[1][2] > emissions.log_probs[1][0]);
    }

    #[test]
    fn shape_data_mismatch_is_rejected() {
        let err = emissions_from_logits(vec![0.0; 5], 2, 3, 0, &Device::Cpu).unwrap_err();
        assert!(err.to_string().contains("shape/data mismatch"));
    }

    #[test]
    fn batched_logits_are_accepted() {
        let emissions = emissions_from_raw_logits(&[1, 2, 2], vec![0.0; 4], 100).unwrap();
        assert_eq!(emissions.num_frames(), 2);
        assert!((emissions.log_probs[0][0] - 0.5f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn non_unit_batch_is_rejected() {
        let err = emissions_from_raw_logits(&[2, 2, 2], vec![0.0; 8], 0).unwrap_err();
        assert!(err.to_string().contains("batch size must be 1"));
    }

    #[test]
    fn empty_time_axis_gives_no_frames() {
        let emissions = emissions_from_raw_logits(&[0, 32], Vec::new(), 0).unwrap();
        assert_eq!(emissions.num_frames(), 0);
    }

    #[test]
    fn normalize_waveform_centers_and_scales() {
        let normalized = normalize_waveform(&[1.0, 3.0, 1.0, 3.0]);
        let mean: f32 = normalized.iter().sum::<f32>() / 4.0;
        assert!(mean.abs() < 1e-6);
        assert!((normalized[0] + 1.0).abs() < 1e-5);
        assert!(normalize_waveform(&[]).is_empty());
    }
}
