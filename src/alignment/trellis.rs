use crate::error::AlignmentError;

/// Dense `(T+1) x (N+1)` table of best cumulative log-probabilities.
///
/// Cell `(t, n)` is the best score of having consumed `t` frames while
/// matching the first `n` tokens. Row-major, read-only once built.
#[derive(Debug, Clone)]
pub struct Trellis {
    num_frames: usize,
    num_tokens: usize,
    scores: Vec<f32>,
    ratio: f64,
}

impl Trellis {
    /// Builds the monotonic alignment table.
    ///
    /// `M[0][0] = 0`, `M[t][0]` accumulates blank emissions, `M[0][n>0] = -inf`,
    /// and every other cell takes the better of staying on token `n` (absorbing
    /// a blank-weighted frame) or advancing from `n-1` by emitting `token[n-1]`.
    pub fn build(
        log_probs: &[Vec<f32>],
        tokens: &[usize],
        blank_id: usize,
        input_sample_count: usize,
    ) -> Result<Self, AlignmentError> {
        validate_emissions(log_probs, tokens, blank_id)?;

        let num_frames = log_probs.len();
        let num_tokens = tokens.len();
        let cols = num_tokens + 1;
        let mut scores = vec![f32::NEG_INFINITY; (num_frames + 1) * cols];
        scores[0] = 0.0;

        for t in 1..=num_frames {
            let row = &log_probs[t - 1];
            let blank = row[blank_id];
            let (prev, curr) = scores.split_at_mut(t * cols);
            let prev = &prev[(t - 1) * cols..];
            let curr = &mut curr[..cols];

            curr[0] = prev[0] + blank;
            for n in 1..cols {
                let stay = prev[n] + blank;
                let advance = prev[n - 1] + row[tokens[n - 1]];
                curr[n] = stay.max(advance);
            }
        }

        let ratio = if num_frames == 0 {
            0.0
        } else {
            input_sample_count as f64 / num_frames as f64
        };

        tracing::debug!(
            frames = num_frames,
            tokens = num_tokens,
            ratio,
            final_score = scores[num_frames * cols + num_tokens],
            "trellis: built"
        );

        Ok(Self {
            num_frames,
            num_tokens,
            scores,
            ratio,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    /// Raw audio samples represented by one emission frame.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn get(&self, t: usize, n: usize) -> f32 {
        self.scores[t * (self.num_tokens + 1) + n]
    }

    /// Row with the best score in the "all tokens consumed" column.
    /// The earliest row wins ties; NaN never wins.
    pub fn best_final_frame(&self) -> usize {
        let mut best_t = 0;
        let mut best = f32::NEG_INFINITY;
        for t in 0..=self.num_frames {
            let score = self.get(t, self.num_tokens);
            if score > best {
                best = score;
                best_t = t;
            }
        }
        best_t
    }
}

fn validate_emissions(
    log_probs: &[Vec<f32>],
    tokens: &[usize],
    blank_id: usize,
) -> Result<(), AlignmentError> {
    let required_width = tokens
        .iter()
        .copied()
        .chain(std::iter::once(blank_id))
        .max()
        .unwrap_or(blank_id)
        + 1;
    if let Some((t, row)) = log_probs
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() < required_width)
    {
        return Err(AlignmentError::invalid_input(format!(
            "emission frame {t} has {} classes, need at least {required_width}",
            row.len()
        )));
    }
    Ok(())
}
