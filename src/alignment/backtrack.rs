use crate::alignment::trellis::Trellis;
use crate::error::AlignmentError;
use crate::types::{AlignmentPath, Point};

/// Recovers the best token/frame path by walking the trellis backwards from
/// the best-scoring row of the final column.
///
/// At each frame the walk advances to the previous token only when that
/// transition scores strictly higher than staying, so ties are resolved the
/// same way on every run. Frames before the first token are dropped.
pub fn backtrack(
    trellis: &Trellis,
    log_probs: &[Vec<f32>],
    tokens: &[usize],
    blank_id: usize,
) -> Result<AlignmentPath, AlignmentError> {
    let num_tokens = tokens.len();
    if num_tokens == 0 {
        return Ok(AlignmentPath {
            points: Vec::new(),
            ratio: trellis.ratio(),
        });
    }

    let t_start = trellis.best_final_frame();
    let mut j = num_tokens;
    let mut points = Vec::with_capacity(t_start);
    let mut fully_consumed = false;

    for t in (1..=t_start).rev() {
        let row = &log_probs[t - 1];
        let stayed = trellis.get(t - 1, j) + row[blank_id];
        let changed = trellis.get(t - 1, j - 1) + row[tokens[j - 1]];
        let transition = changed > stayed;
        let emitted = if transition { tokens[j - 1] } else { blank_id };

        points.push(Point {
            token_index: j - 1,
            time_index: t - 1,
            prob: row[emitted].exp(),
        });

        if transition {
            j -= 1;
            if j == 0 {
                fully_consumed = true;
                break;
            }
        }
    }

    if !fully_consumed {
        tracing::debug!(
            frames = trellis.num_frames(),
            tokens = num_tokens,
            remaining = j,
            "backtrack: path ran out of frames"
        );
        return Err(AlignmentError::AlignmentFailure {
            frames: trellis.num_frames(),
            tokens: num_tokens,
        });
    }

    points.reverse();
    Ok(AlignmentPath {
        points,
        ratio: trellis.ratio(),
    })
}
