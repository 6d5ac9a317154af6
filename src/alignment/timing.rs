/// Absorbs binary floating-point error before truncating to hundredths, so
/// 0.29 s prints as `00:00:00.29` instead of `00:00:00.28`.
const CENTISECOND_EPSILON: f64 = 1e-6;

/// Absolute seconds of an emission frame boundary.
pub fn frame_to_seconds(
    frame: usize,
    ratio: f64,
    sample_rate_hz: u32,
    begin_offset_secs: f64,
) -> f64 {
    if sample_rate_hz == 0 {
        return begin_offset_secs;
    }
    begin_offset_secs + frame as f64 * (ratio / sample_rate_hz as f64)
}

/// Formats as `HH:MM:SS.ff`, truncating (never rounding) to hundredths.
/// Negative and non-finite inputs format as zero.
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total_cs = (seconds * 100.0 + CENTISECOND_EPSILON).floor() as u64;
    let cs = total_cs % 100;
    let total_secs = total_cs / 100;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}.{cs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_scale_by_ratio_and_rate() {
        // 320 samples per frame at 16 kHz = 20 ms per frame
        assert!((frame_to_seconds(50, 320.0, 16_000, 0.0) - 1.0).abs() < 1e-9);
        assert!((frame_to_seconds(50, 320.0, 16_000, 12.5) - 13.5).abs() < 1e-9);
        assert_eq!(frame_to_seconds(0, 320.0, 16_000, 3.0), 3.0);
    }

    #[test]
    fn zero_sample_rate_keeps_offset() {
        assert_eq!(frame_to_seconds(10, 320.0, 0, 2.0), 2.0);
    }

    #[test]
    fn format_truncates_instead_of_rounding() {
        assert_eq!(format_timestamp(1.239), "00:00:01.23");
        assert_eq!(format_timestamp(59.999), "00:00:59.99");
    }

    #[test]
    fn format_survives_binary_fractions() {
        assert_eq!(format_timestamp(0.29), "00:00:00.29");
        assert_eq!(format_timestamp(4.35), "00:00:04.35");
    }

    #[test]
    fn format_carries_minutes_and_hours() {
        assert_eq!(format_timestamp(3725.5), "01:02:05.50");
        assert_eq!(format_timestamp(0.0), "00:00:00.00");
    }

    #[test]
    fn format_clamps_invalid_values() {
        assert_eq!(format_timestamp(-3.0), "00:00:00.00");
        assert_eq!(format_timestamp(f64::NAN), "00:00:00.00");
    }
}
