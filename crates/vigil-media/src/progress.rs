//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Processing speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether processing is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Calculate progress percentage given total duration in milliseconds.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).clamp(0.0, 100.0)
    }
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(FfmpegProgress) + Send + 'static>;

/// Parse a progress line from FFmpeg's `-progress` output.
///
/// Returns a snapshot at the end of every progress block.
pub(crate) fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let (key, value) = line.trim().split_once('=')?;

    match key {
        "out_time_us" | "out_time_ms" => {
            // Both keys carry microseconds despite the name
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "out_time" => {
            current.out_time = value.to_string();
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "speed" => {
            // Format: "1.5x" or "N/A"
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            return Some(current.clone());
        }
        _ => {}
    }

    None
}

/// Whether a stderr line belongs to the `-progress` key/value stream.
pub(crate) fn is_progress_line(line: &str) -> bool {
    match line.trim().split_once('=') {
        Some((key, _)) => !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = FfmpegProgress {
            out_time_ms: 5000,
            ..Default::default()
        };

        assert!((progress.percentage(10000) - 50.0).abs() < 0.01);
        assert!((progress.percentage(5000) - 100.0).abs() < 0.01);
        assert!((progress.percentage(2500) - 100.0).abs() < 0.01);
        assert_eq!(progress.percentage(0), 0.0);
    }

    #[test]
    fn test_progress_parsing() {
        let mut progress = FfmpegProgress::default();

        assert!(parse_progress_line("out_time_us=5000000", &mut progress).is_none());
        assert_eq!(progress.out_time_ms, 5000);

        parse_progress_line("speed=1.5x", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        parse_progress_line("speed=N/A", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        let result = parse_progress_line("progress=end", &mut progress);
        assert!(result.is_some());
        assert!(progress.is_complete);
    }

    #[test]
    fn test_progress_line_detection() {
        assert!(is_progress_line("frame=120"));
        assert!(is_progress_line("out_time=00:00:05.000000"));
        assert!(!is_progress_line("[mp4 @ 0x55] moov atom not found"));
        assert!(!is_progress_line("input.mp4: Invalid data found when processing input"));
    }
}
