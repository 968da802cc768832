//! Segment extraction and concatenation.
//!
//! Highlights are built with stream copy throughout: each planned segment is
//! cut out of the source with output seeking, then the pieces are joined
//! with the concat demuxer. Nothing is re-encoded, so cut points snap to
//! the nearest keyframe.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use vigil_models::Segment;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Cut one segment out of `input` into `output` without re-encoding.
pub async fn extract_segment(
    runner: &FfmpegRunner,
    input: &Path,
    segment: &Segment,
    output: &Path,
) -> MediaResult<()> {
    let start = segment.start_text();
    let end = segment.end_text();

    debug!(
        input = %input.display(),
        output = %output.display(),
        start = %start,
        end = %end,
        "Extracting segment"
    );

    let cmd = FfmpegCommand::new(input, output)
        .start_at(start)
        .stop_at(end)
        .codec_copy();

    runner.run(&cmd).await.map_err(|e| match e {
        MediaError::FfmpegFailed {
            stderr, exit_code, ..
        } => MediaError::ffmpeg_failed(
            format!("Segment {}-{} extraction failed", segment.start_text(), segment.end_text()),
            stderr,
            exit_code,
        ),
        other => other,
    })?;

    if !output.exists() {
        return Err(MediaError::FileNotFound(output.to_path_buf()));
    }

    Ok(())
}

/// Join `inputs` in order into `output` with the concat demuxer.
///
/// `expected_secs` is the planned total length, used only for progress logs.
pub async fn concat_segments(
    runner: &FfmpegRunner,
    inputs: &[PathBuf],
    output: &Path,
    expected_secs: u64,
) -> MediaResult<()> {
    if inputs.is_empty() {
        return Err(MediaError::EmptyPlan);
    }

    let list_path = output.with_extension("concat.txt");
    tokio::fs::write(&list_path, concat_list_body(inputs)).await?;

    info!(
        segments = inputs.len(),
        output = %output.display(),
        "Concatenating segments"
    );

    let cmd = FfmpegCommand::new(&list_path, output)
        .concat_demuxer()
        .codec_copy()
        .faststart();

    let total_ms = (expected_secs * 1000) as i64;
    let result = runner
        .run_with_progress(&cmd, move |progress| {
            debug!("Concat progress: {:.0}%", progress.percentage(total_ms));
        })
        .await;

    // Clean up concat list
    let _ = tokio::fs::remove_file(&list_path).await;

    result.map_err(|e| match e {
        MediaError::FfmpegFailed {
            stderr, exit_code, ..
        } => MediaError::ffmpeg_failed("Concat failed", stderr, exit_code),
        other => other,
    })
}

/// Concat demuxer list with one `file '...'` line per input.
pub(crate) fn concat_list_body(inputs: &[PathBuf]) -> String {
    let mut body = String::new();
    for path in inputs {
        // Single quotes inside a quoted path close, escape, and reopen
        let escaped = path.to_string_lossy().replace('\'', r"'\''");
        body.push_str("file '");
        body.push_str(&escaped);
        body.push_str("'\n");
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_list_body() {
        let inputs = vec![
            PathBuf::from("/tmp/work/segment_0000.mp4"),
            PathBuf::from("/tmp/work/segment_0001.mp4"),
        ];
        assert_eq!(
            concat_list_body(&inputs),
            "file '/tmp/work/segment_0000.mp4'\nfile '/tmp/work/segment_0001.mp4'\n"
        );
    }

    #[test]
    fn test_concat_list_escapes_quotes() {
        let inputs = vec![PathBuf::from("/tmp/bob's footage/segment_0000.mp4")];
        assert_eq!(
            concat_list_body(&inputs),
            "file '/tmp/bob'\\''s footage/segment_0000.mp4'\n"
        );
    }

    #[tokio::test]
    async fn test_concat_rejects_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = concat_segments(&FfmpegRunner::new(), &[], &dir.path().join("out.mp4"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EmptyPlan));
    }
}
