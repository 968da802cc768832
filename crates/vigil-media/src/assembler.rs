//! Highlight assembly from a clip plan.
//!
//! The [`ClipAssembler`] trait is the seam between the pipeline and FFmpeg so
//! the orchestration can be exercised without the binary installed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use vigil_models::{ClipPlan, Segment};

use crate::clip::{concat_segments, extract_segment};
use crate::command::FfmpegRunner;
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::move_file;

/// Cuts and joins media files.
#[async_trait]
pub trait ClipAssembler: Send + Sync {
    /// Cut `segment` out of `source` into `output`.
    async fn extract(&self, source: &Path, segment: &Segment, output: &Path) -> MediaResult<()>;

    /// Join `clips` in order into `output`.
    async fn concat(&self, clips: &[PathBuf], output: &Path, expected_secs: u64) -> MediaResult<()>;
}

/// [`ClipAssembler`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegAssembler {
    runner: FfmpegRunner,
}

impl FfmpegAssembler {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ClipAssembler for FfmpegAssembler {
    async fn extract(&self, source: &Path, segment: &Segment, output: &Path) -> MediaResult<()> {
        extract_segment(&self.runner, source, segment, output).await
    }

    async fn concat(&self, clips: &[PathBuf], output: &Path, expected_secs: u64) -> MediaResult<()> {
        concat_segments(&self.runner, clips, output, expected_secs).await
    }
}

/// A finished highlight clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledClip {
    pub path: PathBuf,
    pub segment_count: usize,
    pub planned_duration_secs: u64,
}

/// Build the highlight for `plan` from `source`, writing it to `output`.
///
/// Segments are extracted into `work_dir` with at most `max_parallel`
/// extractions in flight. All extractions finish before concatenation
/// starts, and concatenation follows plan order regardless of which
/// extraction finished first. A single-segment plan skips concat.
pub async fn assemble_highlight(
    assembler: &dyn ClipAssembler,
    source: &Path,
    plan: &ClipPlan,
    work_dir: &Path,
    output: &Path,
    max_parallel: usize,
) -> MediaResult<AssembledClip> {
    if plan.is_empty() {
        return Err(MediaError::EmptyPlan);
    }
    if !source.exists() {
        return Err(MediaError::FileNotFound(source.to_path_buf()));
    }

    info!(
        segments = plan.len(),
        planned_secs = plan.total_duration_secs(),
        max_parallel = max_parallel,
        "Assembling highlight"
    );

    let permits = Arc::new(Semaphore::new(max_parallel.max(1)));
    let clip_paths: Vec<PathBuf> = (0..plan.len())
        .map(|i| work_dir.join(format!("segment_{:04}.mp4", i)))
        .collect();

    let extractions = plan.iter().zip(&clip_paths).map(|(segment, clip_path)| {
        let permits = Arc::clone(&permits);
        async move {
            let _permit = permits
                .acquire()
                .await
                .map_err(|_| MediaError::internal("Extraction semaphore closed"))?;
            assembler.extract(source, segment, clip_path).await
        }
    });

    let results = join_all(extractions).await;
    let failures = results.iter().filter(|r| r.is_err()).count();
    if let Some(err) = results.into_iter().find_map(Result::err) {
        warn!(
            failed = failures,
            total = plan.len(),
            "Segment extraction failed: {}",
            err
        );
        return Err(err);
    }

    if let [only] = clip_paths.as_slice() {
        move_file(only, output).await?;
    } else {
        assembler
            .concat(&clip_paths, output, plan.total_duration_secs())
            .await?;
    }

    info!(output = %output.display(), "Highlight assembled");

    Ok(AssembledClip {
        path: output.to_path_buf(),
        segment_count: plan.len(),
        planned_duration_secs: plan.total_duration_secs(),
    })
}
