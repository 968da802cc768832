//! FFmpeg CLI wrapper for highlight assembly.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeouts via tokio
//! - Stream-copy segment extraction and concat demuxer joins
//! - Bounded-parallel highlight assembly behind the `ClipAssembler` trait
//! - Source footage download over HTTP

pub mod assembler;
pub mod clip;
pub mod command;
pub mod download;
pub mod error;
pub mod fs_utils;
pub mod progress;

pub use assembler::{assemble_highlight, AssembledClip, ClipAssembler, FfmpegAssembler};
pub use clip::{concat_segments, extract_segment};
pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use download::download_source;
pub use error::{MediaError, MediaResult};
pub use fs_utils::move_file;
pub use progress::{FfmpegProgress, ProgressCallback};
