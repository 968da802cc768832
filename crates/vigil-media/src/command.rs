//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, parse_progress_line, FfmpegProgress};

/// Number of non-progress stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add multiple input arguments.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Start the output at a timestamp (`-ss` after the input).
    pub fn start_at(self, timestamp: impl Into<String>) -> Self {
        self.output_arg("-ss").output_arg(timestamp)
    }

    /// Stop the output at a timestamp (`-to` after the input).
    pub fn stop_at(self, timestamp: impl Into<String>) -> Self {
        self.output_arg("-to").output_arg(timestamp)
    }

    /// Copy all streams without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Read the input as an FFmpeg concat list.
    pub fn concat_demuxer(self) -> Self {
        self.input_args(["-f", "concat", "-safe", "0"])
    }

    /// Move the moov atom to the front so the result streams progressively.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("+faststart")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking and cancellation.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    /// Executable name or path
    program: PathBuf,
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            cancel_rx: None,
            timeout_secs: None,
        }
    }
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific FFmpeg executable instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Set cancellation signal. Sending `true` kills the running process.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command with progress callback.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        let program =
            which::which(&self.program).map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", program.display(), args.join(" "));

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr was not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        // Progress blocks go to the callback, everything else is kept for error reports
        let stderr_handle = tokio::spawn(async move {
            let mut current_progress = FfmpegProgress::default();
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                if is_progress_line(&line) {
                    if let Some(progress) = parse_progress_line(&line, &mut current_progress) {
                        progress_callback(progress);
                    }
                } else if !line.trim().is_empty() {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }

            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let status = self.wait_for_completion(&mut child).await;
        let stderr_tail = stderr_handle.await.unwrap_or_default();
        let status = status?;

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                (!stderr_tail.is_empty()).then_some(stderr_tail),
                status.code(),
            ))
        }
    }

    /// Wait for child process with cancellation and timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let mut cancel_rx = self.cancel_rx.clone();
        let cancelled = async move {
            match cancel_rx.as_mut() {
                Some(rx) => loop {
                    if *rx.borrow_and_update() {
                        return;
                    }
                    if rx.changed().await.is_err() {
                        // Sender dropped without cancelling
                        std::future::pending::<()>().await;
                    }
                },
                None => std::future::pending::<()>().await,
            }
        };

        let timeout_secs = self.timeout_secs;
        let timed_out = async move {
            match timeout_secs {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            status = child.wait() => Ok(status?),
            _ = cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
            _ = timed_out => {
                let secs = timeout_secs.unwrap_or_default();
                warn!("FFmpeg timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(secs))
            }
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
