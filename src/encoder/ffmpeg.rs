use super::command_builder::build_ffmpeg_args;
use super::{EncodeRequest, EncodingCapability, ProgressSender};
use crate::asset::{Asset, MediaKind};
use crate::config::EncoderConfig;
use crate::error::CompressError;
use async_trait::async_trait;
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Encodes images, video, and audio with the ffmpeg binary
#[derive(Debug, Clone)]
pub struct FfmpegCapability {
    config: EncoderConfig,
}

impl FfmpegCapability {
    pub fn new(config: &EncoderConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl EncodingCapability for FfmpegCapability {
    fn supports(&self, kind: MediaKind) -> bool {
        kind != MediaKind::Pdf
    }

    fn max_parallel(&self) -> usize {
        self.config.max_parallel
    }

    async fn encode(
        &self,
        request: EncodeRequest,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, CompressError> {
        // Both files are removed when they drop, whichever way this returns
        let input = write_input(&request.asset)?;
        let output = temp_output(&request.output_extension())?;

        let args = build_ffmpeg_args(&request.params, input.path(), output.path(), &self.config);
        info!(
            "Encoding: {} -> {} with ffmpeg",
            request.asset.name,
            output.path().display()
        );
        debug!("ffmpeg {}", args.join(" "));

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CompressError::encode_failed(format!("Failed to start ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CompressError::encode_failed("ffmpeg stdout unavailable"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CompressError::encode_failed("ffmpeg stderr unavailable"))?;

        let duration = request.params.duration_secs;
        let read_progress = async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(value) = parse_progress_line(&line, duration) {
                    let _ = progress.send(value);
                }
            }
        };
        let read_stderr = async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        };

        let (status, (), stderr_text) = tokio::select! {
            _ = cancel.cancelled() => return Err(CompressError::Cancelled),
            joined = async { tokio::join!(child.wait(), read_progress, read_stderr) } => joined,
        };

        let status = status
            .map_err(|e| CompressError::encode_failed(format!("Failed to wait for ffmpeg: {}", e)))?;
        if !status.success() {
            return Err(CompressError::encode_failed(failure_message(
                "ffmpeg",
                &status.to_string(),
                &stderr_text,
            )));
        }

        tokio::fs::read(output.path())
            .await
            .map_err(|e| CompressError::encode_failed(format!("Failed to read ffmpeg output: {}", e)))
    }
}

pub(crate) fn write_input(asset: &Asset) -> Result<NamedTempFile, CompressError> {
    asset
        .write_temp_copy("mediashrink_in_")
        .map_err(|e| CompressError::encode_failed(format!("Failed to write temp input: {}", e)))
}

pub(crate) fn temp_output(extension: &str) -> Result<NamedTempFile, CompressError> {
    tempfile::Builder::new()
        .prefix("mediashrink_out_")
        .suffix(&format!(".{}", extension))
        .tempfile()
        .map_err(|e| CompressError::encode_failed(format!("Failed to create temp file: {}", e)))
}

/// Progress percentage from one `-progress` line, if it carries one
pub(crate) fn parse_progress_line(line: &str, duration_secs: Option<f64>) -> Option<f32> {
    let line = line.trim();
    if line == "progress=end" {
        return Some(100.0);
    }
    let time_us = line
        .strip_prefix("out_time_us=")?
        .parse::<f64>()
        .ok()
        .filter(|t| *t > 0.0)?;
    let duration = duration_secs.filter(|d| *d > 0.0)?;
    Some((time_us / 1_000_000.0 / duration * 100.0).min(100.0) as f32)
}

/// Error text from the last 5 stderr lines
pub(crate) fn failure_message(tool: &str, status: &str, stderr: &str) -> String {
    if stderr.trim().is_empty() {
        return format!("{} failed with status: {}", tool, status);
    }
    let last_lines: Vec<&str> = stderr.lines().rev().take(5).collect();
    format!(
        "{} failed: {}",
        tool,
        last_lines.into_iter().rev().collect::<Vec<_>>().join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AssetMetadata;
    use crate::config::AppConfig;
    use crate::resolver::resolve;
    use crate::settings::{Objective, Settings};
    use tokio::sync::mpsc;

    #[test]
    fn test_parse_progress_line() {
        assert_eq!(parse_progress_line("out_time_us=5000000", Some(10.0)), Some(50.0));
        assert_eq!(parse_progress_line("out_time_us=20000000", Some(10.0)), Some(100.0));
        assert_eq!(parse_progress_line("out_time_us=0", Some(10.0)), None);
        assert_eq!(parse_progress_line("out_time_us=N/A", Some(10.0)), None);
        assert_eq!(parse_progress_line("out_time_us=5000000", None), None);
        assert_eq!(parse_progress_line("progress=end", None), Some(100.0));
        assert_eq!(parse_progress_line("progress=continue", Some(10.0)), None);
        assert_eq!(parse_progress_line("frame=120", Some(10.0)), None);
    }

    #[test]
    fn test_failure_message_keeps_last_lines() {
        let stderr = (1..=8).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        assert_eq!(
            failure_message("ffmpeg", "exit status: 1", &stderr),
            "ffmpeg failed: line 4\nline 5\nline 6\nline 7\nline 8"
        );
        assert_eq!(
            failure_message("gs", "exit status: 2", ""),
            "gs failed with status: exit status: 2"
        );
    }

    #[tokio::test]
    async fn test_missing_binary_fails_encode() {
        let mut config = AppConfig::default();
        config.encoder.ffmpeg_path = "/nonexistent/ffmpeg-binary".to_string();
        let capability = FfmpegCapability::new(&config.encoder);

        let asset = Asset::from_bytes("a.jpg", "image/jpeg", vec![0u8; 32], None).unwrap();
        let settings = Settings::new(Objective::quality(50));
        let meta = AssetMetadata::new(32).with_dimensions(10, 10);
        let params = resolve(MediaKind::Image, &meta, &settings, &config).unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = capability
            .encode(EncodeRequest::new(asset, params), tx, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CompressError::EncodeFailed { .. }));
    }
}
