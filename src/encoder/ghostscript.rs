use super::command_builder::build_ghostscript_args;
use super::ffmpeg::{failure_message, temp_output, write_input};
use super::{EncodeRequest, EncodingCapability, ProgressSender};
use crate::asset::MediaKind;
use crate::config::{EncoderConfig, PdfProfile};
use crate::error::CompressError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Re-renders PDFs with downsampled images through Ghostscript.
///
/// Ghostscript reports no progress; the driver publishes 100 on completion.
#[derive(Debug, Clone)]
pub struct GhostscriptCapability {
    binary: String,
    base_dpi: u32,
}

impl GhostscriptCapability {
    pub fn new(config: &EncoderConfig, profile: &PdfProfile) -> Self {
        Self {
            binary: config.ghostscript_path.clone(),
            base_dpi: profile.base_dpi,
        }
    }
}

#[async_trait]
impl EncodingCapability for GhostscriptCapability {
    fn supports(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Pdf
    }

    async fn encode(
        &self,
        request: EncodeRequest,
        _progress: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, CompressError> {
        let input = write_input(&request.asset)?;
        let output = temp_output("pdf")?;
        let args = build_ghostscript_args(&request.params, self.base_dpi, input.path(), output.path());
        info!("Rewriting {} with ghostscript", request.asset.name);

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CompressError::encode_failed(format!("Failed to start ghostscript: {}", e)))?;

        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(CompressError::Cancelled),
            result = child.wait_with_output() => result,
        };
        let result = result
            .map_err(|e| CompressError::encode_failed(format!("Failed to wait for ghostscript: {}", e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(CompressError::encode_failed(failure_message(
                "ghostscript",
                &result.status.to_string(),
                &stderr,
            )));
        }

        tokio::fs::read(output.path())
            .await
            .map_err(|e| CompressError::encode_failed(format!("Failed to read ghostscript output: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_supports_only_pdf() {
        let config = AppConfig::default();
        let gs = GhostscriptCapability::new(&config.encoder, &config.pdf);
        assert!(gs.supports(MediaKind::Pdf));
        assert!(!gs.supports(MediaKind::Image));
        assert_eq!(gs.max_parallel(), 1);
    }
}
