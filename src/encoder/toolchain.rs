use super::{EncodeRequest, EncodingCapability, FfmpegCapability, GhostscriptCapability, ProgressSender};
use crate::asset::MediaKind;
use crate::config::AppConfig;
use crate::error::CompressError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Routes every media kind to the external tool that handles it
#[derive(Debug, Clone)]
pub struct Toolchain {
    ffmpeg: FfmpegCapability,
    ghostscript: GhostscriptCapability,
}

impl Toolchain {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ffmpeg: FfmpegCapability::new(&config.encoder),
            ghostscript: GhostscriptCapability::new(&config.encoder, &config.pdf),
        }
    }

    fn route(&self, kind: MediaKind) -> &dyn EncodingCapability {
        match kind {
            MediaKind::Pdf => &self.ghostscript,
            MediaKind::Image | MediaKind::Video | MediaKind::Audio => &self.ffmpeg,
        }
    }
}

#[async_trait]
impl EncodingCapability for Toolchain {
    fn supports(&self, kind: MediaKind) -> bool {
        self.route(kind).supports(kind)
    }

    fn max_parallel(&self) -> usize {
        self.ffmpeg.max_parallel()
    }

    async fn encode(
        &self,
        request: EncodeRequest,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, CompressError> {
        self.route(request.params.kind)
            .encode(request, progress, cancel)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolchain_covers_every_kind() {
        let toolchain = Toolchain::from_config(&AppConfig::default());
        for kind in [MediaKind::Image, MediaKind::Video, MediaKind::Audio, MediaKind::Pdf] {
            assert!(toolchain.supports(kind), "{} unsupported", kind);
        }
    }
}
