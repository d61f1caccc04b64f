pub mod command_builder;
pub mod driver;
pub mod ffmpeg;
pub mod ghostscript;
pub mod progress;
pub mod toolchain;

pub use driver::EncodeDriver;
pub use ffmpeg::FfmpegCapability;
pub use ghostscript::GhostscriptCapability;
pub use progress::ProgressTracker;
pub use toolchain::Toolchain;

use crate::asset::{Asset, MediaKind};
use crate::error::CompressError;
use crate::resolver::ResolvedParameters;
use crate::settings::ImageFormat;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Raw progress values (0-100) reported by a capability
pub type ProgressSender = mpsc::UnboundedSender<f32>;

/// One encode handed to a capability
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    pub asset: Asset,
    pub params: ResolvedParameters,
}

impl EncodeRequest {
    pub fn new(asset: Asset, params: ResolvedParameters) -> Self {
        Self { asset, params }
    }

    /// Extension of the encoded output
    pub fn output_extension(&self) -> String {
        let source = self.asset.extension();
        match self.params.kind {
            MediaKind::Video => "mp4".to_string(),
            MediaKind::Pdf => "pdf".to_string(),
            MediaKind::Audio => match source.as_deref() {
                Some("mp3") => "mp3".to_string(),
                _ => "m4a".to_string(),
            },
            MediaKind::Image => self
                .params
                .image_format
                .or_else(|| source.as_deref().and_then(ImageFormat::from_extension))
                .unwrap_or(ImageFormat::Jpeg)
                .extension()
                .to_string(),
        }
    }
}

/// An external encoder able to re-encode some media kinds.
///
/// Implementations must stop their work once the future is dropped or the
/// token is cancelled, leaving no processes or temp files behind.
#[async_trait]
pub trait EncodingCapability: Send + Sync {
    fn supports(&self, kind: MediaKind) -> bool;

    /// Encodes the capability can run at once
    fn max_parallel(&self) -> usize {
        1
    }

    async fn encode(
        &self,
        request: EncodeRequest,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, CompressError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AssetMetadata;
    use crate::config::AppConfig;
    use crate::resolver::resolve;
    use crate::settings::{Modifiers, Objective, Settings};

    fn request(name: &str, mime: &str, kind: MediaKind, meta: AssetMetadata, settings: &Settings) -> EncodeRequest {
        let asset = Asset::from_bytes(name, mime, vec![0u8; 16], None).unwrap();
        let params = resolve(kind, &meta, settings, &AppConfig::default()).unwrap();
        EncodeRequest::new(asset, params)
    }

    #[test]
    fn test_output_extension() {
        let settings = Settings::new(Objective::quality(50));
        let video = request(
            "clip.mov",
            "video/quicktime",
            MediaKind::Video,
            AssetMetadata::new(1_000).with_dimensions(640, 480),
            &settings,
        );
        assert_eq!(video.output_extension(), "mp4");

        let audio = request(
            "song.mp3",
            "audio/mpeg",
            MediaKind::Audio,
            AssetMetadata::new(1_000).with_duration(10.0),
            &settings,
        );
        assert_eq!(audio.output_extension(), "mp3");

        let png = request(
            "shot.png",
            "image/png",
            MediaKind::Image,
            AssetMetadata::new(1_000).with_dimensions(64, 64),
            &settings,
        );
        assert_eq!(png.output_extension(), "png");

        let webp_settings = settings.clone().with_modifiers(Modifiers {
            image_format: Some(ImageFormat::Webp),
            ..Default::default()
        });
        let webp = request(
            "shot.png",
            "image/png",
            MediaKind::Image,
            AssetMetadata::new(1_000).with_dimensions(64, 64),
            &webp_settings,
        );
        assert_eq!(webp.output_extension(), "webp");
    }
}
