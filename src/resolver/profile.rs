use super::{Context, ResolvedParameters, SizeBudget, audio, image, pdf, video};
use crate::analyzer::AssetMetadata;
use crate::asset::MediaKind;
use crate::config::{AppConfig, AudioProfile, AudioTier, ImageProfile, ImageTier, PdfProfile, PdfTier, VideoProfile, VideoTier};
use crate::error::CompressError;

/// Capability descriptor of one media kind, selected by asset kind
#[derive(Debug, Clone, Copy)]
pub enum MediaProfile<'a> {
    Video(&'a VideoProfile),
    Image(&'a ImageProfile),
    Audio(&'a AudioProfile),
    Pdf(&'a PdfProfile),
}

impl<'a> MediaProfile<'a> {
    pub fn for_kind(kind: MediaKind, config: &'a AppConfig) -> Self {
        match kind {
            MediaKind::Video => MediaProfile::Video(&config.video),
            MediaKind::Image => MediaProfile::Image(&config.image),
            MediaKind::Audio => MediaProfile::Audio(&config.audio),
            MediaKind::Pdf => MediaProfile::Pdf(&config.pdf),
        }
    }

    /// Smallest size target that still holds a valid container
    pub fn min_target_bytes(&self) -> u64 {
        match self {
            MediaProfile::Video(p) => p.min_target_bytes,
            MediaProfile::Image(p) => p.min_target_bytes,
            MediaProfile::Audio(p) => p.min_target_bytes,
            MediaProfile::Pdf(p) => p.min_target_bytes,
        }
    }

    /// Whether size mode derives a bitrate from the duration
    pub fn needs_duration(&self) -> bool {
        matches!(self, MediaProfile::Video(_) | MediaProfile::Audio(_))
    }

    pub(crate) fn resolve_quality(
        &self,
        metadata: &AssetMetadata,
        value: u8,
        ctx: &Context<'_>,
    ) -> Result<ResolvedParameters, CompressError> {
        match self {
            MediaProfile::Video(p) => video::quality(p, metadata, value, ctx),
            MediaProfile::Image(p) => image::quality(p, metadata, value),
            MediaProfile::Audio(p) => audio::quality(p, metadata, value, ctx),
            MediaProfile::Pdf(p) => pdf::quality(p, value),
        }
    }

    pub(crate) fn resolve_size(
        &self,
        metadata: &AssetMetadata,
        budget: &SizeBudget,
        ctx: &Context<'_>,
    ) -> Result<ResolvedParameters, CompressError> {
        match self {
            MediaProfile::Video(p) => video::size(p, metadata, budget, ctx),
            MediaProfile::Image(p) => image::size(p, metadata, budget),
            MediaProfile::Audio(p) => audio::size(p, budget, ctx),
            MediaProfile::Pdf(p) => pdf::size(p, budget, ctx),
        }
    }
}

/// A row of a tier table
pub(crate) trait Tier {
    fn min_quality(&self) -> u8;
}

impl Tier for VideoTier {
    fn min_quality(&self) -> u8 {
        self.min_quality
    }
}

impl Tier for ImageTier {
    fn min_quality(&self) -> u8 {
        self.min_quality
    }
}

impl Tier for AudioTier {
    fn min_quality(&self) -> u8 {
        self.min_quality
    }
}

impl Tier for PdfTier {
    fn min_quality(&self) -> u8 {
        self.min_quality
    }
}

/// Highest tier whose threshold the quality value reaches
pub(crate) fn select_tier<T: Tier>(tiers: &[T], quality: u8) -> Result<&T, CompressError> {
    tiers
        .iter()
        .take_while(|t| t.min_quality() <= quality)
        .last()
        .or_else(|| tiers.first())
        .ok_or_else(|| CompressError::encode_failed("no quality tiers configured"))
}

/// Dimensions the visual kinds cannot resolve without
pub(crate) fn require_dimensions(metadata: &AssetMetadata) -> Result<(u32, u32), CompressError> {
    metadata
        .dimensions()
        .ok_or_else(|| CompressError::ProbeFailed("media dimensions are unknown".to_string()))
}
