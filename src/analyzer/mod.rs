pub mod ffprobe;
pub mod metadata;

pub use ffprobe::FfprobeProber;
pub use metadata::AssetMetadata;

use crate::asset::Asset;
use crate::error::CompressError;
use async_trait::async_trait;

/// Extracts intrinsic properties of an asset
#[async_trait]
pub trait Prober: Send + Sync {
    /// Read duration and/or dimensions, or fail with ProbeFailed
    async fn probe(&self, asset: &Asset) -> Result<AssetMetadata, CompressError>;
}
