use super::profile::{require_dimensions, select_tier};
use super::{RateControl, ResolvedParameters, SizeBudget, scaled_dimensions};
use crate::analyzer::AssetMetadata;
use crate::asset::MediaKind;
use crate::config::ImageProfile;
use crate::error::CompressError;

fn with_scale(mut params: ResolvedParameters, width: u32, height: u32, scale: f64) -> ResolvedParameters {
    let (out_w, out_h) = scaled_dimensions(width, height, scale, false);
    params.scale = scale;
    params.width = Some(out_w);
    params.height = Some(out_h);
    params
}

pub(super) fn quality(
    profile: &ImageProfile,
    metadata: &AssetMetadata,
    value: u8,
) -> Result<ResolvedParameters, CompressError> {
    let (width, height) = require_dimensions(metadata)?;
    let tier = select_tier(&profile.tiers, value)?;

    let longest = width.max(height);
    let scale = (f64::from(tier.max_dimension) / f64::from(longest)).min(1.0);
    let factor = value.clamp(profile.min_quality_factor, 100);

    let params = ResolvedParameters::new(MediaKind::Image, RateControl::Quality { factor });
    Ok(with_scale(params, width, height, scale))
}

/// Quality factor from the bit budget per source pixel; tight budgets also downscale
pub(super) fn size(
    profile: &ImageProfile,
    metadata: &AssetMetadata,
    budget: &SizeBudget,
) -> Result<ResolvedParameters, CompressError> {
    let (width, height) = require_dimensions(metadata)?;

    let pixels = f64::from(width) * f64::from(height);
    let bits_per_pixel = budget.payload_bits() / pixels;

    let span = f64::from(profile.max_quality_factor.saturating_sub(profile.min_quality_factor));
    let fill = (bits_per_pixel / profile.reference_bits_per_pixel).min(1.0);
    let factor = profile
        .min_quality_factor
        .saturating_add((span * fill).round() as u8);

    let scale = if bits_per_pixel < profile.min_bits_per_pixel {
        (bits_per_pixel / profile.min_bits_per_pixel)
            .sqrt()
            .max(profile.min_scale)
            .min(1.0)
    } else {
        1.0
    };

    let mut params = ResolvedParameters::new(MediaKind::Image, RateControl::Quality { factor });
    params.predicted_bytes = Some(budget.target_bytes);
    Ok(with_scale(params, width, height, scale))
}
