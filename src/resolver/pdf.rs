use super::profile::select_tier;
use super::{Context, RateControl, ResolvedParameters, SizeBudget};
use crate::asset::MediaKind;
use crate::config::PdfProfile;
use crate::error::CompressError;

pub(super) fn quality(profile: &PdfProfile, value: u8) -> Result<ResolvedParameters, CompressError> {
    let tier = select_tier(&profile.tiers, value)?;
    let scale = (f64::from(tier.dpi) / f64::from(profile.base_dpi)).min(1.0);

    let mut params = ResolvedParameters::new(MediaKind::Pdf, RateControl::Quality { factor: value });
    params.scale = scale;
    Ok(params)
}

/// PDFs have no bitrate; the kept fraction of the reachable range picks a tier.
/// Ghostscript output size is not predictable from the DPI alone.
pub(super) fn size(
    profile: &PdfProfile,
    budget: &SizeBudget,
    ctx: &Context<'_>,
) -> Result<ResolvedParameters, CompressError> {
    let kept = budget.target_bytes as f64 / budget.original_bytes.max(1) as f64;
    let equivalent = (100.0 * kept / ctx.resolver.unreachable_ratio)
        .round()
        .clamp(0.0, 100.0) as u8;
    quality(profile, equivalent)
}
