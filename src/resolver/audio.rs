use super::profile::select_tier;
use super::{Context, RateControl, ResolvedParameters, SizeBudget, clamp_floor};
use crate::analyzer::AssetMetadata;
use crate::asset::MediaKind;
use crate::config::AudioProfile;
use crate::error::CompressError;

pub(super) fn quality(
    profile: &AudioProfile,
    metadata: &AssetMetadata,
    value: u8,
    ctx: &Context<'_>,
) -> Result<ResolvedParameters, CompressError> {
    let tier = select_tier(&profile.tiers, value)?;
    let duration = metadata.usable_duration();

    let mut params = ResolvedParameters::new(
        MediaKind::Audio,
        RateControl::Bitrate { bps: tier.bitrate },
    );
    params.duration_secs = duration;
    params.predicted_bytes = duration.map(|d| ctx.predict_bytes(tier.bitrate, d));
    Ok(params)
}

/// Audio only: the whole payload budget goes to the one track
pub(super) fn size(
    profile: &AudioProfile,
    budget: &SizeBudget,
    ctx: &Context<'_>,
) -> Result<ResolvedParameters, CompressError> {
    let duration = budget.duration_secs.ok_or(CompressError::MissingDuration)?;
    let target = (budget.payload_bits() / duration).floor() as u64;
    let bitrate = clamp_floor(target, profile.min_bitrate, profile.max_bitrate);
    let predicted = ctx.fit_budget(budget, bitrate, profile.min_bitrate, duration)?;

    let mut params = ResolvedParameters::new(MediaKind::Audio, RateControl::Bitrate { bps: bitrate });
    params.duration_secs = Some(duration);
    params.approximate = budget.approximate;
    params.predicted_bytes = Some(predicted);
    Ok(params)
}
