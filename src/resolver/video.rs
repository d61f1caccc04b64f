use super::profile::{require_dimensions, select_tier};
use super::{Context, RateControl, ResolvedParameters, SizeBudget, clamp_floor, scaled_dimensions};
use crate::analyzer::AssetMetadata;
use crate::asset::MediaKind;
use crate::config::VideoProfile;
use crate::error::CompressError;

const MAX_FRAME_RATE: f64 = 60.0;

fn frame_rate(profile: &VideoProfile, metadata: &AssetMetadata) -> f64 {
    metadata
        .frame_rate
        .filter(|f| f.is_finite() && *f > 0.0)
        .map(|f| f.min(MAX_FRAME_RATE))
        .unwrap_or(profile.default_frame_rate)
}

fn pixel_rate(width: u32, height: u32, fps: f64) -> f64 {
    f64::from(width) * f64::from(height) * fps
}

/// Tier height over natural height, bitrate from the tier's pixel density
pub(super) fn quality(
    profile: &VideoProfile,
    metadata: &AssetMetadata,
    value: u8,
    ctx: &Context<'_>,
) -> Result<ResolvedParameters, CompressError> {
    let (width, height) = require_dimensions(metadata)?;
    let tier = select_tier(&profile.tiers, value)?;

    let target_height = tier.height.unwrap_or(height);
    let scale = (f64::from(target_height) / f64::from(height)).min(1.0);
    let (out_w, out_h) = scaled_dimensions(width, height, scale, true);

    let fps = frame_rate(profile, metadata);
    let bitrate = ((pixel_rate(out_w, out_h, fps) * tier.bits_per_pixel).floor() as u64)
        .max(profile.min_bitrate);
    let audio_bitrate = (!ctx.modifiers.strip_audio).then_some(profile.audio_bitrate);

    let duration = metadata.usable_duration();
    let mut params = ResolvedParameters::new(MediaKind::Video, RateControl::Bitrate { bps: bitrate });
    params.scale = scale;
    params.width = Some(out_w);
    params.height = Some(out_h);
    params.audio_bitrate = audio_bitrate;
    params.duration_secs = duration;
    params.predicted_bytes =
        duration.map(|d| ctx.predict_bytes(bitrate + audio_bitrate.unwrap_or(0), d));
    Ok(params)
}

/// Split the byte budget between video and audio, then pick a resolution
/// that can usefully absorb the video bitrate
pub(super) fn size(
    profile: &VideoProfile,
    metadata: &AssetMetadata,
    budget: &SizeBudget,
    ctx: &Context<'_>,
) -> Result<ResolvedParameters, CompressError> {
    let (width, height) = require_dimensions(metadata)?;
    let duration = budget.duration_secs.ok_or(CompressError::MissingDuration)?;

    let strip_audio = ctx.modifiers.strip_audio;
    let video_share = if strip_audio {
        ctx.resolver.video_share_without_audio
    } else {
        ctx.resolver.video_share_with_audio
    };
    let total_bitrate = (budget.payload_bits() / duration).floor() as u64;

    // Audio floors come out of the video share, never on top of the budget
    let audio_bitrate = (!strip_audio).then(|| {
        let reserved = (total_bitrate as f64 * (1.0 - video_share)).floor() as u64;
        clamp_floor(reserved, profile.min_audio_bitrate, profile.audio_bitrate)
    });
    let target_bitrate = ((total_bitrate as f64 * video_share).floor() as u64)
        .min(total_bitrate.saturating_sub(audio_bitrate.unwrap_or(0)));

    let fps = frame_rate(profile, metadata);
    let full_rate = pixel_rate(width, height, fps) * profile.reference_bits_per_pixel;
    let estimated = (target_bitrate as f64 / full_rate).min(1.0).sqrt();
    let scale = estimated.max(profile.min_scale).min(1.0);
    let (out_w, out_h) = scaled_dimensions(width, height, scale, true);

    let ceiling = (pixel_rate(out_w, out_h, fps) * profile.max_bits_per_pixel).floor() as u64;
    let bitrate = clamp_floor(target_bitrate, profile.min_bitrate, ceiling);

    let floor_bitrate = profile.min_bitrate + audio_bitrate.map_or(0, |_| profile.min_audio_bitrate);
    let predicted = ctx.fit_budget(
        budget,
        bitrate + audio_bitrate.unwrap_or(0),
        floor_bitrate,
        duration,
    )?;

    let mut params = ResolvedParameters::new(MediaKind::Video, RateControl::Bitrate { bps: bitrate });
    params.scale = scale;
    params.width = Some(out_w);
    params.height = Some(out_h);
    params.audio_bitrate = audio_bitrate;
    params.duration_secs = Some(duration);
    params.approximate = budget.approximate;
    params.predicted_bytes = Some(predicted);
    Ok(params)
}

#[cfg(test)]
mod tests {
    use crate::analyzer::AssetMetadata;
    use crate::asset::MediaKind;
    use crate::config::AppConfig;
    use crate::resolver::resolve;
    use crate::settings::{Objective, Settings};

    #[test]
    fn test_quality_never_upscales() {
        let config = AppConfig::default();
        let meta = AssetMetadata::new(1_000_000).with_dimensions(640, 360);
        let params = resolve(
            MediaKind::Video,
            &meta,
            &Settings::new(Objective::quality(90)),
            &config,
        )
        .unwrap();
        assert_eq!(params.scale, 1.0);
        assert_eq!((params.width, params.height), (Some(640), Some(360)));
    }

    #[test]
    fn test_quality_720p_from_1080p() {
        let config = AppConfig::default();
        let meta = AssetMetadata::new(1_000_000)
            .with_dimensions(1920, 1080)
            .with_frame_rate(25.0)
            .with_duration(10.0);
        let value = config.video.quality_for_label("720p").unwrap();
        let params = resolve(
            MediaKind::Video,
            &meta,
            &Settings::new(Objective::quality(value)),
            &config,
        )
        .unwrap();
        assert_eq!((params.width, params.height), (Some(1280), Some(720)));
        // 1280 * 720 * 25 fps * 0.06 bpp
        assert_eq!(params.bitrate(), Some(1_382_400));
        assert_eq!(params.audio_bitrate, Some(128_000));
        assert!(params.predicted_bytes.is_some());
    }

    #[test]
    fn test_quality_floor_bitrate() {
        let config = AppConfig::default();
        let meta = AssetMetadata::new(1_000_000).with_dimensions(160, 90);
        let params = resolve(
            MediaKind::Video,
            &meta,
            &Settings::new(Objective::quality(0)),
            &config,
        )
        .unwrap();
        assert_eq!(params.bitrate(), Some(config.video.min_bitrate));
        assert_eq!(params.predicted_bytes, None);
    }

    #[test]
    fn test_size_mode_downscales_tight_budgets() {
        let config = AppConfig::default();
        let meta = AssetMetadata::new(200 * 1024 * 1024)
            .with_dimensions(1920, 1080)
            .with_duration(120.0)
            .with_frame_rate(30.0);
        let params = resolve(
            MediaKind::Video,
            &meta,
            &Settings::new(Objective::size(5 * 1024 * 1024)),
            &config,
        )
        .unwrap();
        assert!(params.scale < 1.0);
        assert!(params.scale >= config.video.min_scale);
        assert_eq!(params.width.unwrap() % 2, 0);
        assert_eq!(params.height.unwrap() % 2, 0);
    }

    #[test]
    fn test_size_mode_respects_pixel_ceiling() {
        let config = AppConfig::default();
        // Huge budget for a tiny frame
        let meta = AssetMetadata::new(1024 * 1024 * 1024)
            .with_dimensions(320, 240)
            .with_duration(10.0)
            .with_frame_rate(25.0);
        let params = resolve(
            MediaKind::Video,
            &meta,
            &Settings::new(Objective::size(500 * 1024 * 1024)),
            &config,
        )
        .unwrap();
        let ceiling = (320.0 * 240.0 * 25.0 * config.video.max_bits_per_pixel) as u64;
        assert_eq!(params.scale, 1.0);
        assert_eq!(params.bitrate(), Some(ceiling));
    }
}
