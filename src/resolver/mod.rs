//! Target-driven compression parameter resolution
//!
//! [`resolve`] maps asset metadata and the user's [`Settings`] onto concrete
//! encoder parameters. It performs no I/O and is deterministic: identical inputs
//! always produce identical [`ResolvedParameters`].
//!
//! The reachability checks and size budget are shared by every media kind; the
//! per-kind tier tables and formulas live in [`profile::MediaProfile`].

mod audio;
mod image;
mod pdf;
pub mod profile;
mod video;

pub use profile::MediaProfile;

use crate::analyzer::AssetMetadata;
use crate::asset::MediaKind;
use crate::config::{AppConfig, DurationPolicy, ResolverConfig};
use crate::error::CompressError;
use crate::settings::{ImageFormat, Modifiers, Objective, Settings};
use serde::Serialize;

/// Rate control handed to the encoder
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RateControl {
    /// Target bits per second
    Bitrate { bps: u64 },
    /// Encoder quality factor, 0-100 (higher is better)
    Quality { factor: u8 },
}

/// Concrete encoder inputs derived from an objective and asset metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedParameters {
    pub kind: MediaKind,
    /// Output/input dimension ratio, 0 < scale <= 1
    pub scale: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub rate: RateControl,
    pub audio_bitrate: Option<u64>,
    pub strip_audio: bool,
    pub strip_cover_art: bool,
    pub cleared_tags: Vec<String>,
    pub image_format: Option<ImageFormat>,
    /// Duration the parameters were derived with
    pub duration_secs: Option<f64>,
    /// Set when a fallback duration stood in for a missing one
    pub approximate: bool,
    pub predicted_bytes: Option<u64>,
}

impl ResolvedParameters {
    fn new(kind: MediaKind, rate: RateControl) -> Self {
        Self {
            kind,
            scale: 1.0,
            width: None,
            height: None,
            rate,
            audio_bitrate: None,
            strip_audio: false,
            strip_cover_art: false,
            cleared_tags: Vec::new(),
            image_format: None,
            duration_secs: None,
            approximate: false,
            predicted_bytes: None,
        }
    }

    pub fn bitrate(&self) -> Option<u64> {
        match self.rate {
            RateControl::Bitrate { bps } => Some(bps),
            RateControl::Quality { .. } => None,
        }
    }

    pub fn quality_factor(&self) -> Option<u8> {
        match self.rate {
            RateControl::Quality { factor } => Some(factor),
            RateControl::Bitrate { .. } => None,
        }
    }
}

/// Bytes available to a size-mode encode after the shared checks
#[derive(Debug, Clone, Copy)]
pub(crate) struct SizeBudget {
    pub target_bytes: u64,
    pub original_bytes: u64,
    /// Present for time-based media
    pub duration_secs: Option<f64>,
    pub approximate: bool,
    pub container_overhead: f64,
}

impl SizeBudget {
    /// Payload bits left once container overhead is reserved
    pub fn payload_bits(&self) -> f64 {
        self.target_bytes as f64 * 8.0 * self.container_overhead
    }
}

/// Per-call context handed to the profile formulas
pub(crate) struct Context<'a> {
    pub resolver: &'a ResolverConfig,
    pub modifiers: &'a Modifiers,
}

impl Context<'_> {
    /// Predicted container size for a stream of `bps` bits per second
    pub fn predict_bytes(&self, bps: u64, duration_secs: f64) -> u64 {
        (bps as f64 * duration_secs / 8.0 / self.resolver.container_overhead).ceil() as u64
    }

    /// Predicted size of a size-mode encode, or `ObjectiveTooSmall` when the
    /// bitrate floors push it past the tolerated overshoot
    pub fn fit_budget(
        &self,
        budget: &SizeBudget,
        bps: u64,
        floor_bps: u64,
        duration_secs: f64,
    ) -> Result<u64, CompressError> {
        let predicted = self.predict_bytes(bps, duration_secs);
        let tolerance = 1.0 + self.resolver.size_tolerance;
        if predicted as f64 > budget.target_bytes as f64 * tolerance {
            let minimum_bytes =
                (self.predict_bytes(floor_bps, duration_secs) as f64 / tolerance).ceil() as u64;
            return Err(CompressError::ObjectiveTooSmall {
                target_bytes: budget.target_bytes,
                minimum_bytes,
            });
        }
        Ok(predicted)
    }
}

/// Resolve encoder parameters for an asset
pub fn resolve(
    kind: MediaKind,
    metadata: &AssetMetadata,
    settings: &Settings,
    config: &AppConfig,
) -> Result<ResolvedParameters, CompressError> {
    let profile = MediaProfile::for_kind(kind, config);
    let ctx = Context {
        resolver: &config.resolver,
        modifiers: &settings.modifiers,
    };

    let mut params = match settings.objective {
        Objective::Quality { value } => profile.resolve_quality(metadata, value.min(100), &ctx)?,
        Objective::Size { target_bytes } => {
            let budget = size_budget(target_bytes, metadata, &profile, &config.resolver)?;
            profile.resolve_size(metadata, &budget, &ctx)?
        }
    };

    apply_modifiers(&mut params, metadata, &settings.modifiers);
    Ok(params)
}

/// Shared size-mode preconditions: reachability, minimum size, duration policy
fn size_budget(
    target_bytes: u64,
    metadata: &AssetMetadata,
    profile: &MediaProfile<'_>,
    resolver: &ResolverConfig,
) -> Result<SizeBudget, CompressError> {
    let original_bytes = metadata.byte_size;
    if target_bytes as f64 >= original_bytes as f64 * resolver.unreachable_ratio {
        return Err(CompressError::ObjectiveUnreachable {
            target_bytes,
            original_bytes,
        });
    }

    let minimum_bytes = profile.min_target_bytes();
    if target_bytes < minimum_bytes {
        return Err(CompressError::ObjectiveTooSmall {
            target_bytes,
            minimum_bytes,
        });
    }

    let (duration_secs, approximate) = if profile.needs_duration() {
        match (metadata.usable_duration(), resolver.missing_duration) {
            (Some(d), _) => (Some(d), false),
            (None, DurationPolicy::Fallback) => (Some(resolver.fallback_duration_secs), true),
            (None, DurationPolicy::Refuse) => return Err(CompressError::MissingDuration),
        }
    } else {
        (None, false)
    };

    Ok(SizeBudget {
        target_bytes,
        original_bytes,
        duration_secs,
        approximate,
        container_overhead: resolver.container_overhead,
    })
}

/// Modifiers go last; they apply the same way in both modes
fn apply_modifiers(params: &mut ResolvedParameters, metadata: &AssetMetadata, modifiers: &Modifiers) {
    let kind = params.kind;
    if kind == MediaKind::Image
        && let Some(limit) = modifiers.max_dimension.filter(|m| *m > 0)
        && let Some((width, height)) = metadata.dimensions()
    {
        let cap = f64::from(limit) / f64::from(width.max(height));
        if cap < params.scale {
            let (out_w, out_h) = scaled_dimensions(width, height, cap, false);
            params.scale = cap;
            params.width = Some(out_w);
            params.height = Some(out_h);
        }
    }
    params.strip_audio = modifiers.strip_audio && kind == MediaKind::Video;
    if params.strip_audio {
        params.audio_bitrate = None;
    }
    params.strip_cover_art = modifiers.strip_cover_art && kind == MediaKind::Audio;
    params.cleared_tags = if kind.is_time_based() {
        modifiers.cleared_tags.iter().cloned().collect()
    } else {
        Vec::new()
    };
    params.image_format = match kind {
        MediaKind::Image => modifiers.image_format,
        _ => None,
    };
}

/// Scale dimensions, flooring each side. Video codecs need even dimensions.
pub(crate) fn scaled_dimensions(width: u32, height: u32, scale: f64, even: bool) -> (u32, u32) {
    let fit = |v: u32| {
        // Absorb float error so 1920 * (720 / 1080) lands on 1280
        let scaled = (f64::from(v) * scale + 1e-6).floor() as u32;
        if even {
            (scaled - scaled % 2).max(2)
        } else {
            scaled.max(1)
        }
    };
    (fit(width), fit(height))
}

/// Clamp with the lower bound winning over the upper one
pub(crate) fn clamp_floor(value: u64, floor: u64, ceiling: u64) -> u64 {
    value.min(ceiling).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_meta() -> AssetMetadata {
        AssetMetadata::new(100 * 1024 * 1024)
            .with_dimensions(1920, 1080)
            .with_duration(60.0)
            .with_frame_rate(30.0)
    }

    fn quality(value: u8) -> Settings {
        Settings::new(Objective::quality(value))
    }

    fn size(target_bytes: u64) -> Settings {
        Settings::new(Objective::size(target_bytes))
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let config = AppConfig::default();
        let meta = video_meta();
        for settings in [quality(0), quality(55), quality(100), size(10 * 1024 * 1024)] {
            for kind in [MediaKind::Video, MediaKind::Audio] {
                let a = resolve(kind, &meta, &settings, &config).unwrap();
                let b = resolve(kind, &meta, &settings, &config).unwrap();
                assert_eq!(a, b);
                assert_eq!(a.scale.to_bits(), b.scale.to_bits());
            }
        }
    }

    #[test]
    fn test_video_bitrate_is_monotonic_in_quality() {
        let config = AppConfig::default();
        for meta in [
            video_meta(),
            AssetMetadata::new(5_000_000).with_dimensions(640, 360),
            AssetMetadata::new(5_000_000).with_dimensions(3840, 2160),
        ] {
            let mut previous = 0;
            for value in 0..=100u8 {
                let params = resolve(MediaKind::Video, &meta, &quality(value), &config).unwrap();
                let bitrate = params.bitrate().unwrap();
                assert!(bitrate >= previous, "quality {} regressed", value);
                previous = bitrate;
            }
        }
    }

    #[test]
    fn test_audio_and_image_are_monotonic_in_quality() {
        let config = AppConfig::default();
        let audio = AssetMetadata::new(5_000_000).with_duration(200.0);
        let image = AssetMetadata::new(5_000_000).with_dimensions(4000, 3000);
        let mut previous_bitrate = 0;
        let mut previous_factor = 0;
        for value in 0..=100u8 {
            let a = resolve(MediaKind::Audio, &audio, &quality(value), &config).unwrap();
            let i = resolve(MediaKind::Image, &image, &quality(value), &config).unwrap();
            assert!(a.bitrate().unwrap() >= previous_bitrate);
            assert!(i.quality_factor().unwrap() >= previous_factor);
            previous_bitrate = a.bitrate().unwrap();
            previous_factor = i.quality_factor().unwrap();
        }
    }

    #[test]
    fn test_size_target_near_source_is_unreachable() {
        let config = AppConfig::default();
        let meta = video_meta();
        let original = meta.byte_size;
        for target in [original, original * 9 / 10, (original as f64 * 0.8).ceil() as u64] {
            let err = resolve(MediaKind::Video, &meta, &size(target), &config).unwrap_err();
            assert!(
                matches!(err, CompressError::ObjectiveUnreachable { .. }),
                "target {} gave {:?}",
                target,
                err
            );
        }
    }

    #[test]
    fn test_size_target_within_tolerance() {
        let config = AppConfig::default();
        let meta = video_meta();
        for target in [
            600 * 1024,
            700 * 1024,
            800 * 1024,
            1024 * 1024,
            10 * 1024 * 1024,
            50 * 1024 * 1024,
            80 * 1024 * 1024 - 1,
        ] {
            let params = resolve(MediaKind::Video, &meta, &size(target), &config).unwrap();
            let predicted = params.predicted_bytes.unwrap();
            let limit = target as f64 * (1.0 + config.resolver.size_tolerance);
            assert!(
                predicted as f64 <= limit,
                "predicted {} over {} for target {}",
                predicted,
                limit,
                target
            );
            assert!(!params.approximate);
        }
    }

    #[test]
    fn test_bitrate_floors_past_tolerance_are_too_small() {
        let config = AppConfig::default();
        // 50 kbps video + 32 kbps audio for 60 s is 647 369 bytes
        let err = resolve(MediaKind::Video, &video_meta(), &size(256 * 1024), &config).unwrap_err();
        assert_eq!(
            err,
            CompressError::ObjectiveTooSmall {
                target_bytes: 256 * 1024,
                minimum_bytes: 588_518,
            }
        );

        // Without audio only the video floor counts
        let stripped = size(256 * 1024).with_modifiers(Modifiers {
            strip_audio: true,
            ..Default::default()
        });
        let err = resolve(MediaKind::Video, &video_meta(), &stripped, &config).unwrap_err();
        assert!(matches!(
            err,
            CompressError::ObjectiveTooSmall { minimum_bytes, .. } if minimum_bytes < 588_518
        ));
    }

    #[test]
    fn test_audio_floor_comes_out_of_the_video_share() {
        let config = AppConfig::default();
        let target = 600 * 1024;
        let params = resolve(MediaKind::Video, &video_meta(), &size(target), &config).unwrap();
        // 77 824 bps in total: audio is lifted to its floor and video drops to its own
        assert_eq!(params.audio_bitrate, Some(config.video.min_audio_bitrate));
        assert_eq!(params.bitrate(), Some(config.video.min_bitrate));
        assert_eq!(params.predicted_bytes, Some(647_369));
    }

    #[test]
    fn test_unreachable_wins_over_too_small() {
        let config = AppConfig::default();
        let meta = AssetMetadata::new(20_000).with_dimensions(320, 240).with_duration(1.0);
        let err = resolve(MediaKind::Video, &meta, &size(19_000), &config).unwrap_err();
        assert!(matches!(err, CompressError::ObjectiveUnreachable { .. }));
    }

    #[test]
    fn test_tiny_target_is_too_small() {
        let config = AppConfig::default();
        let err = resolve(MediaKind::Video, &video_meta(), &size(10_000), &config).unwrap_err();
        assert_eq!(
            err,
            CompressError::ObjectiveTooSmall {
                target_bytes: 10_000,
                minimum_bytes: 50_000
            }
        );
    }

    #[test]
    fn test_missing_duration_policy() {
        let mut config = AppConfig::default();
        let meta = AssetMetadata::new(100 * 1024 * 1024).with_dimensions(1280, 720);

        let params = resolve(MediaKind::Video, &meta, &size(5 * 1024 * 1024), &config).unwrap();
        assert!(params.approximate);
        assert_eq!(params.duration_secs, Some(config.resolver.fallback_duration_secs));

        config.resolver.missing_duration = DurationPolicy::Refuse;
        let err = resolve(MediaKind::Video, &meta, &size(5 * 1024 * 1024), &config).unwrap_err();
        assert_eq!(err, CompressError::MissingDuration);

        // Quality mode never needs the duration
        assert!(resolve(MediaKind::Video, &meta, &quality(80), &config).is_ok());
    }

    #[test]
    fn test_strip_audio_grows_video_share() {
        let config = AppConfig::default();
        let meta = AssetMetadata::new(500 * 1024 * 1024)
            .with_dimensions(3840, 2160)
            .with_duration(600.0)
            .with_frame_rate(30.0);
        let target = 50 * 1024 * 1024;

        let kept = resolve(MediaKind::Video, &meta, &size(target), &config).unwrap();
        let stripped_settings = size(target).with_modifiers(Modifiers {
            strip_audio: true,
            ..Default::default()
        });
        let stripped = resolve(MediaKind::Video, &meta, &stripped_settings, &config).unwrap();

        assert!(kept.audio_bitrate.is_some());
        assert!(!kept.strip_audio);
        assert!(stripped.strip_audio);
        assert_eq!(stripped.audio_bitrate, None);
        assert!(stripped.bitrate().unwrap() > kept.bitrate().unwrap());
    }

    #[test]
    fn test_modifiers_only_apply_to_matching_kinds() {
        let config = AppConfig::default();
        let mut modifiers = Modifiers {
            strip_audio: true,
            strip_cover_art: true,
            image_format: Some(ImageFormat::Webp),
            ..Default::default()
        };
        modifiers.cleared_tags.insert("artist".to_string());
        let settings = quality(70).with_modifiers(modifiers);

        let audio_meta = AssetMetadata::new(4_000_000).with_duration(120.0);
        let audio = resolve(MediaKind::Audio, &audio_meta, &settings, &config).unwrap();
        assert!(!audio.strip_audio);
        assert!(audio.strip_cover_art);
        assert_eq!(audio.cleared_tags, vec!["artist".to_string()]);
        assert_eq!(audio.image_format, None);

        let image_meta = AssetMetadata::new(4_000_000).with_dimensions(1000, 800);
        let image = resolve(MediaKind::Image, &image_meta, &settings, &config).unwrap();
        assert!(!image.strip_cover_art);
        assert!(image.cleared_tags.is_empty());
        assert_eq!(image.image_format, Some(ImageFormat::Webp));
    }

    #[test]
    fn test_max_dimension_caps_images_only() {
        let config = AppConfig::default();
        let capped = |settings: Settings| {
            settings.with_modifiers(Modifiers {
                max_dimension: Some(1000),
                ..Default::default()
            })
        };
        let photo = AssetMetadata::new(8_000_000).with_dimensions(4000, 3000);

        // Tighter than the 2560 tier cap
        let params = resolve(MediaKind::Image, &photo, &capped(quality(80)), &config).unwrap();
        assert_eq!((params.width, params.height), (Some(1000), Some(750)));
        assert_eq!(params.scale, 0.25);

        let params = resolve(MediaKind::Image, &photo, &capped(size(500 * 1024)), &config).unwrap();
        assert_eq!(params.width, Some(1000));
        assert_eq!(params.predicted_bytes, Some(500 * 1024));

        // Looser than the tier cap, or larger than the image: no effect
        let small = AssetMetadata::new(1_000_000).with_dimensions(800, 600);
        let params = resolve(MediaKind::Image, &small, &capped(quality(80)), &config).unwrap();
        assert_eq!((params.width, params.height), (Some(800), Some(600)));
        assert_eq!(params.scale, 1.0);

        let video = resolve(MediaKind::Video, &video_meta(), &capped(quality(100)), &config).unwrap();
        assert_eq!(video.width, Some(1920));
    }

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(scaled_dimensions(1920, 1080, 1.0, true), (1920, 1080));
        assert_eq!(scaled_dimensions(1921, 1081, 1.0, true), (1920, 1080));
        assert_eq!(scaled_dimensions(1921, 1081, 1.0, false), (1921, 1081));
        assert_eq!(scaled_dimensions(10, 10, 0.01, true), (2, 2));
        assert_eq!(scaled_dimensions(10, 10, 0.01, false), (1, 1));
    }

    #[test]
    fn test_clamp_floor_prefers_floor() {
        assert_eq!(clamp_floor(5, 10, 100), 10);
        assert_eq!(clamp_floor(500, 10, 100), 100);
        assert_eq!(clamp_floor(50, 60, 40), 60);
    }
}
