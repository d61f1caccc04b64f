pub mod types;

pub use types::*;

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Budget and reachability tunables
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Per-kind capability descriptors
    #[serde(default)]
    pub video: VideoProfile,
    #[serde(default)]
    pub image: ImageProfile,
    #[serde(default)]
    pub audio: AudioProfile,
    #[serde(default)]
    pub pdf: PdfProfile,
    /// Metadata probe settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    /// External encoder settings
    #[serde(default)]
    pub encoder: EncoderConfig,
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from TOML file, or create default if not found
    pub fn load() -> Self {
        let config_path = Self::config_path();

        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config: {}. Using defaults.", e);
                }
            }
        }

        let config = Self::default();
        // Save default config for future editing
        if let Err(e) = config.save() {
            warn!("Failed to save default config: {}", e);
        }
        config
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self) -> Result<(), AppError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, toml_string)
            .map_err(|e| AppError::Config(format!("Failed to write config file: {}", e)))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mediashrink")
            .join("config.toml")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AppError> {
        let r = &self.resolver;
        for (name, value) in [
            ("container_overhead", r.container_overhead),
            ("video_share_with_audio", r.video_share_with_audio),
            ("video_share_without_audio", r.video_share_without_audio),
            ("unreachable_ratio", r.unreachable_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(AppError::Config(format!(
                    "resolver.{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        if r.fallback_duration_secs <= 0.0 {
            return Err(AppError::Config(
                "resolver.fallback_duration_secs must be positive".to_string(),
            ));
        }
        if r.size_tolerance < 0.0 {
            return Err(AppError::Config(
                "resolver.size_tolerance must not be negative".to_string(),
            ));
        }

        let video_tiers: Vec<(u8, f64, f64)> = self
            .video
            .tiers
            .iter()
            .map(|t| {
                let height = t.height.map(f64::from).unwrap_or(f64::INFINITY);
                (t.min_quality, height, t.bits_per_pixel)
            })
            .collect();
        check_tiers("video", &video_tiers)?;

        let image_tiers: Vec<(u8, f64)> = self
            .image
            .tiers
            .iter()
            .map(|t| (t.min_quality, f64::from(t.max_dimension)))
            .collect();
        check_tiers("image", &image_tiers)?;

        let audio_tiers: Vec<(u8, f64)> = self
            .audio
            .tiers
            .iter()
            .map(|t| (t.min_quality, t.bitrate as f64))
            .collect();
        check_tiers("audio", &audio_tiers)?;

        let pdf_tiers: Vec<(u8, f64)> = self
            .pdf
            .tiers
            .iter()
            .map(|t| (t.min_quality, f64::from(t.dpi)))
            .collect();
        check_tiers("pdf", &pdf_tiers)?;

        if self.image.min_quality_factor > self.image.max_quality_factor
            || self.image.max_quality_factor > 100
        {
            return Err(AppError::Config(
                "image quality factors must satisfy min <= max <= 100".to_string(),
            ));
        }
        if self.audio.min_bitrate > self.audio.max_bitrate {
            return Err(AppError::Config(
                "audio.min_bitrate must not exceed audio.max_bitrate".to_string(),
            ));
        }
        if self.pdf.base_dpi == 0 || self.pdf.tiers.iter().any(|t| t.dpi > self.pdf.base_dpi) {
            return Err(AppError::Config(
                "pdf tier dpi must be positive and at most base_dpi".to_string(),
            ));
        }
        if self.encoder.max_parallel == 0 {
            return Err(AppError::Config(
                "encoder.max_parallel must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tier tables must start at quality 0, rise strictly in quality, and never
/// decrease in any of their value columns
fn check_tiers<T: TierRow>(name: &str, tiers: &[T]) -> Result<(), AppError> {
    let first = tiers
        .first()
        .ok_or_else(|| AppError::Config(format!("{} tier table is empty", name)))?;
    if first.min_quality() != 0 {
        return Err(AppError::Config(format!(
            "{} tier table must start at quality 0",
            name
        )));
    }
    for pair in tiers.windows(2) {
        let (lower, upper) = (&pair[0], &pair[1]);
        if upper.min_quality() <= lower.min_quality() {
            return Err(AppError::Config(format!(
                "{} tiers must be sorted by strictly increasing min_quality",
                name
            )));
        }
        if !lower.values_le(upper) {
            return Err(AppError::Config(format!(
                "{} tier at quality {} is not monotonic",
                name,
                upper.min_quality()
            )));
        }
    }
    Ok(())
}

trait TierRow {
    fn min_quality(&self) -> u8;
    fn values_le(&self, other: &Self) -> bool;
}

impl TierRow for (u8, f64) {
    fn min_quality(&self) -> u8 {
        self.0
    }

    fn values_le(&self, other: &Self) -> bool {
        self.1 <= other.1
    }
}

impl TierRow for (u8, f64, f64) {
    fn min_quality(&self) -> u8 {
        self.0
    }

    fn values_le(&self, other: &Self) -> bool {
        self.1 <= other.1 && self.2 <= other.2
    }
}
