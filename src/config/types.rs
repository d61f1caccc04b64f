use serde::{Deserialize, Serialize};

/// What the resolver does when a size target needs a duration the probe did not find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationPolicy {
    /// Fail with MissingDuration
    Refuse,
    /// Assume `fallback_duration_secs` and mark the result approximate
    Fallback,
}

/// Budget split and reachability tunables shared by every media kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Fraction of the size budget left after container/mux overhead
    pub container_overhead: f64,
    /// Video share of the budget when an audio track is kept
    pub video_share_with_audio: f64,
    /// Video share of the budget when audio is stripped
    pub video_share_without_audio: f64,
    /// Size targets at or above this fraction of the source are rejected
    pub unreachable_ratio: f64,
    pub missing_duration: DurationPolicy,
    pub fallback_duration_secs: f64,
    /// Accepted overshoot of the predicted size over the target
    pub size_tolerance: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            container_overhead: 0.95,
            video_share_with_audio: 0.80,
            video_share_without_audio: 0.95,
            unreachable_ratio: 0.8,
            missing_duration: DurationPolicy::Fallback,
            fallback_duration_secs: 60.0,
            size_tolerance: 0.10,
        }
    }
}

/// Quality tier for video, selected by `min_quality`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoTier {
    pub label: String,
    pub min_quality: u8,
    /// Target height, None keeps the source height
    pub height: Option<u32>,
    /// Bits per pixel per frame
    pub bits_per_pixel: f64,
}

/// Video capability descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoProfile {
    pub tiers: Vec<VideoTier>,
    pub default_frame_rate: f64,
    pub min_bitrate: u64,
    /// Ceiling used in size mode
    pub max_bits_per_pixel: f64,
    /// Density a full-resolution encode needs before size mode starts downscaling
    pub reference_bits_per_pixel: f64,
    pub min_scale: f64,
    pub audio_bitrate: u64,
    pub min_audio_bitrate: u64,
    pub min_target_bytes: u64,
}

fn video_tier(label: &str, min_quality: u8, height: Option<u32>, bits_per_pixel: f64) -> VideoTier {
    VideoTier {
        label: label.to_string(),
        min_quality,
        height,
        bits_per_pixel,
    }
}

impl Default for VideoProfile {
    fn default() -> Self {
        Self {
            tiers: vec![
                video_tier("144p", 0, Some(144), 0.02),
                video_tier("240p", 12, Some(240), 0.03),
                video_tier("360p", 25, Some(360), 0.04),
                video_tier("480p", 37, Some(480), 0.05),
                video_tier("720p", 50, Some(720), 0.06),
                video_tier("1080p", 62, Some(1080), 0.07),
                video_tier("1440p", 75, Some(1440), 0.08),
                video_tier("2160p", 87, Some(2160), 0.09),
                video_tier("max", 100, None, 0.10),
            ],
            default_frame_rate: 25.0,
            min_bitrate: 50_000,
            max_bits_per_pixel: 0.15,
            reference_bits_per_pixel: 0.10,
            min_scale: 0.2,
            audio_bitrate: 128_000,
            min_audio_bitrate: 32_000,
            min_target_bytes: 50_000,
        }
    }
}

impl VideoProfile {
    /// Quality value for a named tier such as "720p" or "max"
    pub fn quality_for_label(&self, label: &str) -> Option<u8> {
        self.tiers
            .iter()
            .find(|t| t.label.eq_ignore_ascii_case(label))
            .map(|t| t.min_quality)
    }
}

/// Quality tier for still images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTier {
    pub min_quality: u8,
    /// Longest output edge in pixels
    pub max_dimension: u32,
}

/// Image capability descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageProfile {
    pub tiers: Vec<ImageTier>,
    pub min_quality_factor: u8,
    pub max_quality_factor: u8,
    /// Bits per pixel at which size mode reaches `max_quality_factor`
    pub reference_bits_per_pixel: f64,
    /// Below this size mode also downscales
    pub min_bits_per_pixel: f64,
    pub min_scale: f64,
    pub min_target_bytes: u64,
}

impl Default for ImageProfile {
    fn default() -> Self {
        Self {
            tiers: vec![
                ImageTier {
                    min_quality: 0,
                    max_dimension: 1280,
                },
                ImageTier {
                    min_quality: 50,
                    max_dimension: 1920,
                },
                ImageTier {
                    min_quality: 80,
                    max_dimension: 2560,
                },
                ImageTier {
                    min_quality: 95,
                    max_dimension: 4096,
                },
            ],
            min_quality_factor: 10,
            max_quality_factor: 95,
            reference_bits_per_pixel: 2.0,
            min_bits_per_pixel: 0.25,
            min_scale: 0.2,
            min_target_bytes: 4_096,
        }
    }
}

/// Quality tier for audio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTier {
    pub min_quality: u8,
    pub bitrate: u64,
}

/// Audio capability descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioProfile {
    pub tiers: Vec<AudioTier>,
    pub min_bitrate: u64,
    pub max_bitrate: u64,
    pub min_target_bytes: u64,
}

impl Default for AudioProfile {
    fn default() -> Self {
        let tiers = [
            (0, 32_000),
            (15, 64_000),
            (30, 96_000),
            (45, 128_000),
            (60, 160_000),
            (75, 192_000),
            (85, 256_000),
            (95, 320_000),
        ]
        .into_iter()
        .map(|(min_quality, bitrate)| AudioTier {
            min_quality,
            bitrate,
        })
        .collect();

        Self {
            tiers,
            min_bitrate: 32_000,
            max_bitrate: 320_000,
            min_target_bytes: 16_000,
        }
    }
}

/// Quality tier for PDF image downsampling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfTier {
    pub min_quality: u8,
    pub dpi: u32,
}

/// PDF capability descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfProfile {
    pub tiers: Vec<PdfTier>,
    pub base_dpi: u32,
    pub min_target_bytes: u64,
}

impl Default for PdfProfile {
    fn default() -> Self {
        Self {
            tiers: vec![
                PdfTier {
                    min_quality: 0,
                    dpi: 72,
                },
                PdfTier {
                    min_quality: 34,
                    dpi: 150,
                },
                PdfTier {
                    min_quality: 67,
                    dpi: 300,
                },
            ],
            base_dpi: 300,
            min_target_bytes: 16_384,
        }
    }
}

/// Metadata probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub ffprobe_path: String,
    pub probe_timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: "ffprobe".to_string(),
            probe_timeout_secs: 15,
        }
    }
}

/// External encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub ffmpeg_path: String,
    pub ghostscript_path: String,
    /// Concurrent encodes the external tools may run
    pub max_parallel: usize,
    pub timeout_floor_secs: u64,
    /// Added to the media duration when computing the timeout
    pub timeout_slack_secs: u64,
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ghostscript_path: "gs".to_string(),
            max_parallel: 1,
            timeout_floor_secs: 30,
            timeout_slack_secs: 10,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Prefix of output file names
    pub prefix: String,
    /// Output directory, None writes next to the source
    pub directory: Option<String>,
    pub manifest_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: "compressed_".to_string(),
            directory: None,
            manifest_name: "mediashrink-manifest.json".to_string(),
        }
    }
}
