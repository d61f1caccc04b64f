//! Command-line arguments

use crate::asset::MediaKind;
use crate::config::VideoProfile;
use crate::error::AppError;
use crate::settings::{ImageFormat, Modifiers, Objective, Settings};
use clap::{ArgGroup, Parser};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static SIZE_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*(b|kb|k|mb|m|gb|g)?\s*$"));

#[derive(Parser, Debug)]
#[command(name = "mediashrink")]
#[command(version)]
#[command(about = "Shrink images, videos, audio, and PDFs to a quality level or a target size")]
#[command(group(ArgGroup::new("objective").required(true).args(["quality", "target_size"])))]
pub struct Args {
    /// Files or directories to compress
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Quality 0-100 or a resolution label such as 720p or max
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Target output size, e.g. 10MB or 500KB (1024-based)
    #[arg(short = 's', long)]
    pub target_size: Option<String>,

    /// Drop the audio track of videos
    #[arg(long)]
    pub strip_audio: bool,

    /// Drop embedded cover art from audio files
    #[arg(long)]
    pub strip_cover_art: bool,

    /// Blank a metadata tag (repeatable)
    #[arg(long = "clear-tag", value_name = "TAG")]
    pub clear_tags: Vec<String>,

    /// Output image format (defaults to the source format)
    #[arg(long, value_enum)]
    pub format: Option<ImageFormat>,

    /// Longest edge of output images in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_dimension: Option<u32>,

    /// Only accept inputs of this media family
    #[arg(long, value_enum)]
    pub kind: Option<MediaKind>,

    /// Where outputs are written (defaults to a dated folder)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Re-encode inputs that are already up to date
    #[arg(short, long)]
    pub force: bool,
}

impl Args {
    /// Build settings from the arguments; labels resolve through the video tiers
    pub fn settings(&self, video: &VideoProfile) -> Result<Settings, AppError> {
        let objective = match (&self.quality, &self.target_size) {
            (Some(q), _) => Objective::quality(parse_quality(q, video)?),
            (None, Some(s)) => Objective::size(parse_size(s)?),
            (None, None) => {
                return Err(AppError::Config(
                    "either --quality or --target-size is required".to_string(),
                ));
            }
        };

        let modifiers = Modifiers {
            strip_audio: self.strip_audio,
            strip_cover_art: self.strip_cover_art,
            cleared_tags: self
                .clear_tags
                .iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            image_format: self.format,
            max_dimension: self.max_dimension,
        };

        Ok(Settings::new(objective).with_modifiers(modifiers))
    }
}

/// Parse a quality number or tier label
pub fn parse_quality(input: &str, video: &VideoProfile) -> Result<u8, AppError> {
    let input = input.trim();
    if let Ok(value) = input.parse::<u8>() {
        if value > 100 {
            return Err(AppError::Config(format!("quality {} is above 100", value)));
        }
        return Ok(value);
    }
    video.quality_for_label(input).ok_or_else(|| {
        let labels: Vec<&str> = video.tiers.iter().map(|t| t.label.as_str()).collect();
        AppError::Config(format!(
            "unknown quality '{}', use 0-100 or one of {}",
            input,
            labels.join(", ")
        ))
    })
}

/// Parse a size such as `10MB`, `500KB`, `1.5 GB`, or plain bytes
pub fn parse_size(input: &str) -> Result<u64, AppError> {
    let re = SIZE_RE
        .as_ref()
        .map_err(|e| AppError::Config(format!("size pattern: {}", e)))?;
    let caps = re
        .captures(input)
        .ok_or_else(|| AppError::Config(format!("invalid size '{}'", input)))?;

    let number: f64 = caps[1]
        .parse()
        .map_err(|_| AppError::Config(format!("invalid size '{}'", input)))?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let multiplier = match unit.as_str() {
        "" | "b" => 1.0,
        "k" | "kb" => 1024.0,
        "m" | "mb" => 1024.0 * 1024.0,
        _ => 1024.0 * 1024.0 * 1024.0,
    };

    let bytes = (number * multiplier).round() as u64;
    if bytes == 0 {
        return Err(AppError::Config("target size must be positive".to_string()));
    }
    Ok(bytes)
}
