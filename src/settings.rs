//! User-declared compression settings

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Compression goal declared by the user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Objective {
    /// Perceptual quality level, 0-100
    Quality { value: u8 },
    /// Absolute output size
    Size { target_bytes: u64 },
}

impl Objective {
    pub fn quality(value: u8) -> Self {
        Objective::Quality {
            value: value.min(100),
        }
    }

    pub fn size(target_bytes: u64) -> Self {
        Objective::Size { target_bytes }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::Quality { value } => write!(f, "quality {}", value),
            Objective::Size { target_bytes } => write!(
                f,
                "size {}",
                crate::utils::format_file_size(*target_bytes)
            ),
        }
    }
}

/// Output image container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }

    /// Map a source extension onto an output format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }
}

/// Toggles applied on top of either objective mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub strip_audio: bool,
    #[serde(default)]
    pub strip_cover_art: bool,
    /// Metadata tags blanked in the output (e.g. artist, album)
    #[serde(default)]
    pub cleared_tags: BTreeSet<String>,
    /// None keeps the source image format
    #[serde(default)]
    pub image_format: Option<ImageFormat>,
    /// Longest image edge in pixels, on top of the quality tier's cap
    #[serde(default)]
    pub max_dimension: Option<u32>,
}

/// Objective plus modifiers. Snapshotted onto every result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Settings {
    pub objective: Objective,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl Settings {
    pub fn new(objective: Objective) -> Self {
        Self {
            objective,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(Objective::quality(250), Objective::Quality { value: 100 });
    }

    #[test]
    fn test_settings_json_shape() {
        let settings = Settings::new(Objective::size(1_048_576));
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["objective"]["mode"], "size");
        assert_eq!(json["objective"]["target_bytes"], 1_048_576);

        let back: Settings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_tag_order_does_not_matter() {
        let mut a = Modifiers::default();
        a.cleared_tags.insert("artist".into());
        a.cleared_tags.insert("album".into());
        let mut b = Modifiers::default();
        b.cleared_tags.insert("album".into());
        b.cleared_tags.insert("artist".into());
        assert_eq!(a, b);
    }

    #[test]
    fn test_max_dimension_takes_part_in_equality() {
        let capped = Modifiers {
            max_dimension: Some(1920),
            ..Default::default()
        };
        assert_ne!(capped, Modifiers::default());

        // Manifests written before the field existed still load
        let old: Modifiers = serde_json::from_str(r#"{"strip_audio":true}"#).unwrap();
        assert_eq!(old.max_dimension, None);
    }
}
