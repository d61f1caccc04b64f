//! Input assets and media families

use crate::error::{AppError, CompressError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Media family of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Pdf,
}

impl MediaKind {
    /// Classify a declared MIME type into a media family
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence == "application/pdf" {
            return Some(MediaKind::Pdf);
        }
        match essence.split_once('/') {
            Some(("image", sub)) if !sub.is_empty() => Some(MediaKind::Image),
            Some(("video", sub)) if !sub.is_empty() => Some(MediaKind::Video),
            Some(("audio", sub)) if !sub.is_empty() => Some(MediaKind::Audio),
            _ => None,
        }
    }

    /// Whether the kind has a playback duration
    pub fn is_time_based(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Pdf => "pdf",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A loaded input file. Replaced wholesale when the user picks another file.
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub kind: MediaKind,
    content: Arc<[u8]>,
}

impl Asset {
    /// Create an asset from raw content and its declared MIME type
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Arc<[u8]>>,
        expected: Option<MediaKind>,
    ) -> Result<Self, CompressError> {
        let mime_type = mime_type.into();
        let kind = match (MediaKind::from_mime(&mime_type), expected) {
            (Some(kind), Some(expected)) if kind == expected => kind,
            (Some(kind), None) => kind,
            (_, expected) => {
                return Err(CompressError::UnsupportedType {
                    mime: mime_type,
                    expected,
                });
            }
        };

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            mime_type,
            kind,
            content: content.into(),
        })
    }

    /// Load an asset from disk, guessing its MIME type from the extension
    pub fn from_path(path: &Path, expected: Option<MediaKind>) -> Result<Self, AppError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let mime = mime_from_extension(path).unwrap_or("application/octet-stream");
        let content = std::fs::read(path)?;
        Ok(Self::from_bytes(name, mime, content, expected)?)
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn byte_size(&self) -> u64 {
        self.content.len() as u64
    }

    /// File extension of the original name, lowercased
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Copy the content into a temp file that keeps the original extension,
    /// so external tools can sniff the container. Deleted when dropped.
    pub fn write_temp_copy(&self, prefix: &str) -> std::io::Result<NamedTempFile> {
        let suffix = self
            .extension()
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(self.content())?;
        file.flush()?;
        Ok(file)
    }
}

/// Guess a MIME type from a path's extension
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "ts" => "video/mp2t",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "opus" => "audio/opus",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}

/// Check if a path looks like a supported media file
pub fn is_media_file(path: &Path) -> bool {
    mime_from_extension(path)
        .and_then(MediaKind::from_mime)
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Video));
        assert_eq!(
            MediaKind::from_mime("Audio/MPEG; charset=binary"),
            Some(MediaKind::Audio)
        );
        assert_eq!(MediaKind::from_mime("application/pdf"), Some(MediaKind::Pdf));
        assert_eq!(MediaKind::from_mime("image/"), None);
        assert_eq!(MediaKind::from_mime("text/plain"), None);
    }

    #[test]
    fn test_rejects_mismatched_family() {
        let err = Asset::from_bytes("song.mp3", "audio/mpeg", vec![1u8, 2, 3], Some(MediaKind::Video))
            .unwrap_err();
        assert!(matches!(
            err,
            CompressError::UnsupportedType {
                expected: Some(MediaKind::Video),
                ..
            }
        ));
    }

    #[test]
    fn test_accepts_matching_family() {
        let asset =
            Asset::from_bytes("clip.MP4", "video/mp4", vec![0u8; 16], Some(MediaKind::Video))
                .unwrap();
        assert_eq!(asset.kind, MediaKind::Video);
        assert_eq!(asset.byte_size(), 16);
        assert_eq!(asset.extension().as_deref(), Some("mp4"));
    }

    #[test]
    fn test_temp_copy_keeps_extension_and_content() {
        let asset = Asset::from_bytes("Clip.MOV", "video/quicktime", vec![9u8; 32], None).unwrap();
        let copy = asset.write_temp_copy("mediashrink_test_").unwrap();
        let path = copy.path().to_path_buf();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mov"));
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("mediashrink_test_")
        );
        assert_eq!(std::fs::read(&path).unwrap(), vec![9u8; 32]);

        drop(copy);
        assert!(!path.exists());
    }

    #[test]
    fn test_media_file_detection() {
        assert!(is_media_file(Path::new("/tmp/a.mkv")));
        assert!(is_media_file(Path::new("scan.PDF")));
        assert!(!is_media_file(Path::new("notes.txt")));
    }
}
