//! Writing compressed outputs

pub mod manifest;

pub use manifest::{Manifest, ManifestEntry};

use crate::asset::MediaKind;
use crate::error::AppError;
use crate::utils::disk_space;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One file handed to a packager
#[derive(Debug, Clone)]
pub struct PackageEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PackageEntry {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Sink for finished outputs
pub trait Packager {
    /// Store every entry, returning where each one landed, in entry order.
    /// Clashing names within one call are kept apart with `_1`, `_2` suffixes.
    fn package(&self, entries: &[PackageEntry]) -> Result<Vec<PathBuf>, AppError>;
}

/// Writes entries as plain files in one directory
#[derive(Debug, Clone)]
pub struct DirectoryPackager {
    root: PathBuf,
}

impl DirectoryPackager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Packager for DirectoryPackager {
    fn package(&self, entries: &[PackageEntry]) -> Result<Vec<PathBuf>, AppError> {
        std::fs::create_dir_all(&self.root)?;

        let required: u64 = entries.iter().map(|e| e.bytes.len() as u64).sum();
        if !disk_space::has_enough_space(&self.root, required) {
            return Err(AppError::InsufficientSpace { required });
        }

        let mut used = HashSet::new();
        let mut written = Vec::with_capacity(entries.len());
        for entry in entries {
            // Names come from user files; keep them inside the root
            let file_name = Path::new(&entry.name)
                .file_name()
                .ok_or_else(|| AppError::Config(format!("Invalid output name: {}", entry.name)))?;
            let file_name = unique_name(&file_name.to_string_lossy(), &mut used);
            if file_name != entry.name {
                debug!("{} stored as {}", entry.name, file_name);
            }
            let path = self.root.join(file_name);
            std::fs::write(&path, &entry.bytes)?;
            info!("Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// First of `name`, `stem_1.ext`, `stem_2.ext`, ... not yet in `used`
fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = name.to_string();
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().to_string());

    let mut n = 1;
    while used.contains(&candidate) {
        candidate = match &extension {
            Some(ext) => format!("{}_{}.{}", stem, n, ext),
            None => format!("{}_{}", stem, n),
        };
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Output name for a compressed asset: `<prefix><stem>.<extension>`
pub fn suggested_file_name(prefix: &str, original_name: &str, extension: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "file".to_string());
    format!("{}{}.{}", prefix, stem, extension)
}

/// Name of a multi-file bundle, e.g. `compressed_videos_2026-10-18`
pub fn bundle_name(kind: Option<MediaKind>, date: NaiveDate) -> String {
    let family = match kind {
        Some(MediaKind::Image) => "images",
        Some(MediaKind::Video) => "videos",
        Some(MediaKind::Audio) => "audios",
        Some(MediaKind::Pdf) => "pdfs",
        None => "files",
    };
    format!("compressed_{}_{}", family, date.format("%Y-%m-%d"))
}
