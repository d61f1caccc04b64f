//! Detects results produced with settings other than the current ones

use crate::package::ManifestEntry;
use crate::result::CompressionResult;
use crate::settings::Settings;

/// Anything that remembers the settings it was produced with
pub trait SettingsRecord {
    fn settings_used(&self) -> &Settings;
}

impl SettingsRecord for CompressionResult {
    fn settings_used(&self) -> &Settings {
        &self.settings_used
    }
}

impl SettingsRecord for ManifestEntry {
    fn settings_used(&self) -> &Settings {
        &self.settings_used
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftStatus {
    /// Nothing has been produced yet
    NoResult,
    UpToDate,
    /// Settings changed since the result was produced
    Stale,
}

/// True when any part of the objective or modifiers differs
pub fn is_stale<R: SettingsRecord + ?Sized>(current: &Settings, result: &R) -> bool {
    current != result.settings_used()
}

pub fn drift_status<R: SettingsRecord + ?Sized>(current: &Settings, result: Option<&R>) -> DriftStatus {
    match result {
        None => DriftStatus::NoResult,
        Some(r) if is_stale(current, r) => DriftStatus::Stale,
        Some(_) => DriftStatus::UpToDate,
    }
}
