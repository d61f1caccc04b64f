//! Compression outcomes and size reduction

use crate::error::ReductionUndefined;
use crate::settings::Settings;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Output of one successful compression
#[derive(Debug, Clone, Serialize)]
pub struct CompressionResult {
    pub asset_id: Uuid,
    /// Suggested download name, e.g. `compressed_holiday.mp4`
    pub file_name: String,
    #[serde(skip)]
    pub output: Vec<u8>,
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Settings snapshot taken when the encode started
    pub settings_used: Settings,
    /// A fallback duration stood in for a missing one
    pub approximate: bool,
    pub created_at: DateTime<Utc>,
}

impl CompressionResult {
    pub fn new(
        asset_id: Uuid,
        file_name: String,
        output: Vec<u8>,
        input_bytes: u64,
        settings_used: Settings,
        approximate: bool,
    ) -> Self {
        Self {
            asset_id,
            file_name,
            output_bytes: output.len() as u64,
            output,
            input_bytes,
            settings_used,
            approximate,
            created_at: Utc::now(),
        }
    }

    pub fn reduction_ratio(&self) -> Result<f64, ReductionUndefined> {
        reduction_ratio(self.input_bytes, self.output_bytes)
    }

    /// Bytes saved; negative when the output grew
    pub fn bytes_saved(&self) -> i64 {
        self.input_bytes as i64 - self.output_bytes as i64
    }
}

/// Fraction of the input removed by compression.
///
/// Negative when the output is larger than the input.
pub fn reduction_ratio(input_bytes: u64, output_bytes: u64) -> Result<f64, ReductionUndefined> {
    if input_bytes == 0 {
        return Err(ReductionUndefined);
    }
    Ok((input_bytes as f64 - output_bytes as f64) / input_bytes as f64)
}
