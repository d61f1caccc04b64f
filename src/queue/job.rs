use crate::asset::{Asset, MediaKind};
use crate::error::CompressError;
use crate::result::reduction_ratio;
use uuid::Uuid;

/// Status of one asset in a batch
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Waiting to be processed
    Pending,
    /// Probed, resolved, or encoding
    Running { progress: f32 },
    /// Successfully compressed
    Done,
    /// Error occurred
    Failed { error: CompressError },
    /// Stopped by the user
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Done | JobStatus::Failed { .. } | JobStatus::Cancelled
        )
    }
}

/// One asset tracked through a batch
#[derive(Debug, Clone)]
pub struct CompressionJob {
    pub asset_id: Uuid,
    pub name: String,
    pub kind: MediaKind,
    pub status: JobStatus,
    pub input_bytes: u64,
    pub output_bytes: Option<u64>,
    /// A fallback duration was used
    pub approximate: bool,
}

impl CompressionJob {
    pub fn new(asset: &Asset) -> Self {
        Self {
            asset_id: asset.id,
            name: asset.name.clone(),
            kind: asset.kind,
            status: JobStatus::Pending,
            input_bytes: asset.byte_size(),
            output_bytes: None,
            approximate: false,
        }
    }

    pub fn progress(&self) -> f32 {
        match self.status {
            JobStatus::Running { progress } => progress,
            JobStatus::Done => 100.0,
            _ => 0.0,
        }
    }

    /// Calculate size reduction if the job succeeded
    pub fn size_reduction(&self) -> Option<(i64, f64)> {
        if self.status != JobStatus::Done {
            return None;
        }
        let output = self.output_bytes?;
        let ratio = reduction_ratio(self.input_bytes, output).ok()?;
        Some((self.input_bytes as i64 - output as i64, ratio * 100.0))
    }
}
