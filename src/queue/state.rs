use super::job::{CompressionJob, JobStatus};
use super::worker::PipelineEvent;
use crate::asset::Asset;
use crate::error::CompressError;
use crate::result::reduction_ratio;
use crate::utils::format_file_size;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Live view of a batch, fed by pipeline events in any order
#[derive(Debug, Default)]
pub struct BatchState {
    jobs: Vec<CompressionJob>,
    index: HashMap<Uuid, usize>,
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
}

impl BatchState {
    pub fn new<'a>(assets: impl IntoIterator<Item = &'a Asset>) -> Self {
        let mut state = Self::default();
        for asset in assets {
            state.index.insert(asset.id, state.jobs.len());
            state.jobs.push(CompressionJob::new(asset));
        }
        state
    }

    pub fn jobs(&self) -> &[CompressionJob] {
        &self.jobs
    }

    pub fn job(&self, asset_id: Uuid) -> Option<&CompressionJob> {
        self.index.get(&asset_id).map(|&i| &self.jobs[i])
    }

    /// Fold one event into the state. Events for unknown assets are ignored.
    pub fn apply(&mut self, event: &PipelineEvent) {
        let Some(&i) = self.index.get(&event.asset_id()) else {
            return;
        };
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }

        let job = &mut self.jobs[i];
        // A finished job never changes again
        if job.status.is_terminal() {
            return;
        }
        match event {
            PipelineEvent::Started { .. } => job.status = JobStatus::Running { progress: 0.0 },
            PipelineEvent::Progress { percent, .. } => {
                job.status = JobStatus::Running {
                    progress: percent.max(job.progress()),
                }
            }
            PipelineEvent::Warning { .. } => {}
            PipelineEvent::Succeeded {
                output_bytes,
                approximate,
                ..
            } => {
                job.status = JobStatus::Done;
                job.output_bytes = Some(*output_bytes);
                job.approximate = *approximate;
            }
            PipelineEvent::Failed { error, .. } => {
                job.status = JobStatus::Failed {
                    error: error.clone(),
                }
            }
        }
        self.mark_end();
    }

    /// Record a cancellation; cancelled assets emit no events of their own
    pub fn mark_cancelled(&mut self, asset_id: Uuid) {
        if let Some(&i) = self.index.get(&asset_id)
            && !self.jobs[i].status.is_terminal()
        {
            self.jobs[i].status = JobStatus::Cancelled;
            self.mark_end();
        }
    }

    /// Record an outcome directly, e.g. one that never produced events
    pub fn mark_failed(&mut self, asset_id: Uuid, error: CompressError) {
        if error == CompressError::Cancelled {
            self.mark_cancelled(asset_id);
        } else {
            self.apply(&PipelineEvent::Failed { asset_id, error });
        }
    }

    fn mark_end(&mut self) {
        if self.is_complete() && self.end_time.is_none() {
            self.end_time = Some(Instant::now());
        }
    }

    /// True only when every job reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.jobs.iter().all(|j| j.status.is_terminal())
    }

    pub fn elapsed_time(&self) -> Option<Duration> {
        self.start_time.map(|start| {
            self.end_time
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    pub fn overall_progress(&self) -> f32 {
        if self.jobs.is_empty() {
            return 0.0;
        }
        let total: f32 = self
            .jobs
            .iter()
            .map(|j| if j.status.is_terminal() { 100.0 } else { j.progress() })
            .sum();
        (total / self.jobs.len() as f32).min(100.0)
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_jobs(&self.jobs)
    }
}

/// Batch totals. Byte totals cover successful jobs only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total_input_bytes: u64,
    pub total_output_bytes: u64,
    /// Mean of the per-job reduction ratios that are defined
    pub mean_reduction: Option<f64>,
}

impl BatchSummary {
    pub fn from_jobs(jobs: &[CompressionJob]) -> Self {
        let mut summary = BatchSummary {
            total: jobs.len(),
            ..Default::default()
        };
        let mut ratios = Vec::new();

        for job in jobs {
            match &job.status {
                JobStatus::Done => {
                    summary.succeeded += 1;
                    let output = job.output_bytes.unwrap_or_default();
                    summary.total_input_bytes += job.input_bytes;
                    summary.total_output_bytes += output;
                    if let Ok(ratio) = reduction_ratio(job.input_bytes, output) {
                        ratios.push(ratio);
                    }
                }
                JobStatus::Failed { .. } => summary.failed += 1,
                JobStatus::Cancelled => summary.cancelled += 1,
                JobStatus::Pending | JobStatus::Running { .. } => {}
            }
        }

        if !ratios.is_empty() {
            summary.mean_reduction = Some(ratios.iter().sum::<f64>() / ratios.len() as f64);
        }
        summary
    }

    pub fn is_complete(&self) -> bool {
        self.succeeded + self.failed + self.cancelled == self.total
    }

    /// Negative when outputs grew overall
    pub fn bytes_saved(&self) -> i64 {
        self.total_input_bytes as i64 - self.total_output_bytes as i64
    }

    pub fn overall_reduction(&self) -> Option<f64> {
        reduction_ratio(self.total_input_bytes, self.total_output_bytes).ok()
    }

    /// Get total space saved, human readable
    pub fn space_saved_string(&self) -> String {
        let saved = self.bytes_saved();
        if saved >= 0 {
            format_file_size(saved as u64)
        } else {
            format!("-{}", format_file_size(saved.unsigned_abs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> Vec<Asset> {
        [("a.mp4", 1000usize), ("b.mp4", 2000), ("c.mp4", 4000)]
            .into_iter()
            .map(|(name, size)| Asset::from_bytes(name, "video/mp4", vec![0u8; size], None).unwrap())
            .collect()
    }

    fn succeeded(asset: &Asset, output_bytes: u64) -> PipelineEvent {
        PipelineEvent::Succeeded {
            asset_id: asset.id,
            input_bytes: asset.byte_size(),
            output_bytes,
            approximate: false,
        }
    }

    #[test]
    fn test_out_of_order_completion() {
        let assets = assets();
        let mut state = BatchState::new(&assets);

        state.apply(&succeeded(&assets[2], 1000));
        assert!(!state.is_complete());
        state.apply(&PipelineEvent::Failed {
            asset_id: assets[1].id,
            error: CompressError::encode_failed("boom"),
        });
        state.apply(&succeeded(&assets[0], 500));
        assert!(state.is_complete());

        let summary = state.summary();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_input_bytes, 5000);
        assert_eq!(summary.total_output_bytes, 1500);
        assert_eq!(summary.bytes_saved(), 3500);
        assert_eq!(summary.overall_reduction(), Some(0.7));
        assert_eq!(summary.mean_reduction, Some(0.625));
        assert!(summary.is_complete());
    }

    #[test]
    fn test_terminal_jobs_ignore_late_events() {
        let assets = assets();
        let mut state = BatchState::new(&assets);
        state.apply(&succeeded(&assets[0], 100));
        state.apply(&PipelineEvent::Progress {
            asset_id: assets[0].id,
            percent: 10.0,
        });
        assert_eq!(state.job(assets[0].id).unwrap().status, JobStatus::Done);
    }

    #[test]
    fn test_cancelled_counts_as_terminal() {
        let assets = assets();
        let mut state = BatchState::new(&assets[..1]);
        state.apply(&PipelineEvent::Started {
            asset_id: assets[0].id,
            name: assets[0].name.clone(),
        });
        assert!(!state.is_complete());
        state.mark_failed(assets[0].id, CompressError::Cancelled);
        assert!(state.is_complete());
        assert_eq!(state.summary().cancelled, 1);
        assert_eq!(state.summary().overall_reduction(), None);
    }

    #[test]
    fn test_progress_never_regresses() {
        let assets = assets();
        let mut state = BatchState::new(&assets);
        let id = assets[0].id;
        state.apply(&PipelineEvent::Progress { asset_id: id, percent: 60.0 });
        state.apply(&PipelineEvent::Progress { asset_id: id, percent: 40.0 });
        assert_eq!(state.job(id).unwrap().progress(), 60.0);
        assert_eq!(state.overall_progress(), 20.0);
    }
}
