pub mod job;
pub mod state;
pub mod worker;

pub use job::{CompressionJob, JobStatus};
pub use state::{BatchState, BatchSummary};
pub use worker::{AssetOutcome, BatchItem, Compressor, EventSender, PipelineEvent};
