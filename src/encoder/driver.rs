use super::{EncodeRequest, EncodingCapability, ProgressTracker};
use crate::asset::Asset;
use crate::config::EncoderConfig;
use crate::error::CompressError;
use crate::package::suggested_file_name;
use crate::resolver::ResolvedParameters;
use crate::result::CompressionResult;
use crate::settings::Settings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default output name prefix
pub const DEFAULT_FILE_PREFIX: &str = "compressed_";

/// Runs encodes on a shared capability, a bounded number at a time
pub struct EncodeDriver {
    capability: Arc<dyn EncodingCapability>,
    permits: Arc<Semaphore>,
    timeout_floor: Duration,
    timeout_slack: Duration,
    file_prefix: String,
}

impl EncodeDriver {
    pub fn new(capability: Arc<dyn EncodingCapability>, config: &EncoderConfig) -> Self {
        let parallel = config.max_parallel.min(capability.max_parallel()).max(1);
        Self {
            capability,
            permits: Arc::new(Semaphore::new(parallel)),
            timeout_floor: Duration::from_secs(config.timeout_floor_secs),
            timeout_slack: Duration::from_secs(config.timeout_slack_secs),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Encode deadline: the media duration plus slack, never below the floor
    pub fn timeout_for(&self, params: &ResolvedParameters) -> Duration {
        let expected = params
            .duration_secs
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| Duration::from_secs_f64(d) + self.timeout_slack)
            .unwrap_or_default();
        expected.max(self.timeout_floor)
    }

    /// Encode one asset.
    ///
    /// `on_progress` receives monotonic 0-100 values and is never called
    /// after cancellation is observed.
    pub async fn encode<F>(
        &self,
        asset: &Asset,
        params: &ResolvedParameters,
        settings: &Settings,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<CompressionResult, CompressError>
    where
        F: FnMut(f32) + Send,
    {
        if !self.capability.supports(asset.kind) {
            return Err(CompressError::UnsupportedType {
                mime: asset.mime_type.clone(),
                expected: None,
            });
        }

        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CompressError::Cancelled),
            permit = self.permits.clone().acquire_owned() => permit
                .map_err(|_| CompressError::encode_failed("encoder is shut down"))?,
        };

        // Measured from here so queued assets are not penalized
        let limit = self.timeout_for(params);
        let deadline = tokio::time::sleep(limit);
        tokio::pin!(deadline);

        let request = EncodeRequest::new(asset.clone(), params.clone());
        let extension = request.output_extension();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let child = cancel.child_token();
        let encode = self.capability.encode(request, tx, child.clone());
        tokio::pin!(encode);

        debug!(
            "Encoding {} with a {}s limit",
            asset.name,
            limit.as_secs()
        );

        let mut tracker = ProgressTracker::new();
        let output = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    child.cancel();
                    info!("Encoding of {} cancelled", asset.name);
                    return Err(CompressError::Cancelled);
                }
                _ = &mut deadline => {
                    child.cancel();
                    warn!("Encoding of {} timed out after {}s", asset.name, limit.as_secs());
                    return Err(CompressError::EncodeTimedOut { after: limit });
                }
                Some(raw) = rx.recv() => {
                    if let Some(value) = tracker.update(raw) {
                        on_progress(value);
                    }
                }
                result = &mut encode => break result?,
            }
        };

        while let Ok(raw) = rx.try_recv() {
            if let Some(value) = tracker.update(raw) {
                on_progress(value);
            }
        }

        if output.is_empty() {
            return Err(CompressError::encode_failed("encoder produced no output"));
        }
        if let Some(value) = tracker.finish() {
            on_progress(value);
        }

        let file_name = suggested_file_name(&self.file_prefix, &asset.name, &extension);
        Ok(CompressionResult::new(
            asset.id,
            file_name,
            output,
            asset.byte_size(),
            settings.clone(),
            params.approximate,
        ))
    }
}
