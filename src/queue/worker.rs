use crate::analyzer::{FfprobeProber, Prober};
use crate::asset::Asset;
use crate::config::AppConfig;
use crate::encoder::{EncodeDriver, Toolchain};
use crate::error::CompressError;
use crate::resolver::resolve;
use crate::result::CompressionResult;
use crate::settings::Settings;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Lifecycle events of the assets in flight
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Started { asset_id: Uuid, name: String },
    /// Monotonic 0-100
    Progress { asset_id: Uuid, percent: f32 },
    /// Non-fatal problem, e.g. an unknown duration
    Warning { asset_id: Uuid, message: String },
    Succeeded {
        asset_id: Uuid,
        input_bytes: u64,
        output_bytes: u64,
        approximate: bool,
    },
    Failed { asset_id: Uuid, error: CompressError },
}

impl PipelineEvent {
    pub fn asset_id(&self) -> Uuid {
        match self {
            PipelineEvent::Started { asset_id, .. }
            | PipelineEvent::Progress { asset_id, .. }
            | PipelineEvent::Warning { asset_id, .. }
            | PipelineEvent::Succeeded { asset_id, .. }
            | PipelineEvent::Failed { asset_id, .. } => *asset_id,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<PipelineEvent>;

/// One batch member with its own cancellation handle
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub asset: Asset,
    pub cancel: CancellationToken,
}

impl BatchItem {
    /// The item is cancelled with its parent, but can also be cancelled alone
    pub fn new(asset: Asset, parent: &CancellationToken) -> Self {
        Self {
            asset,
            cancel: parent.child_token(),
        }
    }
}

/// Final state of one batch member
#[derive(Debug)]
pub struct AssetOutcome {
    pub asset_id: Uuid,
    pub name: String,
    pub result: Result<CompressionResult, CompressError>,
}

/// Probe, resolve, encode, and report for each asset
#[derive(Clone)]
pub struct Compressor {
    prober: Arc<dyn Prober>,
    driver: Arc<EncodeDriver>,
    config: Arc<AppConfig>,
}

impl Compressor {
    pub fn new(prober: Arc<dyn Prober>, driver: Arc<EncodeDriver>, config: Arc<AppConfig>) -> Self {
        Self {
            prober,
            driver,
            config,
        }
    }

    /// ffprobe plus the ffmpeg/ghostscript toolchain
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let prober = Arc::new(FfprobeProber::new(&config.analyzer));
        let driver = EncodeDriver::new(Arc::new(Toolchain::from_config(&config)), &config.encoder)
            .with_file_prefix(config.output.prefix.clone());
        Self::new(prober, Arc::new(driver), config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the whole pipeline for one asset.
    ///
    /// Once `cancel` fires nothing more is sent for the asset, not even a
    /// failure, and `Cancelled` is returned.
    pub async fn compress(
        &self,
        asset: &Asset,
        settings: &Settings,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Result<CompressionResult, CompressError> {
        if cancel.is_cancelled() {
            return Err(CompressError::Cancelled);
        }
        let asset_id = asset.id;
        let _ = events.send(PipelineEvent::Started {
            asset_id,
            name: asset.name.clone(),
        });

        let outcome = self.run_stages(asset, settings, cancel, events).await;

        if cancel.is_cancelled() {
            info!("{} cancelled", asset.name);
            return Err(CompressError::Cancelled);
        }
        match &outcome {
            Ok(result) => {
                info!(
                    "{} compressed: {} -> {} bytes",
                    asset.name, result.input_bytes, result.output_bytes
                );
                let _ = events.send(PipelineEvent::Succeeded {
                    asset_id,
                    input_bytes: result.input_bytes,
                    output_bytes: result.output_bytes,
                    approximate: result.approximate,
                });
            }
            Err(CompressError::Cancelled) => {}
            Err(e) => {
                warn!("{} failed: {}", asset.name, e);
                let _ = events.send(PipelineEvent::Failed {
                    asset_id,
                    error: e.clone(),
                });
            }
        }
        outcome
    }

    async fn run_stages(
        &self,
        asset: &Asset,
        settings: &Settings,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Result<CompressionResult, CompressError> {
        let asset_id = asset.id;

        let metadata = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CompressError::Cancelled),
            metadata = self.prober.probe(asset) => metadata?,
        };

        if asset.kind.is_time_based() && metadata.usable_duration().is_none() {
            let _ = events.send(PipelineEvent::Warning {
                asset_id,
                message: format!("Duration of {} is unknown", asset.name),
            });
        }

        let params = resolve(asset.kind, &metadata, settings, &self.config)?;

        let progress_events = events.clone();
        let progress_cancel = cancel.clone();
        self.driver
            .encode(asset, &params, settings, cancel, move |percent| {
                if !progress_cancel.is_cancelled() {
                    let _ = progress_events.send(PipelineEvent::Progress { asset_id, percent });
                }
            })
            .await
    }

    /// Compress a batch under one cancellation token
    pub async fn compress_batch(
        &self,
        assets: Vec<Asset>,
        settings: &Settings,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Vec<AssetOutcome> {
        let items = assets
            .into_iter()
            .map(|asset| BatchItem::new(asset, cancel))
            .collect();
        self.run_batch(items, settings, events).await
    }

    /// Every item runs as its own task; a failure never stops its siblings.
    /// Outcomes come back in input order.
    pub async fn run_batch(
        &self,
        items: Vec<BatchItem>,
        settings: &Settings,
        events: &EventSender,
    ) -> Vec<AssetOutcome> {
        let names: Vec<(Uuid, String)> = items
            .iter()
            .map(|item| (item.asset.id, item.asset.name.clone()))
            .collect();
        let mut outcomes: Vec<Option<AssetOutcome>> = items.iter().map(|_| None).collect();

        let mut tasks = JoinSet::new();
        for (index, item) in items.into_iter().enumerate() {
            let compressor = self.clone();
            let settings = settings.clone();
            let events = events.clone();
            tasks.spawn(async move {
                let result = compressor
                    .compress(&item.asset, &settings, &item.cancel, &events)
                    .await;
                (
                    index,
                    AssetOutcome {
                        asset_id: item.asset.id,
                        name: item.asset.name,
                        result,
                    },
                )
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => error!("Compression task failed: {}", e),
            }
        }

        outcomes
            .into_iter()
            .zip(names)
            .map(|(outcome, (asset_id, name))| {
                outcome.unwrap_or_else(|| AssetOutcome {
                    asset_id,
                    name,
                    result: Err(CompressError::encode_failed("compression task aborted")),
                })
            })
            .collect()
    }
}
