use anyhow::{Context, bail};
use clap::Parser;
use mediashrink::asset::{Asset, is_media_file};
use mediashrink::cli::Args;
use mediashrink::config::AppConfig;
use mediashrink::drift::{DriftStatus, drift_status};
use mediashrink::error::AppError;
use mediashrink::package::{DirectoryPackager, Manifest, PackageEntry, Packager, bundle_name};
use mediashrink::queue::{BatchState, Compressor, PipelineEvent};
use mediashrink::settings::Settings;
use mediashrink::utils::{DependencyStatus, format_duration, format_file_size, init_logging};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_logging();

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::load(),
    };
    let settings = args.settings(&config.video)?;

    let deps = DependencyStatus::check(&config);
    if !deps.ffmpeg || !deps.ffprobe {
        bail!("required tools missing: {}", deps.missing().join(", "));
    }
    if !deps.ghostscript {
        warn!("ghostscript not found, PDFs will fail");
    }

    let paths = collect_inputs(&args.inputs);
    if paths.is_empty() {
        bail!("no media files found in the given inputs");
    }

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.output.directory.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(bundle_name(args.kind, chrono::Local::now().date_naive())));
    let manifest_path = output_dir.join(&config.output.manifest_name);
    let mut manifest = Manifest::load(&manifest_path);

    let mut keys: HashMap<Uuid, String> = HashMap::new();
    let mut assets = Vec::new();
    for path in &paths {
        let asset = match Asset::from_path(path, args.kind) {
            Ok(asset) => asset,
            Err(AppError::Compress(e)) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let key = path.display().to_string();
        if !args.force && is_up_to_date(&manifest, &key, &asset, &settings, &output_dir) {
            info!("{} is up to date, skipping", key);
            continue;
        }
        keys.insert(asset.id, key);
        assets.push(asset);
    }

    if assets.is_empty() {
        info!("Nothing to do");
        return Ok(());
    }
    info!("Compressing {} file(s) with {}", assets.len(), settings.objective);

    let compressor = Compressor::from_config(Arc::new(config));
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            ctrl_c.cancel();
        }
    });

    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(report_events(BatchState::new(&assets), rx));
    let outcomes = compressor.compress_batch(assets, &settings, &cancel, &tx).await;
    drop(tx);
    let mut state = reporter.await.context("event reporter stopped")?;

    let mut entries = Vec::new();
    let mut finished = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(mut result) => {
                let bytes = std::mem::take(&mut result.output);
                entries.push(PackageEntry::new(result.file_name.clone(), bytes));
                finished.push((outcome.asset_id, result));
            }
            Err(e) => {
                if e.is_retryable() {
                    info!("{}: retrying with other settings may help", outcome.name);
                }
                state.mark_failed(outcome.asset_id, e);
            }
        }
    }

    if !entries.is_empty() {
        let packager = DirectoryPackager::new(&output_dir);
        let written = packager.package(&entries)?;
        for ((asset_id, result), path) in finished.iter_mut().zip(&written) {
            // The packager may have renamed a clashing output
            if let Some(name) = path.file_name() {
                result.file_name = name.to_string_lossy().to_string();
            }
            if let Some(key) = keys.get(asset_id) {
                manifest.record(key.clone(), result);
            }
        }
        manifest.save(&manifest_path)?;
    }

    print_summary(&state, &output_dir);
    let failed = state.summary().failed;
    if failed > 0 {
        bail!("{} file(s) failed", failed);
    }
    Ok(())
}

/// Expand directories into the media files below them
fn collect_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_media_file(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            paths.extend(found);
        } else if input.is_file() {
            paths.push(input.clone());
        } else {
            warn!("{} does not exist", input.display());
        }
    }
    paths
}

/// Same input, same settings, and the output is still on disk
fn is_up_to_date(manifest: &Manifest, key: &str, asset: &Asset, settings: &Settings, output_dir: &Path) -> bool {
    let Some(entry) = manifest.get(key) else {
        return false;
    };
    entry.input_bytes == asset.byte_size()
        && output_dir.join(&entry.output).exists()
        && drift_status(settings, Some(entry)) == DriftStatus::UpToDate
}

async fn report_events(mut state: BatchState, mut rx: mpsc::UnboundedReceiver<PipelineEvent>) -> BatchState {
    let names: HashMap<Uuid, String> = state
        .jobs()
        .iter()
        .map(|j| (j.asset_id, j.name.clone()))
        .collect();
    let mut last_logged: HashMap<Uuid, u32> = HashMap::new();

    while let Some(event) = rx.recv().await {
        let id = event.asset_id();
        let name = names.get(&id).map(String::as_str).unwrap_or("unknown");
        match &event {
            PipelineEvent::Started { .. } => info!("Started {}", name),
            PipelineEvent::Progress { percent, .. } => {
                // Log every 10%
                let step = (*percent / 10.0) as u32;
                if last_logged.get(&id).is_none_or(|last| step > *last) {
                    last_logged.insert(id, step);
                    debug!("{}: {:.0}%", name, percent);
                }
            }
            PipelineEvent::Warning { message, .. } => warn!("{}", message),
            PipelineEvent::Succeeded {
                input_bytes,
                output_bytes,
                approximate,
                ..
            } => info!(
                "Finished {}: {} -> {}{}",
                name,
                format_file_size(*input_bytes),
                format_file_size(*output_bytes),
                if *approximate { " (approximate)" } else { "" }
            ),
            PipelineEvent::Failed { error, .. } => error!("Failed {}: {}", name, error),
        }
        state.apply(&event);
    }
    state
}

fn print_summary(state: &BatchState, output_dir: &Path) {
    let summary = state.summary();
    println!();
    println!(
        "{} succeeded, {} failed, {} cancelled",
        summary.succeeded, summary.failed, summary.cancelled
    );
    if summary.succeeded > 0 {
        println!(
            "{} -> {} (saved {}{})",
            format_file_size(summary.total_input_bytes),
            format_file_size(summary.total_output_bytes),
            summary.space_saved_string(),
            summary
                .overall_reduction()
                .map(|r| format!(", {:.1}%", r * 100.0))
                .unwrap_or_default()
        );
        println!("Output: {}", output_dir.display());
    }
    if let Some(elapsed) = state.elapsed_time() {
        println!("Time: {}", format_duration(elapsed));
    }
}
