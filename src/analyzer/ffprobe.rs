use super::{AssetMetadata, Prober};
use crate::asset::{Asset, MediaKind};
use crate::config::AnalyzerConfig;
use crate::error::CompressError;
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Probes assets with the ffprobe binary
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            binary: config.ffprobe_path.clone(),
            timeout: Duration::from_secs(config.probe_timeout_secs),
        }
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    async fn probe(&self, asset: &Asset) -> Result<AssetMetadata, CompressError> {
        if asset.kind == MediaKind::Pdf {
            return Ok(AssetMetadata::new(asset.byte_size()));
        }

        // Lives until the end of this call, deleted on every exit path
        let handle = asset
            .write_temp_copy("mediashrink_probe_")
            .map_err(|e| CompressError::ProbeFailed(format!("Failed to write temp file: {}", e)))?;
        let path = handle.path().to_string_lossy().to_string();

        let args = [
            "-v",
            "error",
            "-show_entries",
            "stream=codec_type,width,height,r_frame_rate,avg_frame_rate,duration:stream_disposition=attached_pic",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
            path.as_str(),
        ];

        let output = run_ffprobe(&self.binary, &args, self.timeout).await?;
        let metadata = parse_probe_output(&output, asset.kind, asset.byte_size())?;
        debug!(
            "Probed {}: {} duration={:?}",
            asset.name,
            metadata.resolution_string(),
            metadata.duration_secs
        );
        Ok(metadata)
    }
}

/// Run ffprobe with arguments, bounded by a timeout
async fn run_ffprobe(binary: &str, args: &[&str], timeout: Duration) -> Result<String, CompressError> {
    let child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CompressError::ProbeFailed(format!("Failed to execute ffprobe: {}", e)))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            CompressError::ProbeFailed(format!("ffprobe timed out after {}s", timeout.as_secs()))
        })?
        .map_err(|e| CompressError::ProbeFailed(format!("Failed to wait for ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CompressError::ProbeFailed(format!(
            "ffprobe failed: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Turn ffprobe JSON into metadata for the given media family
pub(crate) fn parse_probe_output(
    json: &str,
    kind: MediaKind,
    byte_size: u64,
) -> Result<AssetMetadata, CompressError> {
    let data: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| CompressError::ProbeFailed(format!("Failed to parse ffprobe output: {}", e)))?;

    let mut metadata = AssetMetadata::new(byte_size);

    let visual = data.streams.iter().find(|s| {
        s.codec_type.as_deref() == Some("video")
            && !s.disposition.as_ref().is_some_and(|d| d.attached_pic == 1)
    });

    if let Some(stream) = visual {
        metadata.width = stream.width;
        metadata.height = stream.height;
        metadata.frame_rate = parse_frame_rate(
            stream
                .avg_frame_rate
                .as_deref()
                .or(stream.r_frame_rate.as_deref()),
        );
    }

    if matches!(kind, MediaKind::Video | MediaKind::Image) && metadata.dimensions().is_none() {
        return Err(CompressError::ProbeFailed(
            "No video stream with dimensions found".to_string(),
        ));
    }

    if kind.is_time_based() {
        metadata.duration_secs = data
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
            .or_else(|| {
                data.streams
                    .iter()
                    .filter_map(|s| s.duration.as_deref()?.parse::<f64>().ok())
                    .reduce(f64::max)
            })
            .filter(|d| d.is_finite() && *d > 0.0);
    }

    Ok(metadata)
}

/// Parse frame rate from ffprobe's num/den format
fn parse_frame_rate(rate_str: Option<&str>) -> Option<f64> {
    let (num, den) = rate_str?.split_once('/')?;
    let num = num.parse::<f64>().ok()?;
    let den = den.parse::<f64>().ok()?;
    if den > 0.0 && num > 0.0 {
        Some(num / den)
    } else {
        None
    }
}

// JSON deserialization structures

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<RawStream>,
    format: Option<FormatInfo>,
}

#[derive(Debug, Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    disposition: Option<Disposition>,
}

#[derive(Debug, Deserialize)]
struct Disposition {
    #[serde(default)]
    attached_pic: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_JSON: &str = r#"{
        "streams": [
            {"codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30000/1001", "avg_frame_rate": "30000/1001"},
            {"codec_type": "audio"}
        ],
        "format": {"duration": "12.500000"}
    }"#;

    #[test]
    fn test_parse_video() {
        let meta = parse_probe_output(VIDEO_JSON, MediaKind::Video, 1000).unwrap();
        assert_eq!(meta.dimensions(), Some((1920, 1080)));
        assert_eq!(meta.duration_secs, Some(12.5));
        let fps = meta.frame_rate.unwrap();
        assert!((fps - 29.97).abs() < 0.01);
        assert_eq!(meta.byte_size, 1000);
    }

    #[test]
    fn test_audio_ignores_cover_art() {
        let json = r#"{
            "streams": [
                {"codec_type": "audio", "duration": "180.2"},
                {"codec_type": "video", "width": 600, "height": 600, "disposition": {"attached_pic": 1}}
            ],
            "format": {}
        }"#;
        let meta = parse_probe_output(json, MediaKind::Audio, 5).unwrap();
        assert_eq!(meta.dimensions(), None);
        assert_eq!(meta.duration_secs, Some(180.2));
    }

    #[test]
    fn test_image_has_no_duration() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 800, "height": 600}], "format": {"duration": "0.04"}}"#;
        let meta = parse_probe_output(json, MediaKind::Image, 5).unwrap();
        assert_eq!(meta.dimensions(), Some((800, 600)));
        assert_eq!(meta.duration_secs, None);
    }

    #[test]
    fn test_missing_duration_is_not_fatal() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 360}], "format": {"duration": "N/A"}}"#;
        let meta = parse_probe_output(json, MediaKind::Video, 5).unwrap();
        assert_eq!(meta.duration_secs, None);
    }

    #[test]
    fn test_video_without_stream_fails() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        let err = parse_probe_output(json, MediaKind::Video, 5).unwrap_err();
        assert!(matches!(err, CompressError::ProbeFailed(_)));
    }

    #[test]
    fn test_garbage_fails() {
        assert!(parse_probe_output("not json", MediaKind::Audio, 5).is_err());
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate(Some("25/1")), Some(25.0));
        assert_eq!(parse_frame_rate(Some("0/0")), None);
        assert_eq!(parse_frame_rate(Some("garbage")), None);
        assert_eq!(parse_frame_rate(None), None);
    }

    #[tokio::test]
    async fn test_pdf_skips_ffprobe() {
        let prober = FfprobeProber::new(&AnalyzerConfig {
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            probe_timeout_secs: 1,
        });
        let asset = Asset::from_bytes("doc.pdf", "application/pdf", vec![0u8; 64], None).unwrap();
        let meta = prober.probe(&asset).await.unwrap();
        assert_eq!(meta, AssetMetadata::new(64));
    }

    #[tokio::test]
    async fn test_missing_binary_is_probe_failure() {
        let prober = FfprobeProber::new(&AnalyzerConfig {
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            probe_timeout_secs: 1,
        });
        let asset = Asset::from_bytes("a.mp3", "audio/mpeg", vec![0u8; 64], None).unwrap();
        let err = prober.probe(&asset).await.unwrap_err();
        assert!(matches!(err, CompressError::ProbeFailed(_)));
    }
}
