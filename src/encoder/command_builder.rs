use crate::asset::MediaKind;
use crate::config::EncoderConfig;
use crate::resolver::{RateControl, ResolvedParameters};
use std::path::Path;

/// Build FFmpeg arguments for an image, video, or audio encode
pub fn build_ffmpeg_args(
    params: &ResolvedParameters,
    input: &Path,
    output: &Path,
    config: &EncoderConfig,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-nostdin".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
    ];

    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match params.kind {
        MediaKind::Video => args.extend(video_args(params, config)),
        MediaKind::Audio => args.extend(audio_args(params, config, &extension)),
        MediaKind::Image => args.extend(image_args(params, &extension)),
        MediaKind::Pdf => {}
    }

    for tag in &params.cleared_tags {
        args.extend(["-metadata".to_string(), format!("{}=", tag)]);
    }

    args.extend([
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
    ]);
    args.push(output.to_string_lossy().to_string());
    args
}

fn video_args(params: &ResolvedParameters, config: &EncoderConfig) -> Vec<String> {
    let mut args = vec!["-map".to_string(), "0:v:0".to_string()];
    if !params.strip_audio {
        args.extend(["-map".to_string(), "0:a?".to_string()]);
    }

    args.extend([
        "-c:v".to_string(),
        config.video_codec.clone(),
        "-preset".to_string(),
        config.preset.clone(),
    ]);

    if let Some(filter) = scale_filter(params) {
        args.extend(["-vf".to_string(), filter]);
    }

    if let RateControl::Bitrate { bps } = params.rate {
        args.extend([
            "-b:v".to_string(),
            bps.to_string(),
            "-maxrate".to_string(),
            bps.to_string(),
            "-bufsize".to_string(),
            (bps * 2).to_string(),
        ]);
    }

    match params.audio_bitrate {
        Some(bps) if !params.strip_audio => args.extend([
            "-c:a".to_string(),
            config.audio_codec.clone(),
            "-b:a".to_string(),
            bps.to_string(),
        ]),
        _ => args.push("-an".to_string()),
    }

    args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    args
}

fn audio_args(params: &ResolvedParameters, config: &EncoderConfig, extension: &str) -> Vec<String> {
    let mut args = vec!["-map".to_string(), "0:a:0".to_string()];
    if params.strip_cover_art {
        args.push("-vn".to_string());
    } else {
        // Cover art is an attached picture stream; copy it untouched
        args.extend([
            "-map".to_string(),
            "0:v?".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
        ]);
    }

    let codec = match extension {
        "mp3" => "libmp3lame".to_string(),
        _ => config.audio_codec.clone(),
    };
    args.extend(["-c:a".to_string(), codec]);

    if let RateControl::Bitrate { bps } = params.rate {
        args.extend(["-b:a".to_string(), bps.to_string()]);
    }
    args
}

fn image_args(params: &ResolvedParameters, extension: &str) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(filter) = scale_filter(params) {
        args.extend(["-vf".to_string(), filter]);
    }
    args.extend(["-frames:v".to_string(), "1".to_string()]);

    let factor = match params.rate {
        RateControl::Quality { factor } => factor,
        RateControl::Bitrate { .. } => 75,
    };

    match extension {
        "webp" => args.extend([
            "-c:v".to_string(),
            "libwebp".to_string(),
            "-quality".to_string(),
            factor.to_string(),
        ]),
        // Lossless; only the resize shrinks it
        "png" => args.extend(["-compression_level".to_string(), "9".to_string()]),
        _ => args.extend(["-q:v".to_string(), jpeg_qscale(factor).to_string()]),
    }
    args
}

/// Map a 0-100 quality factor onto mjpeg's 2 (best) - 31 (worst) qscale
pub fn jpeg_qscale(factor: u8) -> u8 {
    let factor = u32::from(factor.min(100));
    (2 + ((100 - factor) * 29 + 50) / 100) as u8
}

fn scale_filter(params: &ResolvedParameters) -> Option<String> {
    if params.scale >= 1.0 {
        return None;
    }
    match (params.width, params.height) {
        (Some(w), Some(h)) => Some(format!("scale={}:{}", w, h)),
        _ => None,
    }
}

/// Build Ghostscript arguments that re-render a PDF at the given image resolution
pub fn build_ghostscript_args(params: &ResolvedParameters, base_dpi: u32, input: &Path, output: &Path) -> Vec<String> {
    let dpi = ((f64::from(base_dpi) * params.scale).round() as u32).max(1);
    let mut args: Vec<String> = [
        "-sDEVICE=pdfwrite",
        "-dCompatibilityLevel=1.4",
        "-dNOPAUSE",
        "-dQUIET",
        "-dBATCH",
        "-dSAFER",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for class in ["Color", "Gray", "Mono"] {
        args.push(format!("-dDownsample{}Images=true", class));
        args.push(format!("-d{}ImageResolution={}", class, dpi));
    }

    args.push(format!("-sOutputFile={}", output.to_string_lossy()));
    args.push(input.to_string_lossy().to_string());
    args
}
