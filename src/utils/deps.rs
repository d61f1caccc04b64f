use crate::config::AppConfig;
use std::process::Command;

/// Availability of the external tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    pub ffmpeg: bool,
    pub ffprobe: bool,
    pub ghostscript: bool,
}

impl DependencyStatus {
    /// Check all dependencies
    pub fn check(config: &AppConfig) -> Self {
        Self {
            ffmpeg: check_command(&config.encoder.ffmpeg_path, &["-version"]),
            ffprobe: check_command(&config.analyzer.ffprobe_path, &["-version"]),
            ghostscript: check_command(&config.encoder.ghostscript_path, &["--version"]),
        }
    }

    /// Names of the tools that could not be run
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (self.ffmpeg, "ffmpeg"),
            (self.ffprobe, "ffprobe"),
            (self.ghostscript, "ghostscript"),
        ]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, name)| name)
        .collect()
    }
}

/// Check if a command is available
fn check_command(cmd: &str, args: &[&str]) -> bool {
    Command::new(cmd)
        .args(args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}
