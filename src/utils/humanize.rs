use humansize::{BINARY, format_size};
use std::time::Duration;

/// Format bytes as a human-readable size (e.g. "4.50 MiB")
pub fn format_file_size(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// Format a duration as HH:MM:SS, or MM:SS under an hour
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1024 * 1024), "1 MiB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(75)), "01:15");
        assert_eq!(format_duration(Duration::from_secs(3725)), "01:02:05");
    }
}
