/// Intrinsic properties of an asset needed for parameter derivation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetMetadata {
    pub byte_size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
    pub frame_rate: Option<f64>,
}

impl AssetMetadata {
    pub fn new(byte_size: u64) -> Self {
        Self {
            byte_size,
            ..Default::default()
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }

    /// Both dimensions, if known and non-zero
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    /// Duration, if known and positive
    pub fn usable_duration(&self) -> Option<f64> {
        self.duration_secs.filter(|d| d.is_finite() && *d > 0.0)
    }

    pub fn resolution_string(&self) -> String {
        self.dimensions()
            .map(|(w, h)| format!("{}x{}", w, h))
            .unwrap_or_else(|| "Unknown".to_string())
    }
}
