/// Turns raw encoder progress into a clean 0-100 sequence.
///
/// Values are clamped, never go backwards, and repeats are dropped.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<f32>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value to publish, if any
    pub fn update(&mut self, raw: f32) -> Option<f32> {
        if !raw.is_finite() {
            return None;
        }
        let value = raw.clamp(0.0, 100.0);
        match self.last {
            Some(last) if value <= last => None,
            _ => {
                self.last = Some(value);
                Some(value)
            }
        }
    }

    /// Publish the final 100 unless it already went out
    pub fn finish(&mut self) -> Option<f32> {
        self.update(100.0)
    }

    pub fn last(&self) -> Option<f32> {
        self.last
    }
}
