use crate::foundation::error::{RaceError, RaceResult};

/// Fixed-length rolling history of growth ratios, oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct GrowthTrace {
    values: Vec<f64>,
}

impl GrowthTrace {
    pub fn new(len: usize) -> RaceResult<Self> {
        if len == 0 {
            return Err(RaceError::validation("growth trace length must be > 0"));
        }
        Ok(Self {
            values: vec![0.0; len],
        })
    }

    /// Drop the oldest value, shift the rest toward the front and append `ratio`.
    ///
    /// On a fresh trace this leaves every slot zero except the last.
    pub fn push(&mut self, ratio: f64) {
        self.values.rotate_left(1);
        if let Some(last) = self.values.last_mut() {
            *last = ratio;
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    /// Mean of the `window` most recent values (clamped to the trace length).
    pub fn recent_mean(&self, window: usize) -> f64 {
        let window = window.clamp(1, self.values.len());
        let tail = &self.values[self.values.len() - window..];
        tail.iter().sum::<f64>() / window as f64
    }

    /// Vertical range `mean * (1 - zoom) ..= mean * (1 + zoom)` of the sparkline.
    pub fn inset_range(&self, window: usize, zoom: f64) -> (f64, f64) {
        let mean = self.recent_mean(window);
        (mean - mean * zoom, mean + mean * zoom)
    }
}
