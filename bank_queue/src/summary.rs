//! Headline numbers the dashboard shows for a run.

/// Customers who waited strictly longer than this many minutes are counted
/// as having had a long wait.
pub const DEFAULT_WAIT_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SummaryError {
    #[error("no customers were served, so there are no waiting times to summarise")]
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaitSummary {
    pub customers: usize,
    pub mean: f64,
    pub max: f64,
    pub threshold: f64,
    pub over_threshold: usize,
}

impl WaitSummary {
    pub fn from_waits(waits: &[f64], threshold: f64) -> Result<WaitSummary, SummaryError> {
        if waits.is_empty() {
            return Err(SummaryError::InsufficientData);
        }
        let customers = waits.len();
        let mean = waits.iter().sum::<f64>() / customers as f64;
        let max = waits.iter().copied().fold(0.0, f64::max);
        let over_threshold = waits.iter().filter(|w| **w > threshold).count();
        Ok(WaitSummary {
            customers,
            mean,
            max,
            threshold,
            over_threshold,
        })
    }

    /// Fraction in `[0, 1]` of customers who waited longer than the threshold.
    pub fn share_over_threshold(&self) -> f64 {
        self.over_threshold as f64 / self.customers as f64
    }
}
