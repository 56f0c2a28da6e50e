/// Waiting times in the order customers were admitted to service.
///
/// Append-only: the desk records one entry per admitted customer and the
/// caller reads the whole log once the run is over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaitingTimeLog {
    waits: Vec<f64>,
}

impl WaitingTimeLog {
    pub fn new() -> WaitingTimeLog {
        WaitingTimeLog::default()
    }

    pub fn record(&mut self, waiting_time: f64) {
        self.waits.push(waiting_time);
    }

    pub fn results(&self) -> &[f64] {
        &self.waits
    }

    pub fn len(&self) -> usize {
        self.waits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waits.is_empty()
    }

    pub fn into_results(self) -> Vec<f64> {
        self.waits
    }
}
