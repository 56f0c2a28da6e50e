//! Run the desk once per mean interarrival time, in parallel.
//!
//! Every point shares the same seed, so the comparison between points uses
//! common random numbers: only the arrival rate changes between scenarios.

use des::parallel::{ParallelRunner, progress_logger};
use rand::Rng;

use crate::config::{ParameterError, QueueConfig};
use crate::summary::WaitSummary;
use crate::{QueueModel, desk_stats};

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub mean_interarrival: f64,
    pub seed: u64,
    pub outcome: Result<WaitSummary, String>,
}

/// Every `means` value is validated before any scenario starts; a single bad
/// value fails the whole sweep.
pub fn sweep_mean_interarrival(
    base: &QueueConfig,
    means: &[f64],
    threshold: f64,
    threads: Option<usize>,
) -> Result<Vec<SweepPoint>, ParameterError> {
    let models = means
        .iter()
        .map(|&mean| base.clone().with_mean_interarrival(mean).model())
        .collect::<Result<Vec<QueueModel>, _>>()?;
    let seed = base.seed.unwrap_or_else(|| rand::rng().random());
    tracing::info!(points = models.len(), seed, "starting sweep");

    let mut runner = ParallelRunner::new(models.len(), |scenario_id| models[scenario_id].event_loop(seed))
        .progress(progress_logger(10));
    if let Some(n) = threads {
        runner = runner.num_threads(n);
    }
    let results = runner.run(base.horizon);

    let points = means
        .iter()
        .zip(results)
        .map(|(&mean_interarrival, result)| {
            let outcome = result.and_then(|stats| {
                let desk = desk_stats(stats).ok_or_else(|| "scenario produced no desk stats".to_string())?;
                WaitSummary::from_waits(&desk.waiting_times, threshold).map_err(|e| e.to_string())
            });
            SweepPoint {
                mean_interarrival,
                seed,
                outcome,
            }
        })
        .collect();
    Ok(points)
}
