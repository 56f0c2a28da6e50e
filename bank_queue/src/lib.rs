//! Mobile-money desk queue simulation.
//!
//! Customers arrive with exponential gaps, queue in front of a single desk,
//! and are served first-come-first-served for a uniformly distributed time.
//! A run returns the waiting time of every customer admitted before the
//! horizon, in admission order.
//!
//! ```rust
//! let waits = bank_queue::simulate_queue(300.0, 3.0, (1.0, 4.0), Some(42)).unwrap();
//! assert!(waits.iter().all(|w| *w >= 0.0));
//! ```

use des::{CausalityError, EventLoop};
use rand::Rng;
use rand::distr::Uniform;
use rand_distr::Exp;

pub mod arrivals;
pub mod collector;
pub mod config;
pub mod desk;
pub mod summary;
pub mod sweep;

pub use arrivals::{ArrivalProcess, ArrivalStats};
pub use collector::WaitingTimeLog;
pub use config::{ConfigError, ParameterError, QueueConfig};
pub use desk::{Admission, Customer, DeskStats, ServiceDesk};
pub use summary::{DEFAULT_WAIT_THRESHOLD, SummaryError, WaitSummary};
pub use sweep::{SweepPoint, sweep_mean_interarrival};

/// Service draws use their own stream, derived from the run seed, so that
/// they never shift the arrival draws.
pub const SERVICE_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start,
    CustomerArrived { customer_id: usize },
    ServiceCompleted { customer_id: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stats {
    ArrivalStats(ArrivalStats),
    DeskStats(DeskStats),
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    #[error(transparent)]
    Causality(#[from] CausalityError),
}

/// Validated parameters with their sampling distributions built.
#[derive(Debug, Clone, Copy)]
pub struct QueueModel {
    horizon: f64,
    interarrival: Exp<f64>,
    service: Uniform<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub seed: u64,
    /// Clock value when the run stopped; the time of the last dispatched event.
    pub end_t: f64,
    pub waiting_times: Vec<f64>,
    pub admissions: Vec<Admission>,
    pub arrivals: usize,
    pub completed: usize,
    pub queue_length: usize,
    pub total_service_time: f64,
}

/// The desk's stats out of a run's agent stats, if a desk took part.
pub fn desk_stats(stats: Vec<Stats>) -> Option<DeskStats> {
    stats.into_iter().find_map(|s| match s {
        Stats::DeskStats(desk) => Some(desk),
        _ => None,
    })
}

impl SimulationReport {
    /// A run without a desk reports nobody served, and logs a warning.
    pub fn from_stats(seed: u64, end_t: f64, stats: Vec<Stats>) -> SimulationReport {
        let desk = desk_stats(stats).unwrap_or_else(|| {
            tracing::warn!(seed, "no desk stats in simulation output");
            DeskStats::default()
        });
        SimulationReport {
            seed,
            end_t,
            waiting_times: desk.waiting_times,
            admissions: desk.admissions,
            arrivals: desk.arrivals,
            completed: desk.completed,
            queue_length: desk.queue_length,
            total_service_time: desk.total_service_time,
        }
    }
}

impl QueueModel {
    pub(crate) fn new(horizon: f64, interarrival: Exp<f64>, service: Uniform<f64>) -> QueueModel {
        QueueModel {
            horizon,
            interarrival,
            service,
        }
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// A fresh event loop holding the arrival process and the desk, with the
    /// bootstrap event at t = 0.
    pub fn event_loop(&self, seed: u64) -> EventLoop<Event, Stats> {
        let agents: Vec<Box<dyn des::Agent<Event, Stats>>> = vec![
            Box::new(ArrivalProcess::new(self.interarrival, seed)),
            Box::new(ServiceDesk::new(self.service, seed ^ SERVICE_STREAM)),
        ];
        EventLoop::new(vec![(0.0, Event::Start)], agents)
    }

    pub fn run(&self, seed: u64) -> Result<SimulationReport, CausalityError> {
        let mut event_loop = self.event_loop(seed);
        event_loop.run(self.horizon)?;
        let report = SimulationReport::from_stats(seed, event_loop.current_t(), event_loop.stats());
        tracing::debug!(
            seed,
            horizon = self.horizon,
            events = event_loop.dispatched(),
            customers = report.waiting_times.len(),
            "simulation finished"
        );
        Ok(report)
    }
}

impl QueueConfig {
    pub fn simulate(&self) -> Result<SimulationReport, SimulationError> {
        let model = self.model()?;
        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        Ok(model.run(seed)?)
    }
}

/// Waiting times of every customer admitted by `horizon`.
///
/// `service_range` is the `(lower, upper)` bound of the uniform service
/// duration. Passing `rng_seed` makes the run reproducible.
pub fn simulate_queue(
    horizon: f64,
    mean_interarrival: f64,
    service_range: (f64, f64),
    rng_seed: Option<u64>,
) -> Result<Vec<f64>, SimulationError> {
    let config = QueueConfig {
        horizon,
        mean_interarrival,
        service_range,
        seed: rng_seed,
    };
    Ok(config.simulate()?.waiting_times)
}
