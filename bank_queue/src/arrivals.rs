use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};

use crate::{Event, Stats};

/// Generates customers with exponentially distributed gaps.
///
/// The first arrival is drawn when the `Start` event is dispatched; every
/// later one is drawn when the previous customer arrives. The process never
/// stops by itself, only the horizon ends it.
pub struct ArrivalProcess {
    next_customer_id: usize,
    interarrival: Exp<f64>,
    rng: StdRng,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalStats {
    /// Arrival events handed to the scheduler, including one that may still
    /// be pending past the horizon.
    pub customers_scheduled: usize,
}

impl ArrivalProcess {
    pub fn new(interarrival: Exp<f64>, seed: u64) -> ArrivalProcess {
        ArrivalProcess {
            next_customer_id: 0,
            interarrival,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn schedule_next(&mut self, current_t: f64) -> des::Response<Event, Stats> {
        let customer_id = self.next_customer_id;
        self.next_customer_id += 1;
        let gap = self.interarrival.sample(&mut self.rng);
        tracing::trace!(customer_id, at = current_t + gap, "arrival scheduled");
        des::Response::event(current_t + gap, Event::CustomerArrived { customer_id })
    }
}

impl des::Agent<Event, Stats> for ArrivalProcess {
    fn act(&mut self, current_t: f64, data: &Event) -> des::Response<Event, Stats> {
        match data {
            Event::Start | Event::CustomerArrived { .. } => self.schedule_next(current_t),
            _ => des::Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::ArrivalStats(ArrivalStats {
            customers_scheduled: self.next_customer_id,
        })
    }
}
