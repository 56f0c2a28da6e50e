use std::collections::VecDeque;

use rand::SeedableRng;
use rand::distr::Uniform;
use rand::rngs::StdRng;
use rand_distr::Distribution;

use crate::collector::WaitingTimeLog;
use crate::{Event, Stats};

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub customer_id: usize,
    pub arrival_t: f64,
    pub service_start_t: Option<f64>,
    pub service_duration: Option<f64>,
}

impl Customer {
    pub fn new(customer_id: usize, arrival_t: f64) -> Customer {
        Customer {
            customer_id,
            arrival_t,
            service_start_t: None,
            service_duration: None,
        }
    }
}

/// One customer's admission to service.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub customer_id: usize,
    pub arrival_t: f64,
    pub start_t: f64,
    pub service_duration: f64,
}

impl Admission {
    pub fn waiting_time(&self) -> f64 {
        self.start_t - self.arrival_t
    }

    pub fn end_t(&self) -> f64 {
        self.start_t + self.service_duration
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DeskState {
    Idle,
    Busy(Customer),
}

/// Single-server desk with an unbounded first-come-first-served queue.
///
/// Arriving customers are admitted straight away when the desk is idle and
/// queue otherwise. Each admission records the customer's waiting time and
/// draws a fresh uniform service duration.
pub struct ServiceDesk {
    state: DeskState,
    queue: VecDeque<Customer>,
    service_duration: Uniform<f64>,
    rng: StdRng,
    waits: WaitingTimeLog,
    admissions: Vec<Admission>,
    arrivals: usize,
    completed: usize,
    total_service_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeskStats {
    pub waiting_times: Vec<f64>,
    pub admissions: Vec<Admission>,
    pub arrivals: usize,
    pub completed: usize,
    pub queue_length: usize,
    pub busy: bool,
    /// Service time of customers whose service has finished.
    pub total_service_time: f64,
}

impl DeskStats {
    pub fn admitted(&self) -> usize {
        self.admissions.len()
    }

    pub fn has_queue(&self) -> bool {
        self.queue_length > 0
    }

    pub fn avg_wait_time(&self) -> Option<f64> {
        if self.waiting_times.is_empty() {
            None
        } else {
            Some(self.waiting_times.iter().sum::<f64>() / self.waiting_times.len() as f64)
        }
    }
}

impl ServiceDesk {
    pub fn new(service_duration: Uniform<f64>, seed: u64) -> ServiceDesk {
        ServiceDesk {
            state: DeskState::Idle,
            queue: VecDeque::new(),
            service_duration,
            rng: StdRng::seed_from_u64(seed),
            waits: WaitingTimeLog::new(),
            admissions: Vec::new(),
            arrivals: 0,
            completed: 0,
            total_service_time: 0.0,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, DeskState::Busy(_))
    }

    pub fn queue_length(&self) -> usize {
        self.queue.len()
    }

    pub fn waiting_times(&self) -> &WaitingTimeLog {
        &self.waits
    }

    pub fn request(&mut self, current_t: f64, customer: Customer) -> des::Response<Event, Stats> {
        self.arrivals += 1;
        if self.is_busy() {
            tracing::trace!(
                t = current_t,
                customer_id = customer.customer_id,
                ahead = self.queue.len(),
                "desk busy, customer queued"
            );
            self.queue.push_back(customer);
            return des::Response::new();
        }
        self.admit(current_t, customer)
    }

    pub fn on_completion(&mut self, current_t: f64, customer_id: usize) -> des::Response<Event, Stats> {
        match std::mem::replace(&mut self.state, DeskState::Idle) {
            DeskState::Busy(customer) if customer.customer_id == customer_id => {
                self.completed += 1;
                self.total_service_time += customer.service_duration.unwrap_or_default();
                tracing::trace!(t = current_t, customer_id, "service completed");
            }
            other => {
                tracing::warn!(
                    t = current_t,
                    customer_id,
                    state = ?other,
                    "completion for a customer not in service"
                );
                self.state = other;
                return des::Response::new();
            }
        }

        match self.queue.pop_front() {
            Some(next) => self.admit(current_t, next),
            None => des::Response::new(),
        }
    }

    fn admit(&mut self, current_t: f64, mut customer: Customer) -> des::Response<Event, Stats> {
        let waiting_time = current_t - customer.arrival_t;
        self.waits.record(waiting_time);

        let duration = self.service_duration.sample(&mut self.rng);
        customer.service_start_t = Some(current_t);
        customer.service_duration = Some(duration);
        self.admissions.push(Admission {
            customer_id: customer.customer_id,
            arrival_t: customer.arrival_t,
            start_t: current_t,
            service_duration: duration,
        });
        tracing::trace!(
            t = current_t,
            customer_id = customer.customer_id,
            waiting_time,
            duration,
            "customer admitted"
        );

        let completion = des::Response::event(
            current_t + duration,
            Event::ServiceCompleted {
                customer_id: customer.customer_id,
            },
        );
        self.state = DeskState::Busy(customer);
        completion
    }
}

impl des::Agent<Event, Stats> for ServiceDesk {
    fn act(&mut self, current_t: f64, data: &Event) -> des::Response<Event, Stats> {
        match data {
            Event::CustomerArrived { customer_id } => {
                self.request(current_t, Customer::new(*customer_id, current_t))
            }
            Event::ServiceCompleted { customer_id } => self.on_completion(current_t, *customer_id),
            Event::Start => des::Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::DeskStats(DeskStats {
            waiting_times: self.waits.results().to_vec(),
            admissions: self.admissions.clone(),
            arrivals: self.arrivals,
            completed: self.completed,
            queue_length: self.queue.len(),
            busy: self.is_busy(),
            total_service_time: self.total_service_time,
        })
    }
}
