//! A small discrete-event simulation engine.
//!
//! An [`EventLoop`] owns a virtual clock, a priority queue of pending events
//! and a set of [`Agent`]s. Each dispatched event is broadcast to every agent;
//! agents answer with a [`Response`] holding new events (and possibly new
//! agents). Events are ordered by timestamp, with ties dispatched in the
//! order they were scheduled, so a run driven by seeded RNGs is reproducible.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub mod parallel;

/// An agent tried to schedule an event earlier than the current clock.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("event scheduled at t={scheduled} but the clock is already at t={now}")]
pub struct CausalityError {
    pub scheduled: f64,
    pub now: f64,
}

struct Event<T> {
    t: f64,
    seq: u64,
    data: T,
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Event<T> {}

impl<T> Ord for Event<T> {
    // BinaryHeap is a max-heap: reverse so the earliest (then oldest) event wins
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct Response<T, S> {
    pub events: Vec<(f64, T)>,
    pub agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> Response<T, S> {
    pub fn new() -> Response<T, S> {
        Response {
            events: Vec::new(),
            agents: Vec::new(),
        }
    }

    pub fn event(t: f64, data: T) -> Response<T, S> {
        Response {
            events: vec![(t, data)],
            agents: Vec::new(),
        }
    }

    pub fn events(events: Vec<(f64, T)>) -> Response<T, S> {
        Response {
            events,
            agents: Vec::new(),
        }
    }
}

impl<T, S> Default for Response<T, S> {
    fn default() -> Self {
        Response::new()
    }
}

pub trait Agent<T, S> {
    fn act(&mut self, _current_t: f64, _data: &T) -> Response<T, S> {
        Response::new()
    }

    fn stats(&self) -> S;
}

pub struct EventLoop<T, S> {
    queue: BinaryHeap<Event<T>>,
    current_t: f64,
    next_seq: u64,
    dispatched: usize,
    agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> EventLoop<T, S> {
    /// Build a loop with the clock at zero. Initial events keep their given
    /// order for tie-breaking.
    pub fn new(events: Vec<(f64, T)>, agents: Vec<Box<dyn Agent<T, S>>>) -> EventLoop<T, S> {
        let mut event_loop = EventLoop {
            queue: BinaryHeap::with_capacity(events.len()),
            current_t: 0.0,
            next_seq: 0,
            dispatched: 0,
            agents,
        };
        for (t, data) in events {
            event_loop.push(t, data);
        }
        event_loop
    }

    pub fn current_t(&self) -> f64 {
        self.current_t
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    fn push(&mut self, t: f64, data: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Event { t, seq, data });
    }

    fn schedule(&mut self, t: f64, data: T) -> Result<(), CausalityError> {
        // written this way round so NaN is rejected too
        if !(t >= self.current_t) {
            return Err(CausalityError {
                scheduled: t,
                now: self.current_t,
            });
        }
        self.push(t, data);
        Ok(())
    }

    fn broadcast(&mut self) -> Result<(), CausalityError> {
        let Some(event) = self.queue.pop() else {
            return Ok(());
        };
        if !(event.t >= self.current_t) {
            return Err(CausalityError {
                scheduled: event.t,
                now: self.current_t,
            });
        }
        self.current_t = event.t;
        self.dispatched += 1;
        tracing::trace!(t = event.t, seq = event.seq, "dispatch");

        let mut new_events = Vec::new();
        let mut new_agents = Vec::new();
        for agent in &mut self.agents {
            let response = agent.act(self.current_t, &event.data);
            new_events.extend(response.events);
            new_agents.extend(response.agents);
        }
        for (t, data) in new_events {
            self.schedule(t, data)?;
        }
        self.agents.extend(new_agents);
        Ok(())
    }

    /// Dispatch events until the queue is empty or the next event lies
    /// beyond `until`. Events stamped exactly `until` are dispatched; a NaN
    /// `until` dispatches nothing.
    pub fn run(&mut self, until: f64) -> Result<(), CausalityError> {
        tracing::debug!(until, pending = self.queue.len(), "event loop started");
        while let Some(next) = self.queue.peek() {
            if !(next.t <= until) {
                break;
            }
            self.broadcast()?;
        }
        tracing::debug!(
            t = self.current_t,
            dispatched = self.dispatched,
            pending = self.queue.len(),
            "event loop stopped"
        );
        Ok(())
    }

    pub fn stats(&self) -> Vec<S> {
        self.agents.iter().map(|agent| agent.stats()).collect()
    }
}
