//! Parallel execution of independent EventLoop scenarios
//!
//! Each scenario is built by a closure from its `scenario_id`, runs on a
//! rayon worker to the given horizon, and hands back its agents' stats.
//! Scenarios share nothing, so as long as the builder derives every RNG seed
//! from the scenario it is given, results are identical regardless of thread
//! count or execution order.
//!
//! A scenario that panics, or whose run stops with a [`CausalityError`], comes
//! back as `Err(String)`; the other scenarios are unaffected.
//!
//! ```rust
//! use des::parallel::ParallelRunner;
//! # use des::{Agent, EventLoop};
//! # struct TestAgent;
//! # impl Agent<u8, usize> for TestAgent {
//! #     fn stats(&self) -> usize { 1 }
//! # }
//!
//! let results = ParallelRunner::new(20, |_scenario_id| {
//!     let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(TestAgent)];
//!     EventLoop::new(vec![(0.0, 1)], agents)
//! })
//! .num_threads(4)
//! .run(100.0);
//!
//! assert_eq!(results.len(), 20);
//! assert!(results.iter().all(|r| r.is_ok()));
//! ```
//!
//! [`CausalityError`]: crate::CausalityError

use crate::EventLoop;
use rayon::prelude::*;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Executes multiple EventLoop scenarios in parallel
pub struct ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    num_scenarios: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    _scenario: PhantomData<fn() -> (T, S)>,
}

impl<T, S, F> ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    pub fn new(num_scenarios: usize, builder: F) -> Self {
        ParallelRunner {
            num_scenarios,
            builder,
            num_threads: None,
            progress_callback: None,
            _scenario: PhantomData,
        }
    }

    /// Set number of threads (defaults to rayon's global pool)
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Called with `(completed, total)` after each scenario finishes.
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Execute all scenarios up to `until` and return results in
    /// scenario_id order.
    pub fn run(self, until: f64) -> Vec<Result<Vec<S>, String>> {
        let progress_counter = AtomicUsize::new(0);

        let execute = || {
            (0..self.num_scenarios)
                .into_par_iter()
                .map(|scenario_id| {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        let mut event_loop = (self.builder)(scenario_id);
                        event_loop.run(until).map(|()| event_loop.stats())
                    }));

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, self.num_scenarios);
                    }

                    match result {
                        Ok(Ok(stats)) => Ok(stats),
                        Ok(Err(causality)) => {
                            tracing::warn!(scenario_id, %causality, "scenario aborted");
                            Err(causality.to_string())
                        }
                        Err(panic) => Err(panic_message(panic.as_ref())),
                    }
                })
                .collect()
        };

        // A pool that cannot be built falls back to the global one
        let pool = self.num_threads.and_then(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| tracing::warn!(threads = n, error = %e, "using global thread pool"))
                .ok()
        });

        match pool {
            Some(pool) => pool.install(execute),
            None => execute(),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run scenarios on the global pool.
pub fn run_parallel<T, S, F>(num_scenarios: usize, builder: F, until: f64) -> Vec<Result<Vec<S>, String>>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    ParallelRunner::new(num_scenarios, builder).run(until)
}

/// Progress callback that logs every `interval` completed scenarios.
pub fn progress_logger(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    let interval = interval.max(1);
    move |completed, total| {
        if completed % interval == 0 || completed == total {
            tracing::info!("completed {}/{} scenarios", completed, total);
        }
    }
}
