// End-to-end properties of full simulation runs.

use bank_queue::{
    ParameterError, QueueConfig, SimulationError, SimulationReport, simulate_queue,
};
use proptest::prelude::*;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn report(horizon: f64, mean_interarrival: f64, seed: u64) -> SimulationReport {
    QueueConfig::new(horizon)
        .with_mean_interarrival(mean_interarrival)
        .with_seed(seed)
        .simulate()
        .unwrap()
}

fn assert_queue_discipline(report: &SimulationReport) {
    assert_eq!(report.waiting_times.len(), report.admissions.len());
    for (wait, admission) in report.waiting_times.iter().zip(&report.admissions) {
        assert!(*wait >= 0.0, "negative wait {}", wait);
        assert_eq!(*wait, admission.waiting_time());
    }
    for (i, admission) in report.admissions.iter().enumerate() {
        assert_eq!(admission.customer_id, i, "admitted out of arrival order");
    }
    for pair in report.admissions.windows(2) {
        assert!(pair[1].arrival_t >= pair[0].arrival_t);
        assert!(
            pair[1].start_t >= pair[0].end_t(),
            "customer {} started before customer {} finished",
            pair[1].customer_id,
            pair[0].customer_id
        );
    }
    assert!(report.completed <= report.admissions.len());
    assert!(report.admissions.len() <= report.completed + 1);
    assert_eq!(report.arrivals, report.admissions.len() + report.queue_length);
}

#[test]
fn same_seed_same_waits() {
    let first = simulate_queue(300.0, 3.0, (1.0, 4.0), Some(2024)).unwrap();
    let second = simulate_queue(300.0, 3.0, (1.0, 4.0), Some(2024)).unwrap();
    assert_eq!(first, second);

    let other = simulate_queue(300.0, 3.0, (1.0, 4.0), Some(2025)).unwrap();
    assert_ne!(first, other);
}

#[test]
fn zero_horizon_returns_no_waits() {
    for seed in 0..50 {
        let waits = simulate_queue(0.0, 3.0, (1.0, 4.0), Some(seed)).unwrap();
        assert!(waits.is_empty());
    }
}

#[test]
fn bank_desk_scenario() {
    let waits = simulate_queue(300.0, 3.0, (1.0, 4.0), Some(42)).unwrap();

    assert!(!waits.is_empty());
    assert!(waits.iter().all(|w| *w >= 0.0));
    // about 100 customers are expected in 300 minutes
    assert!(waits.len() > 50 && waits.len() < 160, "{} customers", waits.len());
    let avg = mean(&waits);
    assert!((0.0..40.0).contains(&avg), "average wait {}", avg);

    let again = simulate_queue(300.0, 3.0, (1.0, 4.0), Some(42)).unwrap();
    assert_eq!(mean(&again), avg);
}

#[test]
fn bank_desk_scenario_queue_discipline() {
    for seed in 0..20 {
        assert_queue_discipline(&report(300.0, 3.0, seed));
    }
}

#[test]
fn short_sessions_average_a_few_minutes() {
    let averages: Vec<f64> = (0..50)
        .map(|seed| mean(&report(300.0, 3.0, seed).waiting_times))
        .collect();
    let overall = mean(&averages);
    assert!((1.5..12.0).contains(&overall), "average over seeds {}", overall);
}

#[test]
fn long_run_approaches_pollaczek_khinchine() {
    // lambda = 1/3, E[S] = 2.5, E[S^2] = 7, so Wq = lambda E[S^2] / (2 (1 - rho)) = 7
    let waits = report(200_000.0, 3.0, 7).waiting_times;
    let avg = mean(&waits);
    assert!((4.5..10.0).contains(&avg), "long-run average wait {}", avg);
}

#[test]
fn faster_arrivals_mean_longer_waits() {
    let average_wait = |mean_interarrival: f64| {
        let per_seed: Vec<f64> = (0..20)
            .map(|seed| mean(&report(300.0, mean_interarrival, seed).waiting_times))
            .collect();
        mean(&per_seed)
    };

    let busy = average_wait(2.0);
    let normal = average_wait(3.0);
    let quiet = average_wait(4.0);

    assert!(busy >= normal, "2.0 -> {}, 3.0 -> {}", busy, normal);
    assert!(normal >= quiet, "3.0 -> {}, 4.0 -> {}", normal, quiet);
}

#[test]
fn invalid_parameters_are_rejected() {
    let cases = [
        (-1.0, 3.0, (1.0, 4.0)),
        (100.0, 0.0, (1.0, 4.0)),
        (100.0, 1e-320, (1.0, 4.0)),
        (100.0, 3.0, (4.0, 1.0)),
        (100.0, 3.0, (2.0, 2.0)),
    ];
    for (horizon, mean_interarrival, range) in cases {
        let err = simulate_queue(horizon, mean_interarrival, range, Some(1)).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter(_)), "{:?}", err);
    }

    let err = simulate_queue(-5.0, 3.0, (1.0, 4.0), None).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::InvalidParameter(ParameterError::Horizon(h)) if h == -5.0
    ));
}

proptest! {
    #[test]
    fn any_valid_run_keeps_fifo_and_one_customer_in_service(
        seed in any::<u64>(),
        horizon in 0.0f64..400.0,
        mean_interarrival in 0.5f64..10.0,
        lower in 0.0f64..5.0,
        width in 0.1f64..5.0,
    ) {
        let config = QueueConfig::new(horizon)
            .with_mean_interarrival(mean_interarrival)
            .with_service_range(lower, lower + width)
            .with_seed(seed);
        let first = config.simulate().unwrap();
        let second = config.simulate().unwrap();

        prop_assert!(first.end_t <= horizon);
        assert_queue_discipline(&first);
        prop_assert_eq!(first, second);
    }
}
