//! Run parameters for the desk simulation.
//!
//! Defaults reproduce the dashboard's bank desk: a 300 minute session, one
//! customer every 3 minutes on average, and service taking between 1 and 4
//! minutes. Parameters can be overridden in code or loaded from TOML:
//!
//! ```toml
//! horizon = 480.0
//! mean_interarrival = 2.5
//! service_range = [1.0, 4.0]
//! seed = 42
//! ```
//!
//! Keys that are left out keep their default value.

use std::path::{Path, PathBuf};

use rand::distr::Uniform;
use rand_distr::Exp;
use serde::Deserialize;

use crate::QueueModel;

pub const DEFAULT_HORIZON: f64 = 300.0;
pub const DEFAULT_MEAN_INTERARRIVAL: f64 = 3.0;
pub const DEFAULT_SERVICE_RANGE: (f64, f64) = (1.0, 4.0);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("horizon must be a finite, non-negative time, got {0}")]
    Horizon(f64),

    #[error("mean interarrival time must be finite and positive, got {0}")]
    MeanInterarrival(f64),

    #[error("service duration bounds must satisfy 0 <= lower < upper, got ({lower}, {upper})")]
    ServiceRange { lower: f64, upper: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ParameterError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    pub horizon: f64,
    pub mean_interarrival: f64,
    pub service_range: (f64, f64),
    /// `None` draws a fresh seed per run; the seed used is reported back.
    pub seed: Option<u64>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            horizon: DEFAULT_HORIZON,
            mean_interarrival: DEFAULT_MEAN_INTERARRIVAL,
            service_range: DEFAULT_SERVICE_RANGE,
            seed: None,
        }
    }
}

impl QueueConfig {
    pub fn new(horizon: f64) -> QueueConfig {
        QueueConfig {
            horizon,
            ..QueueConfig::default()
        }
    }

    pub fn with_mean_interarrival(mut self, mean_interarrival: f64) -> Self {
        self.mean_interarrival = mean_interarrival;
        self
    }

    pub fn with_service_range(mut self, lower: f64, upper: f64) -> Self {
        self.service_range = (lower, upper);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_toml_str(source: &str) -> Result<QueueConfig, ConfigError> {
        let config: QueueConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<QueueConfig, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        QueueConfig::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        self.model().map(|_| ())
    }

    /// Validate the parameters and build the sampling distributions.
    pub fn model(&self) -> Result<QueueModel, ParameterError> {
        if !(self.horizon.is_finite() && self.horizon >= 0.0) {
            return Err(ParameterError::Horizon(self.horizon));
        }

        let mean = self.mean_interarrival;
        let rate = 1.0 / mean;
        // subnormal means overflow the rate, and every gap would then be 0
        if !(mean.is_finite() && mean > 0.0 && rate.is_finite()) {
            return Err(ParameterError::MeanInterarrival(mean));
        }
        let interarrival = Exp::new(rate).map_err(|_| ParameterError::MeanInterarrival(mean))?;

        let (lower, upper) = self.service_range;
        let range_error = ParameterError::ServiceRange { lower, upper };
        if !(lower.is_finite() && upper.is_finite() && 0.0 <= lower && lower < upper) {
            return Err(range_error);
        }
        let service = Uniform::new(lower, upper).map_err(|_| range_error)?;

        Ok(QueueModel::new(self.horizon, interarrival, service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_bank_desk() {
        let config = QueueConfig::default();
        assert_eq!(config.horizon, 300.0);
        assert_eq!(config.mean_interarrival, 3.0);
        assert_eq!(config.service_range, (1.0, 4.0));
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = QueueConfig::new(60.0)
            .with_mean_interarrival(2.0)
            .with_service_range(0.5, 1.5)
            .with_seed(7);
        assert_eq!(
            config,
            QueueConfig {
                horizon: 60.0,
                mean_interarrival: 2.0,
                service_range: (0.5, 1.5),
                seed: Some(7),
            }
        );
    }

    #[test]
    fn zero_horizon_is_valid() {
        assert!(QueueConfig::new(0.0).validate().is_ok());
    }

    #[test]
    fn invalid_horizons() {
        for horizon in [-1.0, f64::NAN, f64::INFINITY] {
            match QueueConfig::new(horizon).validate() {
                Err(ParameterError::Horizon(_)) => {}
                other => panic!("expected horizon error for {horizon}, got {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_mean_interarrival() {
        for mean in [0.0, -3.0, f64::NAN, f64::INFINITY, 1e-320] {
            let result = QueueConfig::default().with_mean_interarrival(mean).validate();
            assert!(matches!(result, Err(ParameterError::MeanInterarrival(_))));
        }
    }

    #[test]
    fn invalid_service_ranges() {
        for (lower, upper) in [(4.0, 1.0), (2.0, 2.0), (-1.0, 3.0), (1.0, f64::INFINITY)] {
            let result = QueueConfig::default()
                .with_service_range(lower, upper)
                .validate();
            assert!(
                matches!(result, Err(ParameterError::ServiceRange { .. })),
                "({lower}, {upper}) should be rejected"
            );
        }
    }

    #[test]
    fn toml_with_partial_keys() {
        let config = QueueConfig::from_toml_str("horizon = 120.0\nseed = 9\n").unwrap();
        assert_eq!(config.horizon, 120.0);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.mean_interarrival, DEFAULT_MEAN_INTERARRIVAL);
        assert_eq!(config.service_range, DEFAULT_SERVICE_RANGE);
    }

    #[test]
    fn toml_service_range_array() {
        let config = QueueConfig::from_toml_str("service_range = [0.5, 2.0]").unwrap();
        assert_eq!(config.service_range, (0.5, 2.0));
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let result = QueueConfig::from_toml_str("arrival_rate = 0.3");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn toml_is_validated() {
        let result = QueueConfig::from_toml_str("mean_interarrival = 0.0");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid(ParameterError::MeanInterarrival(_)))
        ));
    }

    #[test]
    fn tiny_positive_mean_is_still_accepted() {
        let config = QueueConfig::new(10.0).with_mean_interarrival(f64::MIN_POSITIVE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.toml");
        std::fs::write(&path, "horizon = 480.0\nmean_interarrival = 2.5\nseed = 42\n").unwrap();

        let config = QueueConfig::from_file(&path).unwrap();

        assert_eq!(
            config,
            QueueConfig::new(480.0).with_mean_interarrival(2.5).with_seed(42)
        );
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.toml");
        std::fs::write(&path, "service_range = [3.0, 1.0]\n").unwrap();

        let result = QueueConfig::from_file(&path);

        assert!(matches!(
            result,
            Err(ConfigError::Invalid(ParameterError::ServiceRange { .. }))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = QueueConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
