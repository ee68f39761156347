//! Configuration management for the recommender.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`CRUSOE__` prefix, `__` separator)
//! 2. Config file (`crusoe.toml`, or the prefix given on the command line)
//!
//! Every comparator section is required. A missing `critical_bound` or
//! weight is reported when the configuration is loaded, before any host is
//! scored.

use serde::Deserialize;

use crate::error::CrusoeError;

/// Allowed deviation of the CPE weight sum from 1.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// The `[recommender]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RecommenderConfig {
    /// Maximum BFS distance from the attacked host.
    #[serde(default = "default_max_distance")]
    pub max_distance: u32,
    pub os: CpeComparatorConfig,
    pub antivirus: CpeComparatorConfig,
    pub cms: CmsComparatorConfig,
    pub cve_cumulative: CumulativeComparatorConfig,
    pub event_cumulative: CumulativeComparatorConfig,
    pub net_service: NetServiceComparatorConfig,
    pub path: PathConfig,
}

/// Settings for a comparator over CPE strings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CpeComparatorConfig {
    pub apply: bool,
    pub critical_bound: f64,
    /// Similarity used when a real comparison is impossible.
    pub diff_value: f64,
    pub vendor: f64,
    pub product: f64,
    pub version: f64,
}

impl CpeComparatorConfig {
    /// Weights in CPE part order.
    pub fn weights(&self) -> [f64; 3] {
        [self.vendor, self.product, self.version]
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CmsComparatorConfig {
    #[serde(flatten)]
    pub cpe: CpeComparatorConfig,
    /// Compare CMS only when both hosts expose HTTP(S).
    #[serde(default)]
    pub require_open_ports: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CumulativeComparatorConfig {
    pub apply: bool,
    pub critical_bound: f64,
    /// Similarity used when either count or the total is zero.
    pub zero_value: f64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NetServiceComparatorConfig {
    pub apply: bool,
    pub critical_bound: f64,
    pub diff_value: f64,
}

/// Path-type discount applied to the combined similarity.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PathConfig {
    pub apply: bool,
    pub subnet: f64,
    #[serde(alias = "organization")]
    pub organization_unit: f64,
    pub contact: f64,
}

fn default_max_distance() -> u32 {
    3
}

impl RecommenderConfig {
    /// Check value ranges and weight sums, including sections with
    /// `apply = false`.
    pub fn validate(&self) -> Result<(), CrusoeError> {
        if self.max_distance == 0 {
            return Err(CrusoeError::Config("max_distance must be at least 1".into()));
        }

        validate_cpe("os", &self.os)?;
        validate_cpe("antivirus", &self.antivirus)?;
        validate_cpe("cms", &self.cms.cpe)?;

        for (name, section) in [
            ("cve_cumulative", &self.cve_cumulative),
            ("event_cumulative", &self.event_cumulative),
        ] {
            unit_interval(name, "critical_bound", section.critical_bound)?;
            unit_interval(name, "zero_value", section.zero_value)?;
        }

        unit_interval("net_service", "critical_bound", self.net_service.critical_bound)?;
        unit_interval("net_service", "diff_value", self.net_service.diff_value)?;

        unit_interval("path", "subnet", self.path.subnet)?;
        unit_interval("path", "organization_unit", self.path.organization_unit)?;
        unit_interval("path", "contact", self.path.contact)?;

        Ok(())
    }
}

fn validate_cpe(section: &str, config: &CpeComparatorConfig) -> Result<(), CrusoeError> {
    unit_interval(section, "critical_bound", config.critical_bound)?;
    unit_interval(section, "diff_value", config.diff_value)?;

    let weights = config.weights();
    if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
        return Err(CrusoeError::Config(format!(
            "{section}: CPE weights must be non-negative, got {weights:?}"
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(CrusoeError::Config(format!(
            "{section}: CPE weights must sum to 1, got {sum}"
        )));
    }
    Ok(())
}

fn unit_interval(section: &str, key: &str, value: f64) -> Result<(), CrusoeError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CrusoeError::Config(format!(
            "{section}.{key} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Build the layered configuration source for `file_prefix`.
pub fn load_layered(file_prefix: &str) -> Result<config::Config, CrusoeError> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("CRUSOE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(cfg)
}

/// Extract and validate the `[recommender]` section.
pub fn recommender_config_from(cfg: &config::Config) -> Result<RecommenderConfig, CrusoeError> {
    let recommender: RecommenderConfig = cfg.get("recommender")?;
    recommender.validate()?;
    tracing::debug!(max_distance = recommender.max_distance, "Recommender configuration loaded");
    Ok(recommender)
}

/// Load the recommender configuration from `<file_prefix>.toml` and the
/// environment.
pub fn load_recommender_config(file_prefix: &str) -> Result<RecommenderConfig, CrusoeError> {
    recommender_config_from(&load_layered(file_prefix)?)
}
