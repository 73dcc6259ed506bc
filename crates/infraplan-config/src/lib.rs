//! Configuration system for infraplan.
//!
//! Load planner configuration from TOML or YAML to tune solver limits,
//! scoring weights and model constants without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use infraplan_config::{PlannerConfig, StrategyKind};
//! use std::time::Duration;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     [solver]
//!     time_limit_ms = 750
//!     random_seed = 7
//!     strategies = ["branch_and_bound", "greedy"]
//!
//!     [capital]
//!     risk_weight = 0.7
//!     coverage_weight = 0.3
//! "#).unwrap();
//!
//! assert_eq!(config.solver.time_limit(), Duration::from_millis(750));
//! assert_eq!(config.solver.strategies[0], StrategyKind::BranchAndBound);
//! ```
//!
//! Use default config when the file is missing:
//!
//! ```
//! use infraplan_config::PlannerConfig;
//!
//! let config = PlannerConfig::load("infraplan.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default solve deadline for interactive callers.
pub const INTERACTIVE_TIME_LIMIT_MS: u64 = 200;

/// Default solve deadline for background and batch analysis.
pub const BATCH_TIME_LIMIT_MS: u64 = 5_000;

/// Seed used for disruption sampling when none is configured.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Main planner configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PlannerConfig {
    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub capital: CapitalConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub resources: ResourceConfig,

    #[serde(default)]
    pub forecast: ForecastConfig,
}

impl PlannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset tuned for request/response use.
    pub fn interactive() -> Self {
        Self::default().with_time_limit_ms(INTERACTIVE_TIME_LIMIT_MS)
    }

    /// Preset with a longer search budget for batch analysis.
    pub fn batch() -> Self {
        Self::default()
            .with_time_limit_ms(BATCH_TIME_LIMIT_MS)
            .with_node_limit(1_000_000)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or
    /// fails [`PlannerConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the solve deadline in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.solver.time_limit_ms = ms;
        self
    }

    /// Sets the branch-and-bound node limit.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.solver.node_limit = nodes;
        self
    }

    /// Sets the random seed used for disruption sampling.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.solver.random_seed = Some(seed);
        self
    }

    /// Replaces the strategy chain.
    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = StrategyKind>) -> Self {
        self.solver.strategies = strategies.into_iter().collect();
        self
    }

    /// Sets the capital plan scoring weights.
    pub fn with_weights(mut self, risk: f64, coverage: f64) -> Self {
        self.capital.risk_weight = risk;
        self.capital.coverage_weight = coverage;
        self
    }

    /// Sets the reference date forecasts start from.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.forecast.reference_date = date;
        self
    }

    /// Checks cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solver.strategies.is_empty() {
            return Err(ConfigError::Invalid(
                "solver.strategies must name at least one strategy".to_string(),
            ));
        }
        let weights = [self.capital.risk_weight, self.capital.coverage_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Invalid(
                "capital weights must be finite and non-negative".to_string(),
            ));
        }
        for (name, pct) in [
            ("capital.min_regional_pct", self.capital.min_regional_pct),
            ("resources.min_regional_pct", self.resources.min_regional_pct),
            ("capital.funded_risk_retention", self.capital.funded_risk_retention),
        ] {
            if !(0.0..=1.0).contains(&pct) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must lie within [0, 1], got {pct}"
                )));
            }
        }
        if self.network.default_route_capacity <= 0 {
            return Err(ConfigError::Invalid(
                "network.default_route_capacity must be positive".to_string(),
            ));
        }
        if self.resources.default_duration_days <= 0.0 {
            return Err(ConfigError::Invalid(
                "resources.default_duration_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Exact or heuristic strategy tried by the solvers, in configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// LP-relaxation branch and bound.
    BranchAndBound,
    /// Priority-ordered greedy allocation.
    Greedy,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::BranchAndBound => "branch_and_bound",
            StrategyKind::Greedy => "greedy",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order in which open branch-and-bound nodes are explored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationType {
    /// Deepest node first; finds incumbents early.
    DepthFirst,
    /// Node with the highest relaxation bound first.
    #[default]
    BestBound,
}

/// Search limits shared by all solvers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SolverConfig {
    /// Deadline for integer-programming search.
    pub time_limit_ms: u64,

    /// Maximum branch-and-bound nodes to explore.
    pub node_limit: u64,

    /// Models with more variables than this are declined by branch and bound.
    pub max_variables: usize,

    /// Seed for disruption sampling; [`DEFAULT_RANDOM_SEED`] when absent.
    pub random_seed: Option<u64>,

    pub exploration: ExplorationType,

    /// Strategies tried in order until one succeeds.
    pub strategies: Vec<StrategyKind>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: INTERACTIVE_TIME_LIMIT_MS,
            node_limit: 50_000,
            max_variables: 1_000,
            random_seed: None,
            exploration: ExplorationType::default(),
            strategies: vec![StrategyKind::BranchAndBound, StrategyKind::Greedy],
        }
    }
}

impl SolverConfig {
    /// Returns the solve deadline as a Duration.
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    pub fn seed(&self) -> u64 {
        self.random_seed.unwrap_or(DEFAULT_RANDOM_SEED)
    }
}

/// Capital plan scoring and metrics.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CapitalConfig {
    pub risk_weight: f64,
    pub coverage_weight: f64,
    /// Minimum share of the budget each region must receive under equity.
    pub min_regional_pct: f64,
    /// Share of baseline risk a funded asset keeps.
    pub funded_risk_retention: f64,
    /// Condition below which an asset is described as critical.
    pub critical_condition: f64,
}

impl Default for CapitalConfig {
    fn default() -> Self {
        Self {
            risk_weight: 0.6,
            coverage_weight: 0.4,
            min_regional_pct: 0.10,
            funded_risk_retention: 0.2,
            critical_condition: 40.0,
        }
    }
}

/// Network flow model constants.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct NetworkConfig {
    /// Capacity of a route that does not state its own.
    pub default_route_capacity: i64,
    /// Residual capacity left on a blocked route.
    pub blocked_capacity: i64,
    /// Per-unit cost on a blocked route.
    pub blocked_cost: i64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            default_route_capacity: 100,
            blocked_capacity: 1,
            blocked_cost: 1_000_000,
        }
    }
}

/// Multi-resource cost rates and equity.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ResourceConfig {
    /// Annual cost of one FTE when the pool states no rate.
    pub personnel_annual_rate: f64,
    /// Daily cost of one equipment unit when the pool states no rate.
    pub equipment_daily_rate: f64,
    /// Engagement length when the requirement states none.
    pub default_duration_days: f64,
    pub min_regional_pct: f64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            personnel_annual_rate: 85_000.0,
            equipment_daily_rate: 1_200.0,
            default_duration_days: 90.0,
            min_regional_pct: 0.10,
        }
    }
}

/// Forecasting model constants.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ForecastConfig {
    /// Date of the year-0 forecast point.
    pub reference_date: NaiveDate,
    /// Condition below which an asset is expected to fail.
    pub critical_condition: f64,
    /// Condition below which maintenance is recommended.
    pub maintenance_condition: f64,
    /// Failure probability above which maintenance is recommended.
    pub maintenance_failure_probability: f64,
    /// Utilization above which capacity expansion is required.
    pub expansion_utilization: f64,
    /// Regional growth rate (%/year) used when the demographic source has none.
    pub default_growth_rate: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            reference_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            critical_condition: 40.0,
            maintenance_condition: 60.0,
            maintenance_failure_probability: 0.3,
            expansion_utilization: 0.90,
            default_growth_rate: 1.2,
        }
    }
}
