//! Supply-chain network model: nodes, routes and disruption events.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Largest accepted route travel time, in minutes.
///
/// Delay-adjusted times are rounded into integer arc costs, which must stay
/// well inside `i64`.
pub const MAX_TRAVEL_TIME: f64 = 1.0e9;

/// Role of a node in the supply network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum NodeType {
    Warehouse,
    Hospital,
    Distribution,
    #[default]
    Other,
}

impl NodeType {
    /// Default supply (positive) or demand (negative) attached to a node
    /// of this type when the caller does not override it.
    pub fn default_supply(&self) -> i64 {
        match self {
            NodeType::Warehouse => 50,
            NodeType::Hospital => -25,
            NodeType::Distribution | NodeType::Other => 0,
        }
    }
}

/// A node of the supply network.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SupplyNode {
    pub id: String,
    pub node_type: NodeType,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "operational_default")]
    pub operational: bool,
}

fn operational_default() -> bool {
    true
}

impl SupplyNode {
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            latitude: 0.0,
            longitude: 0.0,
            operational: true,
        }
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    pub fn offline(mut self) -> Self {
        self.operational = false;
        self
    }
}

/// A directed route between two nodes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SupplyRoute {
    pub source: String,
    pub target: String,
    /// Kilometres.
    pub distance: f64,
    /// Nominal travel time in minutes.
    pub travel_time: f64,
    /// Units of flow the route can carry; the solver default applies when absent.
    #[serde(default)]
    pub capacity: Option<i64>,
}

impl SupplyRoute {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        distance: f64,
        travel_time: f64,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            distance,
            travel_time,
            capacity: None,
        }
    }

    pub fn with_capacity(mut self, capacity: i64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let id = format!("{}->{}", self.source, self.target);
        if self.source.is_empty() || self.target.is_empty() {
            return Err(ValidationError::new(id, "source", "route endpoints must not be empty"));
        }
        if !(0.0..=MAX_TRAVEL_TIME).contains(&self.travel_time) {
            return Err(ValidationError::new(
                id,
                "travel_time",
                format!(
                    "must lie within [0, {MAX_TRAVEL_TIME:e}], got {}",
                    self.travel_time
                ),
            ));
        }
        if !self.distance.is_finite() || self.distance < 0.0 {
            return Err(ValidationError::new(
                id,
                "distance",
                format!("must be non-negative, got {}", self.distance),
            ));
        }
        if let Some(capacity) = self.capacity {
            if capacity < 0 {
                return Err(ValidationError::new(id, "capacity", "must be non-negative"));
            }
        }
        Ok(())
    }
}

/// Disruption scenario applied to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum DisruptionEvent {
    #[default]
    None,
    Snowstorm,
    Flood,
    Heatwave,
    Earthquake,
}

impl DisruptionEvent {
    /// Multiplier applied to nominal travel times.
    pub fn delay_multiplier(&self) -> f64 {
        match self {
            DisruptionEvent::None => 1.0,
            DisruptionEvent::Heatwave => 1.3,
            DisruptionEvent::Snowstorm => 2.0,
            DisruptionEvent::Flood => 3.5,
            DisruptionEvent::Earthquake => 10.0,
        }
    }

    /// Share of routes knocked out by the event.
    pub fn blocked_fraction(&self) -> f64 {
        match self {
            DisruptionEvent::Flood => 0.3,
            DisruptionEvent::Earthquake => 0.5,
            _ => 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        *self != DisruptionEvent::None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisruptionEvent::None => "None",
            DisruptionEvent::Snowstorm => "Snowstorm",
            DisruptionEvent::Flood => "Flood",
            DisruptionEvent::Heatwave => "Heatwave",
            DisruptionEvent::Earthquake => "Earthquake",
        }
    }
}

impl fmt::Display for DisruptionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisruptionEvent {
    type Err = std::convert::Infallible;

    /// Unrecognized event names map to [`DisruptionEvent::None`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "snowstorm" | "snow" => DisruptionEvent::Snowstorm,
            "flood" => DisruptionEvent::Flood,
            "heatwave" | "heat" => DisruptionEvent::Heatwave,
            "earthquake" => DisruptionEvent::Earthquake,
            _ => DisruptionEvent::None,
        })
    }
}

impl From<&str> for DisruptionEvent {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}
