//! Forecast outputs for condition and demand.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::AssetType;

/// Predicted state of an asset in one calendar year.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub predicted_condition: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
    /// In [0, 1].
    pub failure_probability: f64,
    pub maintenance_recommended: bool,
}

/// Condition trajectory over a planning horizon.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConditionForecast {
    pub asset_id: String,
    pub asset_type: AssetType,
    /// Effective annual decay rate used for the trajectory.
    pub decay_rate: f64,
    /// One point per year, starting at the reference year.
    pub points: Vec<ForecastPoint>,
    /// First year the condition falls below the critical threshold.
    pub expected_failure_date: Option<NaiveDate>,
    pub years_to_failure: Option<f64>,
    /// Mean condition points lost per year over the horizon.
    pub average_deterioration_rate: f64,
}

impl ConditionForecast {
    pub fn point(&self, year: i32) -> Option<&ForecastPoint> {
        self.points.iter().find(|p| p.year == year)
    }

    pub fn final_condition(&self) -> Option<f64> {
        self.points.last().map(|p| p.predicted_condition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
            Urgency::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Recommended intervention window for one asset.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MaintenanceWindow {
    pub asset_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub urgency: Urgency,
    pub estimated_cost: f64,
    pub rationale: String,
}

/// Projected usage against capacity in one year.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DemandPoint {
    pub year: i32,
    pub demand: f64,
    pub capacity: f64,
    pub utilization: f64,
    /// Effective growth rate applied for this year (fraction, not percent).
    pub growth_rate: f64,
}

/// Usage projection over a planning horizon.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DemandForecast {
    pub asset_id: String,
    pub asset_type: AssetType,
    pub region: String,
    pub points: Vec<DemandPoint>,
    pub peak_demand_year: i32,
    pub requires_expansion: bool,
    pub expansion_year: Option<i32>,
    pub expansion_timeline: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum GapSeverity {
    None,
    Minor,
    Moderate,
    Severe,
    Critical,
}

/// Five-year capacity outlook.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CapacityGap {
    pub asset_id: String,
    pub horizon_years: u32,
    pub projected_demand: f64,
    pub capacity: f64,
    pub projected_utilization: f64,
    /// Demand in excess of capacity (0 when within capacity).
    pub gap: f64,
    pub severity: GapSeverity,
    pub recommended_action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum BottleneckKind {
    Capacity,
    Condition,
}

/// An asset crossing a utilization or condition threshold.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Bottleneck {
    pub asset_id: String,
    pub asset_name: String,
    pub kind: BottleneckKind,
    /// In [0, 1].
    pub severity: f64,
    /// Utilization for capacity bottlenecks, condition score otherwise.
    pub metric: f64,
    /// 1 resolves before 2.
    pub resolution_priority: u8,
    pub description: String,
}
