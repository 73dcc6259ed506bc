//! Usage growth, capacity gaps and regional bottlenecks.

use std::collections::HashMap;

use infraplan_config::ForecastConfig;
use infraplan_core::result::{
    Bottleneck, BottleneckKind, CapacityGap, DemandForecast, DemandPoint, GapSeverity,
};
use infraplan_core::{Asset, AssetType, Result, ValidationError};
use tracing::debug;

/// Annual reduction applied to the growth rate as the horizon extends.
const GROWTH_TAPER_PER_YEAR: f64 = 0.02;

/// Horizon of the capacity gap outlook.
const CAPACITY_GAP_YEARS: u32 = 5;

/// Utilization above which an asset is a capacity bottleneck.
const BOTTLENECK_UTILIZATION: f64 = 0.85;

/// Condition below which an asset is a condition bottleneck.
const BOTTLENECK_CONDITION: f64 = 50.0;

/// Supplier of regional population growth rates.
///
/// Backed in production by a statistics-agency connector; the model only
/// needs the rate.
pub trait DemographicSource: Send + Sync {
    /// Annual population growth for `region` in percent, if known.
    fn growth_rate(&self, region: &str) -> Option<f64>;
}

/// Growth rates held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticGrowthRates {
    rates: HashMap<String, f64>,
}

impl StaticGrowthRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, region: impl Into<String>, pct_per_year: f64) -> Self {
        self.rates.insert(region.into(), pct_per_year);
        self
    }
}

impl DemographicSource for StaticGrowthRates {
    fn growth_rate(&self, region: &str) -> Option<f64> {
        self.rates.get(region).copied()
    }
}

impl<F> DemographicSource for F
where
    F: Fn(&str) -> Option<f64> + Send + Sync,
{
    fn growth_rate(&self, region: &str) -> Option<f64> {
        self(region)
    }
}

/// How strongly usage of each asset type tracks population growth.
pub fn demand_elasticity(asset_type: AssetType) -> f64 {
    match asset_type {
        AssetType::HighwaySegment => 1.3,
        AssetType::Bridge => 1.2,
        AssetType::Hospital => 1.1,
        AssetType::Other => 1.0,
        AssetType::WaterMain => 0.9,
        AssetType::PublicBuilding => 0.8,
    }
}

fn classify_gap(utilization: f64) -> (GapSeverity, &'static str) {
    if utilization <= 0.70 {
        (GapSeverity::None, "No action required; capacity is sufficient")
    } else if utilization <= 0.85 {
        (GapSeverity::Minor, "Monitor utilization in annual reviews")
    } else if utilization <= 0.95 {
        (GapSeverity::Moderate, "Commission a capacity study within two years")
    } else if utilization <= 1.10 {
        (GapSeverity::Severe, "Begin expansion design and demand management now")
    } else {
        (
            GapSeverity::Critical,
            "Immediate capacity expansion or demand restriction required",
        )
    }
}

/// Demand model with an injected demographic source.
#[derive(Debug, Clone)]
pub struct DemandModel<G = StaticGrowthRates> {
    config: ForecastConfig,
    demographics: G,
}

impl Default for DemandModel<StaticGrowthRates> {
    fn default() -> Self {
        Self::new(ForecastConfig::default(), StaticGrowthRates::default())
    }
}

impl<G: DemographicSource> DemandModel<G> {
    pub fn new(config: ForecastConfig, demographics: G) -> Self {
        Self { config, demographics }
    }

    /// Regional growth in percent, falling back to the configured default.
    pub fn base_growth_rate(&self, region: &str) -> f64 {
        self.demographics
            .growth_rate(region)
            .filter(|r| r.is_finite())
            .unwrap_or(self.config.default_growth_rate)
    }

    /// Effective growth fraction applied in year `t`.
    pub fn growth_rate_at(&self, asset_type: AssetType, region: &str, t: u32) -> f64 {
        let taper = (1.0 - GROWTH_TAPER_PER_YEAR * t as f64).max(0.0);
        self.base_growth_rate(region) / 100.0 * demand_elasticity(asset_type) * taper
    }

    /// Projects usage for years 0..=`horizon_years`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for negative usage or non-positive capacity.
    pub fn forecast_demand(
        &self,
        asset_id: &str,
        asset_type: AssetType,
        region: &str,
        current_usage: f64,
        current_capacity: f64,
        horizon_years: u32,
    ) -> Result<DemandForecast> {
        if !current_usage.is_finite() || current_usage < 0.0 {
            return Err(ValidationError::new(
                asset_id,
                "current_usage",
                format!("must be non-negative, got {current_usage}"),
            )
            .into());
        }
        if !current_capacity.is_finite() || current_capacity <= 0.0 {
            return Err(ValidationError::new(
                asset_id,
                "current_capacity",
                format!("must be positive, got {current_capacity}"),
            )
            .into());
        }

        let base_year = chrono::Datelike::year(&self.config.reference_date);
        let mut points = Vec::with_capacity(horizon_years as usize + 1);
        for t in 0..=horizon_years {
            let growth_rate = self.growth_rate_at(asset_type, region, t);
            let demand = current_usage * (1.0 + growth_rate).powi(t as i32);
            points.push(DemandPoint {
                year: base_year + t as i32,
                demand,
                capacity: current_capacity,
                utilization: demand / current_capacity,
                growth_rate,
            });
        }

        let peak_demand_year = points
            .iter()
            .fold(None::<&DemandPoint>, |best, p| match best {
                Some(b) if b.demand >= p.demand => Some(b),
                _ => Some(p),
            })
            .map_or(base_year, |p| p.year);

        let trigger = points
            .iter()
            .position(|p| p.utilization > self.config.expansion_utilization);
        let (expansion_year, expansion_timeline) = match trigger {
            Some(years_until) => {
                let point = &points[years_until];
                let tier = if years_until <= 2 {
                    "Critical"
                } else if years_until <= 5 {
                    "Planning"
                } else {
                    "Monitor"
                };
                (
                    Some(point.year),
                    format!(
                        "{tier}: utilization reaches {:.0}% in {} ({years_until} years out)",
                        point.utilization * 100.0,
                        point.year
                    ),
                )
            }
            None => (
                None,
                format!("No expansion required within the {horizon_years}-year horizon"),
            ),
        };

        debug!(
            event = "demand_forecast",
            asset_id,
            region,
            horizon_years,
            requires_expansion = trigger.is_some(),
        );

        Ok(DemandForecast {
            asset_id: asset_id.to_string(),
            asset_type,
            region: region.to_string(),
            points,
            peak_demand_year,
            requires_expansion: trigger.is_some(),
            expansion_year,
            expansion_timeline,
        })
    }

    /// Five-year capacity outlook with a severity class and action.
    pub fn get_capacity_gap(
        &self,
        asset_id: &str,
        asset_type: AssetType,
        region: &str,
        current_usage: f64,
        current_capacity: f64,
    ) -> Result<CapacityGap> {
        let forecast = self.forecast_demand(
            asset_id,
            asset_type,
            region,
            current_usage,
            current_capacity,
            CAPACITY_GAP_YEARS,
        )?;
        let projected = forecast
            .points
            .last()
            .map_or(current_usage, |p| p.demand);
        let utilization = projected / current_capacity;
        let (severity, action) = classify_gap(utilization);

        Ok(CapacityGap {
            asset_id: asset_id.to_string(),
            horizon_years: CAPACITY_GAP_YEARS,
            projected_demand: projected,
            capacity: current_capacity,
            projected_utilization: utilization,
            gap: (projected - current_capacity).max(0.0),
            severity,
            recommended_action: action.to_string(),
        })
    }

    /// Flags capacity and condition bottlenecks among `assets` in `region`.
    ///
    /// Sorted by severity (highest first), then resolution priority, then id.
    /// Assets without a design capacity are only checked for condition.
    pub fn identify_bottlenecks(&self, region: &str, assets: &[Asset]) -> Vec<Bottleneck> {
        let mut found = Vec::new();

        for asset in assets.iter().filter(|a| a.region == region) {
            if let Some(capacity) = asset.design_capacity.filter(|c| *c > 0.0) {
                let utilization = asset.daily_usage / capacity;
                if utilization > BOTTLENECK_UTILIZATION {
                    let span = 1.0 - BOTTLENECK_UTILIZATION;
                    let severity = ((utilization - BOTTLENECK_UTILIZATION) / span).clamp(0.0, 1.0);
                    found.push(Bottleneck {
                        asset_id: asset.id.clone(),
                        asset_name: asset.name.clone(),
                        kind: BottleneckKind::Capacity,
                        severity,
                        metric: utilization,
                        resolution_priority: 2,
                        description: format!(
                            "{} operating at {:.0}% of design capacity",
                            asset.name,
                            utilization * 100.0
                        ),
                    });
                }
            }

            if asset.condition_score < BOTTLENECK_CONDITION {
                let shortfall = BOTTLENECK_CONDITION - asset.condition_score;
                let severity = (shortfall / BOTTLENECK_CONDITION).clamp(0.0, 1.0);
                found.push(Bottleneck {
                    asset_id: asset.id.clone(),
                    asset_name: asset.name.clone(),
                    kind: BottleneckKind::Condition,
                    severity,
                    metric: asset.condition_score,
                    resolution_priority: 1,
                    description: format!(
                        "{} condition {:.0} below serviceable level",
                        asset.name, asset.condition_score
                    ),
                });
            }
        }

        found.sort_by(|a, b| {
            b.severity
                .total_cmp(&a.severity)
                .then(a.resolution_priority.cmp(&b.resolution_priority))
                .then_with(|| a.asset_id.cmp(&b.asset_id))
        });

        debug!(event = "bottlenecks", region, count = found.len());
        found
    }
}
