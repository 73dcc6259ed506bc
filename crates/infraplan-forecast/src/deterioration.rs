//! Condition deterioration and failure-probability model.
//!
//! Condition decays exponentially at a rate set by asset type, environment
//! and age. Failure probability blends a condition term with an age
//! regime and a type multiplier. The model is a pure function of its inputs.

use chrono::{Months, NaiveDate};
use infraplan_config::ForecastConfig;
use infraplan_core::result::{ConditionForecast, ForecastPoint, MaintenanceWindow, Urgency};
use infraplan_core::{Asset, AssetType};
use rayon::prelude::*;
use tracing::debug;

/// Horizon used when deriving a maintenance window.
const MAINTENANCE_HORIZON_YEARS: u32 = 10;

/// Multipliers describing the asset's operating environment.
///
/// Both default to 1.0 (nominal exposure).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentFactors {
    pub weather: f64,
    pub usage: f64,
}

impl Default for EnvironmentFactors {
    fn default() -> Self {
        Self {
            weather: 1.0,
            usage: 1.0,
        }
    }
}

impl EnvironmentFactors {
    pub fn new(weather: f64, usage: f64) -> Self {
        Self { weather, usage }
    }

    fn sanitized(self) -> Self {
        let clean = |v: f64| if v.is_finite() { v.max(0.0) } else { 1.0 };
        Self {
            weather: clean(self.weather),
            usage: clean(self.usage),
        }
    }
}

/// Annual decay rate of a new asset under nominal conditions.
pub fn base_decay_rate(asset_type: AssetType) -> f64 {
    match asset_type {
        AssetType::Bridge => 0.025,
        AssetType::HighwaySegment => 0.030,
        AssetType::WaterMain => 0.020,
        AssetType::PublicBuilding => 0.015,
        AssetType::Hospital => 0.012,
        AssetType::Other => 0.020,
    }
}

/// Failure multiplier by type: buried water mains are hardest to inspect,
/// hospitals see the most maintenance investment.
pub fn type_failure_multiplier(asset_type: AssetType) -> f64 {
    match asset_type {
        AssetType::WaterMain => 1.3,
        AssetType::Bridge => 1.1,
        AssetType::HighwaySegment => 1.0,
        AssetType::PublicBuilding => 0.9,
        AssetType::Hospital => 0.7,
        AssetType::Other => 1.0,
    }
}

/// Bathtub-curve multiplier: low in early life, a linear ramp through the
/// operating period, high once worn out.
pub fn age_failure_multiplier(age_years: f64) -> f64 {
    if age_years < 10.0 {
        0.5
    } else if age_years <= 50.0 {
        1.0 + (age_years - 10.0) / 40.0 * 0.5
    } else {
        2.0
    }
}

/// Deterioration model bound to an explicit forecast configuration.
#[derive(Debug, Clone, Default)]
pub struct DeteriorationModel {
    config: ForecastConfig,
}

impl DeteriorationModel {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// λ = λ₀ × weather × usage × (1 + age/100).
    pub fn effective_decay_rate(
        &self,
        asset_type: AssetType,
        age_years: f64,
        factors: EnvironmentFactors,
    ) -> f64 {
        let factors = factors.sanitized();
        let age_factor = 1.0 + age_years.max(0.0) / 100.0;
        base_decay_rate(asset_type) * factors.weather * factors.usage * age_factor
    }

    /// Annual failure probability at `condition` and `age_years`, in [0, 1].
    pub fn failure_probability(
        &self,
        asset_type: AssetType,
        condition: f64,
        age_years: f64,
    ) -> f64 {
        let condition_term = (-condition.clamp(0.0, 100.0) / 25.0).exp();
        let p = condition_term
            * age_failure_multiplier(age_years)
            * type_failure_multiplier(asset_type);
        p.clamp(0.0, 1.0)
    }

    /// Forecasts condition for years 0..=`horizon_years`.
    pub fn predict_condition(
        &self,
        asset_id: &str,
        asset_type: AssetType,
        current_condition: f64,
        age_years: f64,
        horizon_years: u32,
        factors: EnvironmentFactors,
    ) -> ConditionForecast {
        let c0 = if current_condition.is_finite() {
            current_condition.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let age = if age_years.is_finite() { age_years.max(0.0) } else { 0.0 };
        let lambda = self.effective_decay_rate(asset_type, age, factors);
        let reference = self.config.reference_date;
        let base_year = chrono::Datelike::year(&reference);

        let mut points = Vec::with_capacity(horizon_years as usize + 1);
        let mut expected_failure_date = None;

        for t in 0..=horizon_years {
            let tf = t as f64;
            let condition = (c0 * (-lambda * tf).exp()).clamp(0.0, 100.0);
            let band = 2.0 + 1.5 * tf;
            let failure_probability = self.failure_probability(asset_type, condition, age + tf);
            let maintenance_recommended = condition < self.config.maintenance_condition
                || failure_probability > self.config.maintenance_failure_probability;

            if expected_failure_date.is_none() && condition < self.config.critical_condition {
                expected_failure_date = Some(advance_years(reference, t));
            }

            points.push(ForecastPoint {
                year: base_year + t as i32,
                predicted_condition: condition,
                confidence_lower: (condition - band).clamp(0.0, 100.0),
                confidence_upper: (condition + band).clamp(0.0, 100.0),
                failure_probability,
                maintenance_recommended,
            });
        }

        let critical = self.config.critical_condition;
        let years_to_failure = if c0 < critical {
            Some(0.0)
        } else if lambda > 0.0 && critical > 0.0 {
            Some((c0 / critical).ln() / lambda)
        } else {
            None
        };

        let final_condition = points.last().map_or(c0, |p| p.predicted_condition);
        let average_deterioration_rate = if horizon_years == 0 {
            0.0
        } else {
            (c0 - final_condition) / horizon_years as f64
        };

        debug!(
            event = "condition_forecast",
            asset_id,
            decay_rate = lambda,
            horizon_years,
            final_condition,
        );

        ConditionForecast {
            asset_id: asset_id.to_string(),
            asset_type,
            decay_rate: lambda,
            points,
            expected_failure_date,
            years_to_failure,
            average_deterioration_rate,
        }
    }

    /// Forecasts a validated asset.
    pub fn predict_asset(
        &self,
        asset: &Asset,
        horizon_years: u32,
        factors: EnvironmentFactors,
    ) -> ConditionForecast {
        self.predict_condition(
            &asset.id,
            asset.asset_type,
            asset.condition_score,
            asset.age_years,
            horizon_years,
            factors,
        )
    }

    /// Forecasts many assets in parallel; output order matches input order.
    pub fn predict_portfolio(
        &self,
        assets: &[Asset],
        horizon_years: u32,
        factors: EnvironmentFactors,
    ) -> Vec<ConditionForecast> {
        assets
            .par_iter()
            .map(|asset| self.predict_asset(asset, horizon_years, factors))
            .collect()
    }

    /// Recommends when to intervene on `asset` and what it will cost.
    pub fn get_maintenance_window(
        &self,
        asset: &Asset,
        factors: EnvironmentFactors,
    ) -> MaintenanceWindow {
        let forecast = self.predict_asset(asset, MAINTENANCE_HORIZON_YEARS, factors);
        let condition = asset.condition_score;
        let reference = self.config.reference_date;

        let (urgency, start_months, end_months) = if condition < self.config.critical_condition {
            (Urgency::Critical, 0, 3)
        } else {
            match forecast.years_to_failure {
                Some(years) if years <= 2.0 => (Urgency::High, 3, 12),
                Some(years) if years <= 5.0 => (Urgency::Medium, 12, 24),
                _ => (Urgency::Low, 24, 60),
            }
        };

        let cost_share = if condition < 40.0 {
            0.40
        } else if condition < 60.0 {
            0.25
        } else if condition < 80.0 {
            0.10
        } else {
            0.05
        };

        let rationale = match (urgency, forecast.years_to_failure) {
            (Urgency::Critical, _) => format!(
                "Condition {condition:.0} is below the critical threshold of {:.0}",
                self.config.critical_condition
            ),
            (_, Some(years)) => format!(
                "Condition {condition:.0} expected to reach critical level in {years:.1} years"
            ),
            (_, None) => format!("Condition {condition:.0} is stable over the forecast horizon"),
        };

        MaintenanceWindow {
            asset_id: asset.id.clone(),
            start_date: add_months(reference, start_months),
            end_date: add_months(reference, end_months),
            urgency,
            estimated_cost: asset.replacement_cost * cost_share,
            rationale,
        }
    }
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

fn advance_years(date: NaiveDate, years: u32) -> NaiveDate {
    add_months(date, years.saturating_mul(12))
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraplan_test::assets::asset;

    fn model() -> DeteriorationModel {
        DeteriorationModel::default()
    }

    #[test]
    fn test_critical_bridge_scenario() {
        let forecast = model().predict_condition(
            "B-1",
            AssetType::Bridge,
            30.0,
            40.0,
            5,
            EnvironmentFactors::default(),
        );

        assert_eq!(forecast.points.len(), 6);
        assert!(forecast.points[0].maintenance_recommended);
        assert_eq!(
            forecast.expected_failure_date,
            Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        );
        assert_eq!(forecast.years_to_failure, Some(0.0));
    }

    #[test]
    fn test_exponential_decay() {
        let m = model();
        let nominal = EnvironmentFactors::default();
        let forecast = m.predict_condition("H", AssetType::Hospital, 90.0, 0.0, 3, nominal);
        let lambda = 0.012;
        assert!((forecast.decay_rate - lambda).abs() < 1e-12);
        let expected = 90.0 * (-lambda * 3.0).exp();
        assert!((forecast.points[3].predicted_condition - expected).abs() < 1e-9);
        assert!(forecast.average_deterioration_rate > 0.0);
    }

    #[test]
    fn test_age_and_environment_accelerate_decay() {
        let m = model();
        let nominal = m.effective_decay_rate(AssetType::Bridge, 0.0, EnvironmentFactors::default());
        let old = m.effective_decay_rate(AssetType::Bridge, 50.0, EnvironmentFactors::default());
        let harsh =
            m.effective_decay_rate(AssetType::Bridge, 0.0, EnvironmentFactors::new(1.5, 1.2));
        assert!((old - nominal * 1.5).abs() < 1e-12);
        assert!((harsh - nominal * 1.8).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_hold_for_extreme_inputs() {
        let m = model();
        for &(condition, age, weather) in &[
            (100.0, 0.0, 1.0),
            (0.0, 120.0, 5.0),
            (150.0, -3.0, f64::NAN),
            (55.0, 30.0, 50.0),
        ] {
            let forecast = m.predict_condition(
                "X",
                AssetType::WaterMain,
                condition,
                age,
                30,
                EnvironmentFactors::new(weather, 3.0),
            );
            for p in &forecast.points {
                assert!((0.0..=100.0).contains(&p.predicted_condition));
                assert!((0.0..=1.0).contains(&p.failure_probability));
                assert!(p.confidence_lower <= p.predicted_condition);
                assert!(p.confidence_upper >= p.predicted_condition);
            }
        }
    }

    #[test]
    fn test_uncertainty_band_widens() {
        let forecast = model().predict_condition(
            "P",
            AssetType::PublicBuilding,
            70.0,
            5.0,
            4,
            EnvironmentFactors::default(),
        );
        let width = |i: usize| {
            let p = &forecast.points[i];
            p.confidence_upper - p.confidence_lower
        };
        assert!((width(0) - 4.0).abs() < 1e-9);
        assert!((width(2) - 10.0).abs() < 1e-9);
        assert!(width(4) > width(2));
    }

    #[test]
    fn test_failure_probability_regimes() {
        let m = model();
        let young = m.failure_probability(AssetType::Other, 50.0, 5.0);
        let mid = m.failure_probability(AssetType::Other, 50.0, 30.0);
        let worn = m.failure_probability(AssetType::Other, 50.0, 70.0);
        assert!(young < mid && mid < worn);
        assert!(
            m.failure_probability(AssetType::WaterMain, 50.0, 30.0)
                > m.failure_probability(AssetType::Hospital, 50.0, 30.0)
        );
    }

    #[test]
    fn test_years_to_failure_matches_crossing() {
        let forecast = model().predict_condition(
            "W",
            AssetType::WaterMain,
            80.0,
            20.0,
            60,
            EnvironmentFactors::default(),
        );
        let years = forecast.years_to_failure.unwrap();
        let first_below = forecast
            .points
            .iter()
            .position(|p| p.predicted_condition < 40.0)
            .unwrap();
        assert_eq!(first_below, years.ceil() as usize);
        assert!(forecast.expected_failure_date.is_some());
    }

    #[test]
    fn test_maintenance_window_urgency() {
        let m = model();
        let nominal = EnvironmentFactors::default();
        let failing = asset("A", AssetType::Bridge, "ON", 35.0, 40.0, 1000.0);
        let critical = m.get_maintenance_window(&failing, nominal);
        assert_eq!(critical.urgency, Urgency::Critical);
        assert!((critical.estimated_cost - 400.0).abs() < 1e-9);
        assert!(critical.start_date < critical.end_date);

        let healthy = asset("B", AssetType::Hospital, "ON", 95.0, 2.0, 1000.0);
        let fine = m.get_maintenance_window(&healthy, nominal);
        assert_eq!(fine.urgency, Urgency::Low);
        assert!((fine.estimated_cost - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_portfolio_preserves_order() {
        let assets = vec![
            asset("first", AssetType::Bridge, "ON", 80.0, 10.0, 10.0),
            asset("second", AssetType::Hospital, "QC", 60.0, 30.0, 10.0),
            asset("third", AssetType::WaterMain, "BC", 45.0, 55.0, 10.0),
        ];
        let forecasts = model().predict_portfolio(&assets, 5, EnvironmentFactors::default());
        let ids: Vec<_> = forecasts.iter().map(|f| f.asset_id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[test]
    fn test_deterministic() {
        let m = model();
        let factors = EnvironmentFactors::new(1.2, 0.9);
        let a = m.predict_condition("D", AssetType::Bridge, 66.0, 22.0, 12, factors);
        let b = m.predict_condition("D", AssetType::Bridge, 66.0, 22.0, 12, factors);
        assert_eq!(a, b);
    }
}
