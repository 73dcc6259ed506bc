//! Cost estimates for drawn resources.

use infraplan_config::ResourceConfig;
use infraplan_core::{ResourcePool, ResourceRequirement, ResourceType};

const DAYS_PER_YEAR: f64 = 365.0;

/// Engagement length of `requirement` in days.
pub fn duration_days(requirement: &ResourceRequirement, config: &ResourceConfig) -> f64 {
    requirement
        .duration_days
        .unwrap_or(config.default_duration_days)
}

/// Cost of drawing `quantity` from `pool` for `requirement`.
///
/// Money is taken at face value. Personnel costs FTE x annual rate x
/// days / 365, equipment costs units x daily rate x days. Pools without
/// their own rate use the configured defaults.
pub fn cost_estimate(
    requirement: &ResourceRequirement,
    pool: &ResourcePool,
    quantity: f64,
    config: &ResourceConfig,
) -> f64 {
    match pool.resource_type {
        ResourceType::Money => quantity,
        ResourceType::Personnel => {
            let rate = pool.unit_cost.unwrap_or(config.personnel_annual_rate);
            quantity * rate * duration_days(requirement, config) / DAYS_PER_YEAR
        }
        ResourceType::Equipment => {
            let rate = pool.unit_cost.unwrap_or(config.equipment_daily_rate);
            quantity * rate * duration_days(requirement, config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_at_face_value() {
        let config = ResourceConfig::default();
        let pool = ResourcePool::new("cash", ResourceType::Money, 1e6, "CAD");
        let req = ResourceRequirement::new("r", "a", ResourceType::Money, 500.0, 2);
        assert_eq!(cost_estimate(&req, &pool, 500.0, &config), 500.0);
    }

    #[test]
    fn test_personnel_uses_annual_rate() {
        let config = ResourceConfig::default();
        let pool = ResourcePool::new("crew", ResourceType::Personnel, 10.0, "FTE");
        let year = ResourceRequirement::new("r", "a", ResourceType::Personnel, 2.0, 2)
            .with_duration_days(365.0);
        assert!((cost_estimate(&year, &pool, 2.0, &config) - 170_000.0).abs() < 1e-6);

        let pool = pool.with_unit_cost(73_000.0);
        let short = ResourceRequirement::new("r", "a", ResourceType::Personnel, 1.0, 2)
            .with_duration_days(5.0);
        assert!((cost_estimate(&short, &pool, 1.0, &config) - 1_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_equipment_defaults_to_configured_duration() {
        let config = ResourceConfig::default();
        let pool = ResourcePool::new("fleet", ResourceType::Equipment, 5.0, "units");
        let req = ResourceRequirement::new("r", "a", ResourceType::Equipment, 3.0, 3);
        assert_eq!(cost_estimate(&req, &pool, 3.0, &config), 3.0 * 1_200.0 * 90.0);
    }
}
