//! Asset fixtures.

use infraplan_core::{Asset, AssetType};

/// Daily usage given to fixture assets unless overridden.
pub const FIXTURE_DAILY_USAGE: f64 = 1_000.0;

/// Creates an asset with [`FIXTURE_DAILY_USAGE`].
pub fn asset(
    id: &str,
    asset_type: AssetType,
    region: &str,
    condition: f64,
    age_years: f64,
    replacement_cost: f64,
) -> Asset {
    Asset::new(
        id,
        asset_type,
        region,
        condition,
        age_years,
        FIXTURE_DAILY_USAGE,
        replacement_cost,
    )
    .expect("fixture asset must be valid")
}

/// Creates one bridge per cost, all identical apart from id and cost.
///
/// Ids are `A0`, `A1`, ... in input order.
pub fn costed(costs: &[f64]) -> Vec<Asset> {
    costs
        .iter()
        .enumerate()
        .map(|(i, &cost)| asset(&format!("A{i}"), AssetType::Bridge, "ON", 50.0, 20.0, cost))
        .collect()
}

/// A small portfolio spread over three regions with varied condition.
pub fn mixed_portfolio() -> Vec<Asset> {
    vec![
        asset("ON-BR-1", AssetType::Bridge, "ON", 35.0, 62.0, 400.0),
        asset("ON-HW-2", AssetType::HighwaySegment, "ON", 72.0, 18.0, 250.0)
            .with_daily_usage(40_000.0),
        asset("QC-WM-1", AssetType::WaterMain, "QC", 48.0, 55.0, 300.0),
        asset("QC-HO-1", AssetType::Hospital, "QC", 81.0, 12.0, 500.0)
            .with_daily_usage(3_000.0),
        asset("BC-PB-1", AssetType::PublicBuilding, "BC", 58.0, 40.0, 150.0),
        asset("BC-BR-2", AssetType::Bridge, "BC", 90.0, 5.0, 350.0).with_growth_rate(2.5),
    ]
}
