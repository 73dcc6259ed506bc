//! Risk and impact scoring for capital planning.

use infraplan_core::Asset;
use rayon::prelude::*;

/// Relative importance of failure risk versus service coverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub risk: f64,
    pub coverage: f64,
}

impl ScoringWeights {
    pub fn new(risk: f64, coverage: f64) -> Self {
        Self { risk, coverage }
    }

    pub fn is_valid(&self) -> bool {
        [self.risk, self.coverage]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::new(0.6, 0.4)
    }
}

/// Normalized scores for one asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetScore {
    /// Failure-risk proxy in [0, 1].
    pub risk: f64,
    /// Usage impact in [0, 1].
    pub impact: f64,
    pub priority: f64,
}

/// Unnormalized failure risk: worse condition and older assets score higher.
pub fn raw_risk(asset: &Asset) -> f64 {
    (100.0 - asset.condition_score).max(0.0) * (1.0 + asset.age_years / 50.0)
}

/// Unnormalized service impact from usage and population growth.
pub fn raw_impact(asset: &Asset) -> f64 {
    (1.0 + asset.daily_usage).ln() * (1.0 + asset.population_growth_rate / 100.0).max(0.0)
}

/// Scores every asset, normalizing risk and impact by their maxima.
///
/// Output order matches `assets`.
pub fn score_assets(assets: &[Asset], weights: ScoringWeights) -> Vec<AssetScore> {
    let raw: Vec<(f64, f64)> = assets
        .par_iter()
        .map(|a| (raw_risk(a), raw_impact(a)))
        .collect();
    let max_risk = raw.iter().map(|r| r.0).fold(0.0_f64, f64::max);
    let max_impact = raw.iter().map(|r| r.1).fold(0.0_f64, f64::max);

    raw.into_iter()
        .map(|(risk, impact)| {
            let risk = normalize(risk, max_risk);
            let impact = normalize(impact, max_impact);
            AssetScore {
                risk,
                impact,
                priority: weights.risk * risk + weights.coverage * impact,
            }
        })
        .collect()
}

fn normalize(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraplan_core::AssetType;
    use infraplan_test::assets::asset;

    #[test]
    fn test_raw_scores() {
        let a = asset("a", AssetType::Bridge, "ON", 40.0, 25.0, 100.0);
        assert!((raw_risk(&a) - 90.0).abs() < 1e-12);
        let expected = 1_001.0_f64.ln();
        assert!((raw_impact(&a) - expected).abs() < 1e-12);

        let growing = a.clone().with_growth_rate(10.0);
        assert!((raw_impact(&growing) - expected * 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_to_unit_range() {
        let assets = vec![
            asset("worn", AssetType::Bridge, "ON", 20.0, 60.0, 100.0),
            asset("fair", AssetType::Bridge, "ON", 60.0, 20.0, 100.0).with_daily_usage(50_000.0),
            asset("new", AssetType::Bridge, "ON", 100.0, 0.0, 100.0).with_daily_usage(0.0),
        ];
        let scores = score_assets(&assets, ScoringWeights::default());

        assert_eq!(scores[0].risk, 1.0);
        assert_eq!(scores[1].impact, 1.0);
        assert_eq!(scores[2].risk, 0.0);
        assert_eq!(scores[2].impact, 0.0);
        for s in &scores {
            assert!((0.0..=1.0).contains(&s.risk));
            assert!((0.0..=1.0).contains(&s.impact));
            assert!((s.priority - (0.6 * s.risk + 0.4 * s.impact)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_all_zero_scores() {
        let assets =
            vec![asset("new", AssetType::Other, "ON", 100.0, 0.0, 10.0).with_daily_usage(0.0)];
        let scores = score_assets(&assets, ScoringWeights::new(1.0, 1.0));
        assert_eq!(scores[0].priority, 0.0);
    }

    #[test]
    fn test_weight_validation() {
        assert!(ScoringWeights::default().is_valid());
        assert!(!ScoringWeights::new(-0.1, 0.5).is_valid());
        assert!(!ScoringWeights::new(f64::NAN, 0.5).is_valid());
    }
}
