//! Infrastructure assets and their validated construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Condition score assigned when a record does not carry one.
pub const DEFAULT_CONDITION_SCORE: f64 = 60.0;

/// Category of an infrastructure asset.
///
/// The category drives decay rates, failure multipliers and demand
/// elasticity in the forecasting models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize)]
pub enum AssetType {
    Bridge,
    HighwaySegment,
    WaterMain,
    PublicBuilding,
    Hospital,
    #[default]
    Other,
}

impl AssetType {
    pub const ALL: [AssetType; 6] = [
        AssetType::Bridge,
        AssetType::HighwaySegment,
        AssetType::WaterMain,
        AssetType::PublicBuilding,
        AssetType::Hospital,
        AssetType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Bridge => "Bridge",
            AssetType::HighwaySegment => "HighwaySegment",
            AssetType::WaterMain => "WaterMain",
            AssetType::PublicBuilding => "PublicBuilding",
            AssetType::Hospital => "Hospital",
            AssetType::Other => "Other",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = std::convert::Infallible;

    /// Parses loosely: case and separators are ignored, and anything
    /// unrecognized becomes [`AssetType::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Ok(match normalized.as_str() {
            "bridge" => AssetType::Bridge,
            "highway" | "highwaysegment" | "road" => AssetType::HighwaySegment,
            "watermain" | "water" => AssetType::WaterMain,
            "publicbuilding" | "building" => AssetType::PublicBuilding,
            "hospital" => AssetType::Hospital,
            _ => AssetType::Other,
        })
    }
}

/// Raw asset record as handed over by ingestion.
///
/// Every field is optional; [`Asset::try_from`] decides what is required.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub asset_type: Option<String>,
    pub region: Option<String>,
    pub condition_score: Option<f64>,
    pub age_years: Option<f64>,
    pub daily_usage: Option<f64>,
    pub replacement_cost: Option<f64>,
    pub population_growth_rate: Option<f64>,
    pub design_capacity: Option<f64>,
}

/// A validated infrastructure asset.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub asset_type: AssetType,
    pub region: String,
    /// 0 (failed) to 100 (as new).
    pub condition_score: f64,
    pub age_years: f64,
    pub daily_usage: f64,
    /// Always strictly positive.
    pub replacement_cost: f64,
    /// Percent per year.
    pub population_growth_rate: f64,
    /// Design capacity in daily usage units, if known.
    #[serde(default)]
    pub design_capacity: Option<f64>,
}

impl Asset {
    /// Creates an asset, validating cost and condition.
    pub fn new(
        id: impl Into<String>,
        asset_type: AssetType,
        region: impl Into<String>,
        condition_score: f64,
        age_years: f64,
        daily_usage: f64,
        replacement_cost: f64,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let asset = Self {
            name: id.clone(),
            id,
            asset_type,
            region: region.into(),
            condition_score,
            age_years,
            daily_usage,
            replacement_cost,
            population_growth_rate: 0.0,
            design_capacity: None,
        };
        asset.validate()?;
        Ok(asset)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_growth_rate(mut self, pct_per_year: f64) -> Self {
        self.population_growth_rate = pct_per_year;
        self
    }

    pub fn with_daily_usage(mut self, daily_usage: f64) -> Self {
        self.daily_usage = daily_usage;
        self
    }

    pub fn with_design_capacity(mut self, capacity: f64) -> Self {
        self.design_capacity = Some(capacity);
        self
    }

    /// Checks the invariants every asset must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::new("", "id", "must not be empty"));
        }
        if !self.replacement_cost.is_finite() || self.replacement_cost <= 0.0 {
            return Err(ValidationError::new(
                &self.id,
                "replacement_cost",
                format!("must be positive, got {}", self.replacement_cost),
            ));
        }
        if !(0.0..=100.0).contains(&self.condition_score) {
            return Err(ValidationError::new(
                &self.id,
                "condition_score",
                format!("must be within [0, 100], got {}", self.condition_score),
            ));
        }
        if !self.age_years.is_finite() || self.age_years < 0.0 {
            return Err(ValidationError::new(
                &self.id,
                "age_years",
                format!("must be non-negative, got {}", self.age_years),
            ));
        }
        if !self.daily_usage.is_finite() || self.daily_usage < 0.0 {
            return Err(ValidationError::new(
                &self.id,
                "daily_usage",
                format!("must be non-negative, got {}", self.daily_usage),
            ));
        }
        if !self.population_growth_rate.is_finite() {
            return Err(ValidationError::new(
                &self.id,
                "population_growth_rate",
                "must be finite",
            ));
        }
        if let Some(capacity) = self.design_capacity {
            if !capacity.is_finite() || capacity <= 0.0 {
                return Err(ValidationError::new(
                    &self.id,
                    "design_capacity",
                    format!("must be positive when present, got {capacity}"),
                ));
            }
        }
        Ok(())
    }
}

impl TryFrom<AssetRecord> for Asset {
    type Error = ValidationError;

    fn try_from(record: AssetRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ValidationError::new("", "id", "missing"))?;
        let replacement_cost = record
            .replacement_cost
            .ok_or_else(|| ValidationError::new(&id, "replacement_cost", "missing"))?;
        let asset_type = record
            .asset_type
            .as_deref()
            .map(|s| s.parse::<AssetType>().unwrap_or_default())
            .unwrap_or_default();

        let asset = Asset {
            name: record.name.unwrap_or_else(|| id.clone()),
            asset_type,
            region: record.region.unwrap_or_else(|| "UNKNOWN".to_string()),
            condition_score: record.condition_score.unwrap_or(DEFAULT_CONDITION_SCORE),
            age_years: record.age_years.unwrap_or(0.0),
            daily_usage: record.daily_usage.unwrap_or(0.0),
            replacement_cost,
            population_growth_rate: record.population_growth_rate.unwrap_or(0.0),
            design_capacity: record.design_capacity,
            id,
        };
        asset.validate()?;
        Ok(asset)
    }
}

/// Converts a batch of raw records, keeping the valid ones and returning
/// one error per rejected record.
pub fn partition_records(records: Vec<AssetRecord>) -> (Vec<Asset>, Vec<ValidationError>) {
    let mut assets = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for record in records {
        match Asset::try_from(record) {
            Ok(asset) => assets.push(asset),
            Err(err) => rejected.push(err),
        }
    }
    (assets, rejected)
}
