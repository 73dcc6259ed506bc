//! Resource pools and the requirements drawn against them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Kind of resource being allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Money,
    Personnel,
    Equipment,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Money,
        ResourceType::Personnel,
        ResourceType::Equipment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Money => "money",
            ResourceType::Personnel => "personnel",
            ResourceType::Equipment => "equipment",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stock of one resource type that requirements can draw from.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourcePool {
    pub id: String,
    pub resource_type: ResourceType,
    pub total_quantity: f64,
    pub available_quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Skills offered by a personnel pool.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Equipment kinds offered by an equipment pool.
    #[serde(default)]
    pub equipment_types: Vec<String>,
    /// Annual FTE rate for personnel, daily rate for equipment; unused for money.
    #[serde(default)]
    pub unit_cost: Option<f64>,
}

impl ResourcePool {
    pub fn new(
        id: impl Into<String>,
        resource_type: ResourceType,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            resource_type,
            total_quantity: quantity,
            available_quantity: quantity,
            unit: unit.into(),
            region: None,
            skills: Vec::new(),
            equipment_types: Vec::new(),
            unit_cost: None,
        }
    }

    pub fn with_available(mut self, available: f64) -> Self {
        self.available_quantity = available;
        self
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_skills<I, T>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_equipment_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.equipment_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unit_cost(mut self, rate: f64) -> Self {
        self.unit_cost = Some(rate);
        self
    }

    /// Returns true if this pool can serve `requirement`.
    ///
    /// Types must match. Personnel pools must offer every required skill;
    /// equipment pools must offer the required equipment type. Money has no
    /// further restriction.
    pub fn can_serve(&self, requirement: &ResourceRequirement) -> bool {
        if self.resource_type != requirement.resource_type {
            return false;
        }
        match self.resource_type {
            ResourceType::Money => true,
            ResourceType::Personnel => requirement
                .required_skills
                .iter()
                .all(|skill| self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))),
            ResourceType::Equipment => match &requirement.equipment_type {
                Some(kind) => self
                    .equipment_types
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(kind)),
                None => true,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::new("", "id", "must not be empty"));
        }
        if !self.total_quantity.is_finite() || self.total_quantity < 0.0 {
            return Err(ValidationError::new(&self.id, "total_quantity", "must be non-negative"));
        }
        if !self.available_quantity.is_finite()
            || self.available_quantity < 0.0
            || self.available_quantity > self.total_quantity
        {
            return Err(ValidationError::new(
                &self.id,
                "available_quantity",
                format!(
                    "must lie within [0, {}], got {}",
                    self.total_quantity, self.available_quantity
                ),
            ));
        }
        if let Some(rate) = self.unit_cost {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ValidationError::new(&self.id, "unit_cost", "must be non-negative"));
            }
        }
        Ok(())
    }
}

/// A need for one resource type by one asset project.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourceRequirement {
    pub id: String,
    pub asset_id: String,
    pub resource_type: ResourceType,
    pub quantity_needed: f64,
    pub unit: String,
    /// 1 = critical .. 5 = minimal.
    pub priority: u8,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub equipment_type: Option<String>,
    /// Requirements that should be satisfied first. Recorded, not enforced.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Duration of the engagement, for personnel and equipment costing.
    #[serde(default)]
    pub duration_days: Option<f64>,
}

impl ResourceRequirement {
    pub fn new(
        id: impl Into<String>,
        asset_id: impl Into<String>,
        resource_type: ResourceType,
        quantity_needed: f64,
        priority: u8,
    ) -> Self {
        let unit = match resource_type {
            ResourceType::Money => "CAD",
            ResourceType::Personnel => "FTE",
            ResourceType::Equipment => "units",
        };
        Self {
            id: id.into(),
            asset_id: asset_id.into(),
            resource_type,
            quantity_needed,
            unit: unit.to_string(),
            priority,
            required_skills: Vec::new(),
            equipment_type: None,
            dependencies: Vec::new(),
            duration_days: None,
        }
    }

    pub fn with_skills<I, T>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.required_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_equipment_type(mut self, kind: impl Into<String>) -> Self {
        self.equipment_type = Some(kind.into());
        self
    }

    pub fn with_dependencies<I, T>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_duration_days(mut self, days: f64) -> Self {
        self.duration_days = Some(days);
        self
    }

    /// Objective weight for this requirement: priority 1 maps to 5, 5 maps to 1.
    pub fn priority_weight(&self) -> f64 {
        (6 - self.priority.clamp(1, 5)) as f64
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::new("", "id", "must not be empty"));
        }
        if !self.quantity_needed.is_finite() || self.quantity_needed <= 0.0 {
            return Err(ValidationError::new(
                &self.id,
                "quantity_needed",
                format!("must be positive, got {}", self.quantity_needed),
            ));
        }
        if !(1..=5).contains(&self.priority) {
            return Err(ValidationError::new(
                &self.id,
                "priority",
                format!("must be within 1..=5, got {}", self.priority),
            ));
        }
        if let Some(days) = self.duration_days {
            if !days.is_finite() || days <= 0.0 {
                return Err(ValidationError::new(&self.id, "duration_days", "must be positive"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_weight() {
        let critical = ResourceRequirement::new("r1", "a1", ResourceType::Money, 10.0, 1);
        let minimal = ResourceRequirement::new("r2", "a1", ResourceType::Money, 10.0, 5);
        assert_eq!(critical.priority_weight(), 5.0);
        assert_eq!(minimal.priority_weight(), 1.0);
    }

    #[test]
    fn test_personnel_skill_compatibility() {
        let pool = ResourcePool::new("crew", ResourceType::Personnel, 10.0, "FTE")
            .with_skills(["welding", "Inspection"]);
        let ok = ResourceRequirement::new("r1", "a1", ResourceType::Personnel, 2.0, 2)
            .with_skills(["inspection"]);
        let missing = ResourceRequirement::new("r2", "a1", ResourceType::Personnel, 2.0, 2)
            .with_skills(["electrical"]);
        assert!(pool.can_serve(&ok));
        assert!(!pool.can_serve(&missing));
    }

    #[test]
    fn test_type_mismatch_incompatible() {
        let pool = ResourcePool::new("cash", ResourceType::Money, 1e6, "CAD");
        let req = ResourceRequirement::new("r1", "a1", ResourceType::Equipment, 1.0, 3);
        assert!(!pool.can_serve(&req));
    }

    #[test]
    fn test_equipment_type_compatibility() {
        let pool = ResourcePool::new("fleet", ResourceType::Equipment, 4.0, "units")
            .with_equipment_types(["crane", "excavator"]);
        let crane = ResourceRequirement::new("r1", "a1", ResourceType::Equipment, 1.0, 3)
            .with_equipment_type("Crane");
        let drill = ResourceRequirement::new("r2", "a1", ResourceType::Equipment, 1.0, 3)
            .with_equipment_type("drill");
        assert!(pool.can_serve(&crane));
        assert!(!pool.can_serve(&drill));
    }

    #[test]
    fn test_validation() {
        let pool = ResourcePool::new("p", ResourceType::Money, 10.0, "CAD").with_available(20.0);
        assert_eq!(pool.validate().unwrap_err().field, "available_quantity");

        let req = ResourceRequirement::new("r", "a", ResourceType::Money, 0.0, 3);
        assert_eq!(req.validate().unwrap_err().field, "quantity_needed");

        let req = ResourceRequirement::new("r", "a", ResourceType::Money, 1.0, 9);
        assert_eq!(req.validate().unwrap_err().field, "priority");
    }
}
