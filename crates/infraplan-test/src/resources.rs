//! Resource pool and requirement fixtures.

use infraplan_core::{ResourcePool, ResourceRequirement, ResourceType};

pub fn money_pool(id: &str, amount: f64) -> ResourcePool {
    ResourcePool::new(id, ResourceType::Money, amount, "CAD")
}

pub fn personnel_pool(id: &str, fte: f64, skills: &[&str]) -> ResourcePool {
    ResourcePool::new(id, ResourceType::Personnel, fte, "FTE").with_skills(skills.iter().copied())
}

pub fn equipment_pool(id: &str, units: f64, kinds: &[&str]) -> ResourcePool {
    ResourcePool::new(id, ResourceType::Equipment, units, "units")
        .with_equipment_types(kinds.iter().copied())
}

pub fn requirement(
    id: &str,
    asset_id: &str,
    resource_type: ResourceType,
    quantity: f64,
    priority: u8,
) -> ResourceRequirement {
    ResourceRequirement::new(id, asset_id, resource_type, quantity, priority)
}
