//! Priority-ordered pool draining.

use infraplan_core::{ResourcePool, ResourceRequirement};
use smallvec::SmallVec;

use super::{Compatible, Fractions};

/// Serves requirements by ascending priority (then id), drawing from their
/// compatible pools in pool order until the need is met or the pools run dry.
///
/// Returns, per requirement, the share of its need drawn from each of its
/// compatible pools.
pub fn greedy_drain(
    requirements: &[ResourceRequirement],
    pools: &[ResourcePool],
    compatible: &[Compatible],
) -> Vec<Fractions> {
    let mut order: Vec<usize> = (0..requirements.len()).collect();
    order.sort_by(|&a, &b| {
        requirements[a]
            .priority
            .cmp(&requirements[b].priority)
            .then_with(|| requirements[a].id.cmp(&requirements[b].id))
    });

    let mut remaining: Vec<f64> = pools.iter().map(|p| p.available_quantity).collect();
    let mut fractions: Vec<Fractions> = compatible
        .iter()
        .map(|c| SmallVec::from_elem(0.0, c.len()))
        .collect();

    for r in order {
        let needed = requirements[r].quantity_needed;
        let mut outstanding = needed;
        for (k, &p) in compatible[r].iter().enumerate() {
            if outstanding <= 0.0 {
                break;
            }
            let take = outstanding.min(remaining[p]);
            if take > 0.0 {
                remaining[p] -= take;
                outstanding -= take;
                fractions[r][k] = take / needed;
            }
        }
    }
    fractions
}
