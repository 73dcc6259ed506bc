//! Priority-ordered greedy selection.

/// Funds items by descending priority while they fit in `budget`.
///
/// Ties go to the cheaper item, then to the earlier one. Returns one flag
/// per item in input order.
pub fn greedy_selection(costs: &[f64], priorities: &[f64], budget: f64) -> Vec<bool> {
    debug_assert_eq!(costs.len(), priorities.len());
    let mut order: Vec<usize> = (0..costs.len()).collect();
    order.sort_by(|&a, &b| {
        priorities[b]
            .total_cmp(&priorities[a])
            .then_with(|| costs[a].total_cmp(&costs[b]))
            .then_with(|| a.cmp(&b))
    });

    let mut funded = vec![false; costs.len()];
    let mut spent = 0.0;
    for i in order {
        if spent + costs[i] <= budget {
            spent += costs[i];
            funded[i] = true;
        }
    }
    funded
}
