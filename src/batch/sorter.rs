//! # Batch Sorter & Array Breakdown
//!
//! Resolves module SKUs (dropping anything the resolver can't place),
//! groups consecutive identical-SKU rows into operator-facing lines,
//! computes array breakdown honoring a wrapping start position, and
//! orders modules within an array to minimize LED-bin transitions.

use std::collections::HashSet;

use crate::batch::types::{Group, ModuleRequest};
use crate::sku::SkuResolver;

/// A module after SKU resolution, ready for array breakdown.
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    pub canonical_sku: String,
    pub led_codes: Vec<u8>,
    pub original_position: usize,
}

/// Resolve every module's SKU, dropping any the resolver can't place.
pub fn resolve_modules(resolver: &SkuResolver, modules: &[ModuleRequest]) -> Vec<ResolvedModule> {
    modules
        .iter()
        .filter_map(|m| {
            let resolution = resolver.resolve(&m.sku).ok().flatten()?;
            Some(ResolvedModule {
                canonical_sku: resolution.canonical_sku,
                led_codes: m.led_codes.clone(),
                original_position: m.original_position,
            })
        })
        .collect()
}

/// Group rows whose canonical SKU is identical across consecutive QSA
/// rows into a single operator-facing line.
pub fn group_consecutive(rows: &[(u32, String, u32)]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for (qsa_sequence, canonical_sku, qty) in rows {
        if let Some(last) = groups.last_mut() {
            if &last.canonical_sku == canonical_sku {
                last.qsa_sequences.push(*qsa_sequence);
                last.total_qty += qty;
                continue;
            }
        }
        groups.push(Group {
            canonical_sku: canonical_sku.clone(),
            qsa_sequences: vec![*qsa_sequence],
            total_qty: *qty,
        });
    }
    groups
}

/// One array's module count, per the wrapping breakdown rule: first
/// array takes `min(n, 9 - start)`, the rest take up to 8, positions
/// wrapping through `1..=8`.
pub fn array_breakdown(n: u32, start: u8) -> Vec<u32> {
    assert!((1..=8).contains(&start));
    if n == 0 {
        return Vec::new();
    }
    let first = n.min((9 - start as u32).max(0));
    let mut arrays = vec![first];
    let mut remaining = n - first;
    while remaining > 0 {
        let take = remaining.min(8);
        arrays.push(take);
        remaining -= take;
    }
    arrays
}

/// Module positions for one array, given its size and the start
/// position used for the *first* array of the group. Arrays after the
/// first always start at position 1.
pub fn positions_for_array(array_index: usize, array_size: u32, group_start: u8) -> Vec<u8> {
    let start = if array_index == 0 { group_start } else { 1 };
    (0..array_size).map(|i| start + i as u8).collect()
}

/// Minimize `Σ |LEDs(next) \ LEDs(current)|` over adjacent pairs by
/// greedily choosing, at each step, the unplaced module whose LED set
/// introduces the fewest new codes relative to the current module.
/// Ties break by (SKU, original position) to keep the ordering stable.
pub fn minimize_led_transitions(modules: Vec<ResolvedModule>) -> Vec<ResolvedModule> {
    if modules.len() <= 1 {
        return modules;
    }

    let mut remaining: Vec<ResolvedModule> = modules;
    remaining.sort_by(|a, b| {
        a.canonical_sku
            .cmp(&b.canonical_sku)
            .then(a.original_position.cmp(&b.original_position))
    });

    let mut ordered = vec![remaining.remove(0)];
    while !remaining.is_empty() {
        let current: HashSet<u8> = ordered.last().unwrap().led_codes.iter().copied().collect();
        let mut best_idx = 0;
        let mut best_cost = usize::MAX;
        for (idx, candidate) in remaining.iter().enumerate() {
            let cost = candidate
                .led_codes
                .iter()
                .filter(|led| !current.contains(led))
                .count();
            let better = cost < best_cost
                || (cost == best_cost
                    && (candidate.canonical_sku.clone(), candidate.original_position)
                        < (
                            remaining[best_idx].canonical_sku.clone(),
                            remaining[best_idx].original_position,
                        ));
            if better {
                best_cost = cost;
                best_idx = idx;
            }
        }
        ordered.push(remaining.remove(best_idx));
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(sku: &str, leds: &[u8], pos: usize) -> ResolvedModule {
        ResolvedModule {
            canonical_sku: sku.to_string(),
            led_codes: leds.to_vec(),
            original_position: pos,
        }
    }

    #[test]
    fn array_breakdown_35_modules_start_7() {
        assert_eq!(array_breakdown(35, 7), vec![2, 8, 8, 8, 8, 1]);
    }

    #[test]
    fn array_breakdown_8_modules_start_2() {
        assert_eq!(array_breakdown(8, 2), vec![7, 1]);
    }

    #[test]
    fn array_breakdown_fits_in_first_array() {
        assert_eq!(array_breakdown(3, 7), vec![3]);
    }

    #[test]
    fn array_breakdown_zero_modules() {
        assert_eq!(array_breakdown(0, 1), Vec::<u32>::new());
    }

    #[test]
    fn positions_wrap_after_first_array() {
        assert_eq!(positions_for_array(0, 7, 2), vec![2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(positions_for_array(1, 1, 2), vec![1]);
    }

    #[test]
    fn group_consecutive_merges_identical_adjacent_skus() {
        let rows = vec![
            (1, "STAR".to_string(), 4),
            (2, "STAR".to_string(), 3),
            (3, "CUBE".to_string(), 2),
        ];
        let groups = group_consecutive(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].qsa_sequences, vec![1, 2]);
        assert_eq!(groups[0].total_qty, 7);
        assert_eq!(groups[1].total_qty, 2);
    }

    #[test]
    fn group_consecutive_does_not_merge_nonadjacent_identical_skus() {
        let rows = vec![
            (1, "STAR".to_string(), 1),
            (2, "CUBE".to_string(), 1),
            (3, "STAR".to_string(), 1),
        ];
        let groups = group_consecutive(&rows);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn led_transition_sort_never_worse_than_input() {
        let input = vec![
            module("A", &[1, 2], 0),
            module("B", &[3, 4], 1),
            module("C", &[1, 2], 2),
        ];
        let input_cost = transitions_cost(&input);
        let sorted = minimize_led_transitions(input.clone());
        let sorted_cost = transitions_cost(&sorted);
        assert!(sorted_cost <= input_cost);
    }

    #[test]
    fn led_transition_sort_groups_shared_leds_adjacently() {
        let input = vec![
            module("A", &[1], 0),
            module("B", &[9], 1),
            module("C", &[1], 2),
        ];
        let sorted = minimize_led_transitions(input);
        // The two modules sharing LED 1 should end up adjacent.
        let pos_a = sorted.iter().position(|m| m.canonical_sku == "A").unwrap();
        let pos_c = sorted.iter().position(|m| m.canonical_sku == "C").unwrap();
        assert_eq!((pos_a as i32 - pos_c as i32).abs(), 1);
    }

    fn transitions_cost(modules: &[ResolvedModule]) -> usize {
        modules
            .windows(2)
            .map(|w| {
                let current: HashSet<u8> = w[0].led_codes.iter().copied().collect();
                w[1].led_codes.iter().filter(|l| !current.contains(l)).count()
            })
            .sum()
    }
}
