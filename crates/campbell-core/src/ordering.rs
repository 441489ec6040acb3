// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Blade Triplet Ordering
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Detection of blade triplets in descriptor lists.
//!
//! A rotating-frame descriptor whose sanitized label carries a blade token
//! (`Blade 2`, `BD_3`, `PitchBearing1`, ...) is grouped with the two labels
//! that differ only in that token. Entries that cannot be completed into a
//! triplet, or whose label is a duplicate, are kept as fixed entries so the
//! result is always a permutation of the input indices.

use campbell_types::constants::NUM_BLADES;
use campbell_types::snapshot::{Descriptor, StateOrdering};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static BLADE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(blade\s+|blade root |PitchBearing|BD_|BD)(\d)")
        .unwrap_or_else(|e| panic!("blade token pattern: {e}"))
});

/// Partition `descs` into fixed entries followed by blade triplets.
///
/// Fixed order: non-rotating entries, then rotating entries without a
/// complete triplet, each in input order. Triplets follow in order of their
/// first-seen member, blades 1, 2, 3 within each triplet.
pub fn triplet_ordering(descs: &[Descriptor]) -> StateOrdering {
    let mut by_label: HashMap<String, usize> = HashMap::new();
    for d in descs.iter().filter(|d| d.rotating) {
        by_label.entry(d.sanitized_label()).or_insert(d.index);
    }

    let mut fixed = Vec::new();
    let mut other = Vec::new();
    let mut rotating = Vec::new();
    let mut triplets = Vec::new();
    let mut consumed: HashSet<usize> = HashSet::new();

    for d in descs {
        if !d.rotating {
            fixed.push(d.index);
            continue;
        }
        if consumed.contains(&d.index) {
            continue;
        }

        let label = d.sanitized_label();
        if by_label.get(&label) != Some(&d.index) {
            // Duplicate label
            other.push(d.index);
            consumed.insert(d.index);
            continue;
        }

        let triplet = BLADE_TOKEN.captures(&label).and_then(|caps| {
            let mut found = [0usize; NUM_BLADES];
            for (blade, slot) in found.iter_mut().enumerate() {
                let probe = label.replacen(&caps[0], &format!("{}{}", &caps[1], blade + 1), 1);
                let idx = *by_label.get(&probe)?;
                if consumed.contains(&idx) {
                    return None;
                }
                *slot = idx;
            }
            found.contains(&d.index).then_some(found)
        });

        match triplet {
            Some(t) => {
                for idx in t {
                    consumed.insert(idx);
                }
                rotating.extend_from_slice(&t);
                triplets.push(t);
            }
            None => {
                other.push(d.index);
                consumed.insert(d.index);
            }
        }
    }

    let num_fixed = fixed.len() + other.len();
    let mut indices = fixed;
    indices.extend(other);
    indices.extend(rotating);
    StateOrdering {
        num: descs.len(),
        num_fixed,
        indices,
        triplets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(index: usize, rotating: bool, label: &str) -> Descriptor {
        Descriptor {
            index,
            value: 0.0,
            rotating,
            derivative_order: 2,
            label: label.to_string(),
        }
    }

    fn is_permutation(o: &StateOrdering, n: usize) -> bool {
        let mut idx = o.indices.clone();
        idx.sort_unstable();
        idx == (0..n).collect::<Vec<_>>()
    }

    #[test]
    fn test_blade_triplet_detected() {
        let descs = vec![
            desc(0, false, "ED Platform horizontal surge translation DOF, m"),
            desc(1, true, "ED 1st flapwise bending-mode DOF of blade 1, m"),
            desc(2, true, "ED 1st flapwise bending-mode DOF of blade 2, m"),
            desc(3, true, "ED 1st flapwise bending-mode DOF of blade 3, m"),
            desc(4, false, "ED Variable speed generator DOF, rad"),
        ];
        let o = triplet_ordering(&descs);
        assert_eq!(o.num, 5);
        assert_eq!(o.num_fixed, 2);
        assert_eq!(o.indices, vec![0, 4, 1, 2, 3]);
        assert_eq!(o.triplets, vec![[1, 2, 3]]);
    }

    #[test]
    fn test_triplet_order_independent_of_listing() {
        let descs = vec![
            desc(0, true, "BD_3 tip rotation, rad"),
            desc(1, true, "BD_1 tip rotation, rad"),
            desc(2, true, "BD_2 tip rotation, rad"),
        ];
        let o = triplet_ordering(&descs);
        assert_eq!(o.triplets, vec![[1, 2, 0]]);
        assert_eq!(o.num_fixed, 0);
        assert_eq!(o.indices, vec![1, 2, 0]);
    }

    #[test]
    fn test_parenthesized_units_ignored_for_ed() {
        let descs = vec![
            desc(0, true, "ED blade 1 pitch (deg)"),
            desc(1, true, "ED blade 2 pitch (rad)"),
            desc(2, true, "ED blade 3 pitch (deg)"),
        ];
        let o = triplet_ordering(&descs);
        assert_eq!(o.num_triplets(), 1);
    }

    #[test]
    fn test_partial_triplet_kept_as_fixed() {
        let descs = vec![
            desc(0, true, "AD Blade 1 inflow"),
            desc(1, true, "AD Blade 2 inflow"),
            desc(2, true, "AD hub inflow"),
            desc(3, false, "ED tower"),
        ];
        let o = triplet_ordering(&descs);
        assert_eq!(o.num_triplets(), 0);
        assert_eq!(o.num_fixed, 4);
        assert_eq!(o.indices, vec![3, 0, 1, 2]);
        assert!(is_permutation(&o, 4));
    }

    #[test]
    fn test_duplicate_labels_stay_permutation() {
        let descs = vec![
            desc(0, true, "SrvD PitchBearing1 moment"),
            desc(1, true, "SrvD PitchBearing2 moment"),
            desc(2, true, "SrvD PitchBearing3 moment"),
            desc(3, true, "SrvD PitchBearing1 moment"),
        ];
        let o = triplet_ordering(&descs);
        assert_eq!(o.triplets, vec![[0, 1, 2]]);
        assert_eq!(o.num_fixed, 1);
        assert!(is_permutation(&o, 4));
    }

    #[test]
    fn test_empty() {
        let o = triplet_ordering(&[]);
        assert_eq!(o, StateOrdering::default());
    }
}
