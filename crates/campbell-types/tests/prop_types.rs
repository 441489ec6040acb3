// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Property-Based Tests (proptest) for campbell-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for campbell-types using proptest.
//!
//! Covers: descriptor partition keys, ordering concatenation, configuration
//! validation and serialization.

use campbell_types::config::{AnalysisConfig, DiagramOptions, PipelineConfig};
use campbell_types::snapshot::{Descriptor, StateOrdering};
use proptest::prelude::*;

fn descriptor(order: u8, rotating: bool, label: String) -> Descriptor {
    Descriptor {
        index: 0,
        value: 0.0,
        rotating,
        derivative_order: order,
        label,
    }
}

// ── Partition keys ───────────────────────────────────────────────────

proptest! {
    /// Keys order q2 < q2dot < q1 < algebraic regardless of label text.
    #[test]
    fn sort_key_respects_partition(label in "[A-Z]{2} [a-z ]{0,20}", rotating in any::<bool>()) {
        let q2 = descriptor(2, rotating, label.clone()).sort_key();
        let q2dot = descriptor(2, rotating, "ED First time derivative of x".to_string()).sort_key();
        let q1 = descriptor(1, rotating, label.clone()).sort_key();
        let alg = descriptor(0, rotating, label).sort_key();
        prop_assert!(q2 < q2dot);
        prop_assert!(q2dot < q1);
        prop_assert!(q1 < alg);
    }

    /// Rotating entries sort directly after their fixed counterparts.
    #[test]
    fn rotating_adds_one(order in 0u8..3, label in "[A-Z]{2} [a-z]{1,10}") {
        let fixed = descriptor(order, false, label.clone()).sort_key();
        let rot = descriptor(order, true, label).sort_key();
        prop_assert_eq!(rot, fixed + 1);
    }
}

// ── Orderings ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn combine_preserves_counts(
        parts in prop::collection::vec((0usize..4, 0usize..3), 0..5)
    ) {
        let mut next = 0usize;
        let orderings: Vec<StateOrdering> = parts
            .iter()
            .map(|&(fixed, triplets)| {
                let mut o = StateOrdering { num_fixed: fixed, ..StateOrdering::default() };
                o.indices = (next..next + fixed + 3 * triplets).collect();
                o.triplets = (0..triplets)
                    .map(|t| {
                        let base = next + fixed + 3 * t;
                        [base, base + 1, base + 2]
                    })
                    .collect();
                o.num = o.indices.len();
                next += o.num;
                o
            })
            .collect();
        let refs: Vec<&StateOrdering> = orderings.iter().collect();
        let combined = StateOrdering::combine(&refs);

        prop_assert_eq!(combined.num, next);
        prop_assert_eq!(combined.num, combined.num_fixed + combined.num_rotating());
        prop_assert_eq!(combined.indices, (0..next).collect::<Vec<_>>());
    }
}

// ── Configuration ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn window_validation_matches_ordering(lo in -10.0f64..10.0, hi in -10.0f64..10.0) {
        let opts = DiagramOptions { min_freq_hz: lo, max_freq_hz: hi, ..DiagramOptions::default() };
        prop_assert_eq!(opts.validate().is_ok(), hi > lo);
    }

    #[test]
    fn worker_count_never_zero(cores in 0usize..256) {
        let n = PipelineConfig::default().worker_count(cores);
        prop_assert!(n >= 1);
        prop_assert!(n <= cores.max(1));
    }

    #[test]
    fn config_json_preserves_values(
        quarter_hz in 2u32..80,
        structural in any::<bool>(),
        seed in any::<u64>(),
        trials in 1usize..5000,
    ) {
        let mut cfg = AnalysisConfig::default();
        cfg.diagram.max_freq_hz = quarter_hz as f64 * 0.25;
        cfg.diagram.structural_only = structural;
        cfg.clustering.seed = seed;
        cfg.clustering.max_trials = trials;
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, cfg);
    }
}
