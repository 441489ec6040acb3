// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Engine
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Campbell diagram engine.
//!
//! Stage 1: linearization files, blade ordering, aggregation
//! Stage 2: multi-blade transform and eigen-analysis per operating point
//! Stage 3: mode tracking, cluster refinement, diagram assembly

pub mod aggregate;
pub mod cancel;
pub mod cluster;
pub mod diagram;
pub mod linfile;
pub mod mbc;
pub mod modal;
pub mod ordering;
pub mod pipeline;
pub mod tracker;
