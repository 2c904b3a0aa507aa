//! Net-score aggregation
//!
//! # Scoring Formula
//!
//! ```text
//! Net Score = clamp(Σ weight_i × value_i, 0, 1)
//! ```
//!
//! | metric             | weight |
//! |--------------------|--------|
//! | bus_factor         | 0.15   |
//! | code_quality       | 0.15   |
//! | license            | 0.15   |
//! | ramp_up_time       | 0.15   |
//! | dataset_quality    | 0.10   |
//! | performance_claims | 0.10   |
//! | reproducibility    | 0.10   |
//! | reviewedness       | 0.05   |
//! | treescore          | 0.05   |
//!
//! Metrics at the `-1.0` sentinel are excluded. `dataset_and_code_score`
//! and `size_score` are reported but carry no weight.

mod net_score;

pub use net_score::{Contribution, NetScoreAggregator, WeightError, WeightTable};
