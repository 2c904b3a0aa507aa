//! trustcard - trustworthiness scorecards for ML artifacts
//!
//! Scores a model or dataset registry entry on bus factor, code quality,
//! license, ramp-up time, dataset quality, performance claims,
//! reproducibility, reviewedness and lineage (treescore), then folds them
//! into a weighted net score.
//!
//! ```rust,ignore
//! use trustcard::collaborators::Collaborators;
//! use trustcard::engine::ScoringEngine;
//! use trustcard::models::ArtifactRef;
//!
//! let card = ScoringEngine::default()
//!     .score(&ArtifactRef::new("org/model"), &Collaborators::offline())
//!     .await?;
//! println!("{}", card.net_score());
//! ```

pub mod ai;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod git;
pub mod lineage;
pub mod metrics;
pub mod models;
pub mod reporters;
pub mod scoring;
