//! Weighted net-score aggregation
//!
//! ```text
//! net_score = clamp(Σ weight_i × value_i, 0, 1)
//! ```
//!
//! over every metric whose value is not the `-1.0` sentinel. Excluded
//! metrics contribute nothing and the remaining weights are not
//! renormalised, so a missing metric can only lower the net score.

use crate::models::{MetricKind, MetricResult, MetricValue};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Default weights; they sum to 1.0
const STANDARD_WEIGHTS: [(MetricKind, f64); 9] = [
    (MetricKind::BusFactor, 0.15),
    (MetricKind::CodeQuality, 0.15),
    (MetricKind::License, 0.15),
    (MetricKind::RampUpTime, 0.15),
    (MetricKind::DatasetQuality, 0.10),
    (MetricKind::PerformanceClaims, 0.10),
    (MetricKind::Reproducibility, 0.10),
    (MetricKind::Reviewedness, 0.05),
    (MetricKind::Treescore, 0.05),
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeightError {
    #[error("unknown metric '{0}' in weight table")]
    UnknownMetric(String),

    #[error("weight for {metric} must be a finite non-negative number, got {value}")]
    InvalidWeight { metric: String, value: f64 },

    #[error("weight table sums to zero")]
    ZeroSum,
}

/// Immutable metric → weight map
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: BTreeMap<MetricKind, f64>,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl WeightTable {
    pub fn standard() -> Self {
        Self {
            weights: STANDARD_WEIGHTS.into_iter().collect(),
        }
    }

    /// Standard table with `overrides` applied by metric name, normalised to
    /// sum to 1.0 when it does not already
    pub fn with_overrides(overrides: &BTreeMap<String, f64>) -> Result<Self, WeightError> {
        let mut table = Self::standard();
        for (name, &value) in overrides {
            let kind =
                MetricKind::from_name(name).ok_or_else(|| WeightError::UnknownMetric(name.clone()))?;
            if !value.is_finite() || value < 0.0 {
                return Err(WeightError::InvalidWeight {
                    metric: name.clone(),
                    value,
                });
            }
            table.weights.insert(kind, value);
        }

        if table.total() <= 0.0 {
            return Err(WeightError::ZeroSum);
        }
        if !table.is_valid() {
            debug!("Weight table sums to {:.3}, normalizing", table.total());
            table.normalize();
        }
        Ok(table)
    }

    /// Like [`with_overrides`](Self::with_overrides), but an invalid table
    /// falls back to the standard weights with a warning
    pub fn from_config(overrides: Option<&BTreeMap<String, f64>>) -> Self {
        match overrides {
            None => Self::standard(),
            Some(map) if map.is_empty() => Self::standard(),
            Some(map) => Self::with_overrides(map).unwrap_or_else(|e| {
                warn!("Ignoring configured weights ({}); using defaults", e);
                Self::standard()
            }),
        }
    }

    /// Weight of `kind`; 0 for unweighted metrics
    pub fn weight(&self, kind: MetricKind) -> f64 {
        self.weights.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Validate that weights sum to 1.0 (with tolerance)
    pub fn is_valid(&self) -> bool {
        (self.total() - 1.0).abs() < 0.001
    }

    fn normalize(&mut self) {
        let sum = self.total();
        if sum > 0.0 {
            for w in self.weights.values_mut() {
                *w /= sum;
            }
        }
    }

    /// Weighted metrics in output order
    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, f64)> + '_ {
        self.weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(k, w)| (*k, *w))
    }
}

/// One metric's share of the net score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub kind: MetricKind,
    pub weight: f64,
    pub value: MetricValue,
    /// `weight × value`, 0 when excluded
    pub points: f64,
    pub included: bool,
}

/// Pure aggregation over a fixed weight table
#[derive(Debug, Clone, Default)]
pub struct NetScoreAggregator {
    weights: WeightTable,
}

impl NetScoreAggregator {
    pub fn new(weights: WeightTable) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Per-metric contributions for every weighted metric, absent ones
    /// reported as excluded
    pub fn breakdown(&self, metrics: &BTreeMap<MetricKind, MetricResult>) -> Vec<Contribution> {
        self.weights
            .iter()
            .map(|(kind, weight)| {
                let value = metrics
                    .get(&kind)
                    .map(|m| m.value)
                    .unwrap_or(MetricValue::NOT_APPLICABLE);
                match value.score() {
                    Some(v) => Contribution {
                        kind,
                        weight,
                        value,
                        points: weight * v,
                        included: true,
                    },
                    None => Contribution {
                        kind,
                        weight,
                        value,
                        points: 0.0,
                        included: false,
                    },
                }
            })
            .collect()
    }

    pub fn aggregate(&self, metrics: &BTreeMap<MetricKind, MetricResult>) -> MetricValue {
        let sum: f64 = self.breakdown(metrics).iter().map(|c| c.points).sum();
        // Never the sentinel: clamp lands in [0, 1]
        MetricValue::new(sum)
    }
}
