use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Allowed deviation of the weight sum from 1.0
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Discrete health status of a single category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Good,
    Fair,
    Poor,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Good => "Good",
            Status::Fair => "Fair",
            Status::Poor => "Poor",
        };
        f.pad(s)
    }
}

/// Which way a metric improves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Higher,
    Lower,
}

/// Status cut-offs for one category.
///
/// For `Higher`: `value > good` is Good, `value >= fair` is Fair.
/// For `Lower`: `value < good` is Good, `value < fair` is Fair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub direction: Direction,
    pub good: f64,
    pub fair: f64,
}

impl Threshold {
    pub const fn higher(good: f64, fair: f64) -> Self {
        Threshold {
            direction: Direction::Higher,
            good,
            fair,
        }
    }

    pub const fn lower(good: f64, fair: f64) -> Self {
        Threshold {
            direction: Direction::Lower,
            good,
            fair,
        }
    }

    pub fn classify(&self, value: f64) -> Status {
        match self.direction {
            Direction::Higher if value > self.good => Status::Good,
            Direction::Higher if value >= self.fair => Status::Fair,
            Direction::Lower if value < self.good => Status::Good,
            Direction::Lower if value < self.fair => Status::Fair,
            _ => Status::Poor,
        }
    }
}

/// Threshold applied to categories without an explicit entry
pub const DEFAULT_THRESHOLD: Threshold = Threshold::higher(80.0, 60.0);

/// Built-in thresholds for the categories the CI pipeline reports.
pub fn default_thresholds() -> BTreeMap<String, Threshold> {
    [
        ("coverage", Threshold::higher(80.0, 60.0)),
        ("security", Threshold::higher(80.0, 60.0)),
        ("documentation", Threshold::higher(80.0, 60.0)),
        ("maintainability", Threshold::higher(80.0, 60.0)),
        ("complexity", Threshold::lower(5.0, 10.0)),
        ("simulation_time", Threshold::lower(1.0, 5.0)),
        ("memory_usage", Threshold::lower(512.0, 1024.0)),
        ("vulnerabilities", Threshold::lower(1.0, 3.0)),
    ]
    .into_iter()
    .map(|(name, threshold)| (name.to_string(), threshold))
    .collect()
}

/// Documented default weighting: coverage 0.4, security 0.3, documentation 0.3.
pub fn default_weights() -> BTreeMap<String, f64> {
    [("coverage", 0.4), ("security", 0.3), ("documentation", 0.3)]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect()
}

/// Per-category entry of a [`HealthScore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub value: f64,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Weighted composite of all metric samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    /// Weighted score in `[0, 100]`
    pub overall: f64,
    pub breakdown: BTreeMap<String, CategoryScore>,
}

impl HealthScore {
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.breakdown
            .iter()
            .filter_map(|(name, score)| score.warning.as_deref().map(|w| (name.as_str(), w)))
    }
}

/// One measured value for a quality dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub category: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl MetricSample {
    pub fn new(category: impl Into<String>, value: f64) -> Self {
        MetricSample {
            category: category.into(),
            value,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Combines metric samples into a [`HealthScore`] under a fixed weighting.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    weights: BTreeMap<String, f64>,
    thresholds: BTreeMap<String, Threshold>,
}

impl MetricsAggregator {
    /// Validate `weights` against `thresholds` and build an aggregator.
    ///
    /// Weights must be finite, non-negative and sum to 1.0. Only
    /// higher-is-better categories may carry weight, which keeps the overall
    /// score monotone in every sample.
    pub fn new(
        weights: BTreeMap<String, f64>,
        thresholds: BTreeMap<String, Threshold>,
    ) -> Result<Self> {
        if weights.is_empty() {
            return Err(ReleaseError::weights("no categories are weighted"));
        }

        for (name, weight) in &weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ReleaseError::weights(format!(
                    "weight for '{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
            let threshold = thresholds.get(name).unwrap_or(&DEFAULT_THRESHOLD);
            if threshold.direction == Direction::Lower {
                return Err(ReleaseError::weights(format!(
                    "'{}' is a lower-is-better metric and cannot be weighted",
                    name
                )));
            }
        }

        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ReleaseError::weights(format!(
                "weights must sum to 1.0, got {:.4}",
                sum
            )));
        }

        Ok(MetricsAggregator {
            weights,
            thresholds,
        })
    }

    pub fn weights(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    fn threshold(&self, category: &str) -> &Threshold {
        self.thresholds.get(category).unwrap_or_else(|| {
            tracing::debug!(category, "no threshold configured, using default");
            &DEFAULT_THRESHOLD
        })
    }

    /// Aggregate a list of samples. A category reported twice keeps its
    /// last value.
    pub fn aggregate_samples(&self, samples: &[MetricSample]) -> HealthScore {
        let values = samples
            .iter()
            .map(|sample| (sample.category.clone(), sample.value))
            .collect();
        self.aggregate(&values)
    }

    pub fn aggregate(&self, samples: &BTreeMap<String, f64>) -> HealthScore {
        let mut breakdown = BTreeMap::new();

        for (name, value) in samples {
            breakdown.insert(
                name.clone(),
                CategoryScore {
                    value: *value,
                    status: self.threshold(name).classify(*value),
                    warning: None,
                },
            );
        }

        let mut overall = 0.0_f64;
        for (name, weight) in &self.weights {
            let value = match samples.get(name) {
                Some(value) => *value,
                None => {
                    tracing::warn!(category = %name, "weighted metric missing, scoring as 0");
                    breakdown.insert(
                        name.clone(),
                        CategoryScore {
                            value: 0.0,
                            status: self.threshold(name).classify(0.0),
                            warning: Some(format!("no sample reported for '{}'; scored as 0", name)),
                        },
                    );
                    0.0
                }
            };
            overall += weight * normalize(value);
        }

        HealthScore {
            overall: overall.clamp(0.0, 100.0),
            breakdown,
        }
    }
}

fn normalize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Aggregate `samples` with `weights` using the built-in thresholds.
pub fn aggregate(
    samples: &BTreeMap<String, f64>,
    weights: &BTreeMap<String, f64>,
) -> Result<HealthScore> {
    let aggregator = MetricsAggregator::new(weights.clone(), default_thresholds())?;
    Ok(aggregator.aggregate(samples))
}
