use crate::error::Result;
use crate::files::write_atomic;
use crate::metrics::aggregator::{HealthScore, MetricSample};
use crate::metrics::badge::Badge;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Raw metric values produced by the CI pipeline for one commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub commit_hash: String,
    pub branch: String,
    #[serde(default)]
    pub metrics: ReportMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetrics {
    #[serde(default)]
    pub code_quality: CodeQuality,
    #[serde(default)]
    pub performance: Performance,
    #[serde(default)]
    pub security: Security,
    #[serde(default)]
    pub documentation: Documentation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeQuality {
    pub coverage: Option<f64>,
    pub complexity: Option<f64>,
    pub maintainability: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Seconds
    pub simulation_time: Option<f64>,
    /// Megabytes
    pub memory_usage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub score: Option<f64>,
    pub vulnerabilities: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Documentation {
    pub coverage: Option<f64>,
}

impl HealthReport {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Reported values as typed samples, skipping absent ones.
    pub fn metric_samples(&self) -> Vec<MetricSample> {
        let m = &self.metrics;
        [
            ("coverage", m.code_quality.coverage, "%"),
            ("complexity", m.code_quality.complexity, ""),
            ("maintainability", m.code_quality.maintainability, ""),
            ("simulation_time", m.performance.simulation_time, "s"),
            ("memory_usage", m.performance.memory_usage, "MB"),
            ("security", m.security.score, ""),
            ("vulnerabilities", m.security.vulnerabilities, ""),
            ("documentation", m.documentation.coverage, "%"),
        ]
        .into_iter()
        .filter_map(|(name, value, unit)| {
            value.map(|v| {
                let sample = MetricSample::new(name, v);
                if unit.is_empty() {
                    sample
                } else {
                    sample.with_unit(unit)
                }
            })
        })
        .collect()
    }

    /// Flatten reported values into aggregator samples, skipping absent ones.
    pub fn samples(&self) -> BTreeMap<String, f64> {
        self.metric_samples()
            .into_iter()
            .map(|sample| (sample.category, sample.value))
            .collect()
    }
}

/// Report plus its aggregated score, handed to notification collaborators
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedReport {
    #[serde(flatten)]
    pub report: HealthReport,
    pub score: HealthScore,
    pub badge: Badge,
}

impl ConsolidatedReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, &json)
    }
}
