//! Dashboard configuration file (YAML).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub thresholds: WarningThresholds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_root: Option<PathBuf>,
    #[serde(default)]
    pub chart: ChartOptionsDef,
}

/// Minimum coverage an upload should have before its charts are trusted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WarningThresholds {
    /// Distinct run ids.
    pub run_threshold: usize,
    /// Distinct problem sizes.
    pub n_threshold: usize,
    /// Distinct thread counts.
    pub p_threshold: usize,
    pub require_serial_baseline: bool,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            run_threshold: 2,
            n_threshold: 3,
            p_threshold: 2,
            require_serial_baseline: true,
        }
    }
}

/// Persisted chart option overrides. Unset fields leave the preset alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChartOptionsDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub h_axis: AxisDef,
    #[serde(default)]
    pub v_axis: AxisDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_shape: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AxisDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_scale: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_takes_defaults() {
        let yaml = "thresholds:\n  n_threshold: 5\n";
        let config: DashboardConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.thresholds.n_threshold, 5);
        assert_eq!(config.thresholds.run_threshold, 2);
        assert!(config.thresholds.require_serial_baseline);
        assert!(config.store_root.is_none());
        assert_eq!(config.chart, ChartOptionsDef::default());
    }

    #[test]
    fn chart_overrides_parse() {
        let yaml = "chart:\n  v_axis:\n    log_scale: true\n  point_shape: square\n";
        let config: DashboardConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.chart.v_axis.log_scale, Some(true));
        assert_eq!(config.chart.point_shape.as_deref(), Some("square"));
        assert_eq!(config.chart.h_axis.title, None);
    }
}
