//! Metric kinds and series/column identity.

use std::fmt;
use std::str::FromStr;

use pd_core::{Real, ThreadCount};
use pd_data::Measurement;
use serde::Serialize;

use crate::error::AnalysisError;

/// Which timing of a run a series plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Wall clock including I/O and setup.
    EndToEnd,
    /// Timed region of the algorithm only.
    Algorithm,
}

impl MetricKind {
    pub const ALL: [MetricKind; 2] = [MetricKind::EndToEnd, MetricKind::Algorithm];

    pub fn seconds(self, record: &Measurement) -> Real {
        match self {
            MetricKind::EndToEnd => record.end_to_end_seconds(),
            MetricKind::Algorithm => record.algorithm_seconds(),
        }
    }

    fn id_prefix(self) -> &'static str {
        match self {
            MetricKind::EndToEnd => "e2e_",
            MetricKind::Algorithm => "alg_",
        }
    }

    fn label_prefix(self) -> &'static str {
        match self {
            MetricKind::EndToEnd => "E2E ",
            MetricKind::Algorithm => "ALG ",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MetricKind::EndToEnd => "e2e",
            MetricKind::Algorithm => "alg",
        })
    }
}

impl FromStr for MetricKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "e2e" | "end-to-end" | "end_to_end" => Ok(MetricKind::EndToEnd),
            "alg" | "algorithm" => Ok(MetricKind::Algorithm),
            other => Err(AnalysisError::UnknownMetricKind(other.to_string())),
        }
    }
}

/// Identity of a pivot table value column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `"e2e_{p}_"` or `"alg_{p}_"`.
pub fn column_id(thread_count: ThreadCount, metric: MetricKind) -> ColumnId {
    ColumnId(format!("{}{}_", metric.id_prefix(), thread_count))
}

/// `"E2E P {p} "` or `"ALG P {p} "`.
pub fn column_label(thread_count: ThreadCount, metric: MetricKind) -> String {
    format!("{}P {} ", metric.label_prefix(), thread_count)
}

/// The approach or machine a comparison series belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesScope {
    pub id: String,
    pub label: String,
}

/// One selectable plotted line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub thread_count: ThreadCount,
    pub metric: MetricKind,
    pub scope: Option<SeriesScope>,
}

impl SeriesKey {
    pub fn new(thread_count: ThreadCount, metric: MetricKind) -> Self {
        Self {
            thread_count,
            metric,
            scope: None,
        }
    }

    pub fn scoped(
        thread_count: ThreadCount,
        metric: MetricKind,
        scope_id: impl Into<String>,
        scope_label: impl Into<String>,
    ) -> Self {
        Self {
            thread_count,
            metric,
            scope: Some(SeriesScope {
                id: scope_id.into(),
                label: scope_label.into(),
            }),
        }
    }

    /// Unscoped keys use the bare [`column_id`]; scoped keys prefix
    /// `"{scope}:"` so equal thread counts of different owners stay apart.
    pub fn column_id(&self) -> ColumnId {
        let bare = column_id(self.thread_count, self.metric);
        match &self.scope {
            None => bare,
            Some(scope) => ColumnId(format!("{}:{}", scope.id, bare)),
        }
    }

    pub fn label(&self) -> String {
        let bare = column_label(self.thread_count, self.metric);
        match &self.scope {
            None => bare,
            Some(scope) => format!("{} {}", scope.label, bare),
        }
    }
}
