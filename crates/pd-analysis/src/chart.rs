//! Chart projection: which table to draw and with which options.

use std::fmt;
use std::str::FromStr;

use pd_core::Real;
use pd_data::{AxisDef, ChartOptionsDef};
use serde::Serialize;

use crate::aggregate::SeriesMetrics;
use crate::error::AnalysisError;
use crate::metric::{ColumnId, SeriesKey};
use crate::pivot::{Column, PivotTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    ExecutionTime,
    Speedup,
    /// Offered for selection but never populated.
    KarpFlatt,
    /// Mean of one hardware performance counter.
    PerfCounter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::ExecutionTime,
        ChartKind::Speedup,
        ChartKind::KarpFlatt,
        ChartKind::PerfCounter,
    ];

    /// Title-case name used in axis titles.
    pub fn title_name(self) -> &'static str {
        match self {
            ChartKind::ExecutionTime => "Execution Time",
            ChartKind::Speedup => "Speedup",
            ChartKind::KarpFlatt => "Karp Flatt",
            ChartKind::PerfCounter => "Performance Counter",
        }
    }

    /// Vertical axis title for the mean statistic, with units where defined.
    pub fn mean_axis_title(self) -> String {
        match self {
            ChartKind::ExecutionTime => format!("Mean of {} (s)", self.title_name()),
            _ => format!("Mean of {}", self.title_name()),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartKind::ExecutionTime => "execution-time",
            ChartKind::Speedup => "speedup",
            ChartKind::KarpFlatt => "karp-flatt",
            ChartKind::PerfCounter => "perf-counter",
        })
    }
}

impl FromStr for ChartKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "execution-time" | "executiontime" | "timeseries" | "time" => {
                Ok(ChartKind::ExecutionTime)
            }
            "speedup" => Ok(ChartKind::Speedup),
            "karp-flatt" | "karpflatt" => Ok(ChartKind::KarpFlatt),
            "perf-counter" | "counter" | "perf" => Ok(ChartKind::PerfCounter),
            _ => Err(AnalysisError::UnknownChartKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AxisOptions {
    pub title: Option<String>,
    pub log_scale: Option<bool>,
}

impl AxisOptions {
    fn merge(&mut self, patch: &AxisOptions) {
        if let Some(title) = &patch.title {
            self.title = Some(title.clone());
        }
        if let Some(log_scale) = patch.log_scale {
            self.log_scale = Some(log_scale);
        }
    }
}

impl From<&AxisDef> for AxisOptions {
    fn from(def: &AxisDef) -> Self {
        Self {
            title: def.title.clone(),
            log_scale: def.log_scale,
        }
    }
}

/// Recognized chart options. `None` means "not set here".
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartOptions {
    pub title: Option<String>,
    pub h_axis: AxisOptions,
    pub v_axis: AxisOptions,
    pub points_visible: Option<bool>,
    pub point_shape: Option<String>,
}

impl ChartOptions {
    /// Options every chart starts from: circles on a log-scale size axis.
    pub fn base() -> Self {
        Self {
            title: None,
            h_axis: AxisOptions {
                title: None,
                log_scale: Some(true),
            },
            v_axis: AxisOptions {
                title: None,
                log_scale: Some(false),
            },
            points_visible: Some(true),
            point_shape: Some("circle".to_string()),
        }
    }

    /// Static title and axis mapping for a chart kind.
    pub fn preset(kind: ChartKind) -> Self {
        let (title, v_title) = match kind {
            ChartKind::ExecutionTime => ("Problem size vs. Execution time", "Execution time"),
            ChartKind::Speedup => ("Problem size vs. Speedup", "Speedup"),
            ChartKind::KarpFlatt => (
                "Problem size vs. Karp Flatt coefficient",
                "Karp flatt coefficient",
            ),
            ChartKind::PerfCounter => (
                "Problem size vs. Performance counter",
                "Performance counter",
            ),
        };
        Self {
            title: Some(title.to_string()),
            h_axis: AxisOptions {
                title: Some("Problem size".to_string()),
                log_scale: None,
            },
            v_axis: AxisOptions {
                title: Some(v_title.to_string()),
                log_scale: None,
            },
            points_visible: None,
            point_shape: None,
        }
    }

    /// Additive merge: fields set in `patch` overwrite, all others are kept.
    pub fn merge(&mut self, patch: &ChartOptions) {
        if let Some(title) = &patch.title {
            self.title = Some(title.clone());
        }
        self.h_axis.merge(&patch.h_axis);
        self.v_axis.merge(&patch.v_axis);
        if let Some(points_visible) = patch.points_visible {
            self.points_visible = Some(points_visible);
        }
        if let Some(shape) = &patch.point_shape {
            self.point_shape = Some(shape.clone());
        }
    }

    pub fn merged(mut self, patch: &ChartOptions) -> Self {
        self.merge(patch);
        self
    }

    /// Merges the preset of `kind` and titles the vertical axis with the
    /// mean statistic.
    pub fn apply_preset(&mut self, kind: ChartKind) {
        self.merge(&ChartOptions::preset(kind));
        self.v_axis.title = Some(kind.mean_axis_title());
    }
}

impl From<&ChartOptionsDef> for ChartOptions {
    fn from(def: &ChartOptionsDef) -> Self {
        Self {
            title: def.title.clone(),
            h_axis: AxisOptions::from(&def.h_axis),
            v_axis: AxisOptions::from(&def.v_axis),
            points_visible: def.points_visible,
            point_shape: def.point_shape.clone(),
        }
    }
}

/// One pivot table per chart kind. The timing tables are kept in step by
/// series; the counter table is rebuilt whole by its owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTables {
    pub execution_time: PivotTable,
    pub speedup: PivotTable,
    pub karp_flatt: PivotTable,
    pub perf_counter: PivotTable,
}

impl MetricTables {
    pub fn table(&self, kind: ChartKind) -> &PivotTable {
        match kind {
            ChartKind::ExecutionTime => &self.execution_time,
            ChartKind::Speedup => &self.speedup,
            ChartKind::KarpFlatt => &self.karp_flatt,
            ChartKind::PerfCounter => &self.perf_counter,
        }
    }

    pub fn add_series(&mut self, key: &SeriesKey, metrics: &SeriesMetrics) {
        self.execution_time
            .add_series(key, metrics.execution_time.get(key.metric));
        self.speedup.add_series(key, metrics.speedup.get(key.metric));
    }

    pub fn remove_series(&mut self, key: &SeriesKey) {
        self.execution_time.remove_series(key);
        self.speedup.remove_series(key);
        self.karp_flatt.remove_series(key);
    }

    pub fn clear(&mut self) {
        self.execution_time.clear();
        self.speedup.clear();
        self.karp_flatt.clear();
        self.perf_counter.clear();
    }
}

/// A table ready for drawing. Row cells include the key in position 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderableTable {
    pub kind: ChartKind,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Option<Real>>>,
    pub placeholder: bool,
}

impl RenderableTable {
    /// The "nothing selected" table: columns `d1`, `d2`, one zero row.
    pub fn placeholder(kind: ChartKind) -> Self {
        Self {
            kind,
            columns: vec![
                Column {
                    id: ColumnId::new("d1"),
                    label: "d1".to_string(),
                },
                Column {
                    id: ColumnId::new("d2"),
                    label: "d2".to_string(),
                },
            ],
            rows: vec![vec![Some(0.0), Some(0.0)]],
            placeholder: true,
        }
    }

    pub fn series_count(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }

    pub fn to_csv(&self) -> String {
        let mut out = self
            .columns
            .iter()
            .map(|c| escape_csv(c.label.trim()))
            .collect::<Vec<_>>()
            .join(",");
        out.push('\n');
        for row in &self.rows {
            let line = row
                .iter()
                .map(|cell| cell.map(|v| v.to_string()).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Projects `table` for drawing, or the placeholder when no series is active.
pub fn select_view(table: &PivotTable, kind: ChartKind) -> RenderableTable {
    if table.column_count() < 2 {
        return RenderableTable::placeholder(kind);
    }

    let mut columns = Vec::with_capacity(table.column_count());
    columns.push(Column {
        id: ColumnId::new("size"),
        label: table.key_label().to_string(),
    });
    columns.extend(table.columns().iter().cloned());

    let rows = table
        .rows()
        .map(|(size, cells)| {
            let mut row = Vec::with_capacity(cells.len() + 1);
            row.push(Some(size.get()));
            row.extend_from_slice(cells);
            row
        })
        .collect();

    RenderableTable {
        kind,
        columns,
        rows,
        placeholder: false,
    }
}
