//! pd-analysis: aggregation engine, pivot tables and chart projection.
//!
//! Everything here is synchronous and pure over its inputs. Raw
//! measurements flow through [`aggregate`] into per-series maps, are joined
//! into a [`pivot::PivotTable`], and projected for drawing by [`chart`].

pub mod advisory;
pub mod aggregate;
pub mod chart;
pub mod error;
pub mod metric;
pub mod pivot;
pub mod render;

pub use advisory::{AdvisoryFlags, assess};
pub use aggregate::{
    AggregateMap, SeriesMetrics, SizeAverages, SpeedupAdvisory, SpeedupGap, SpeedupReport,
    average_by_size, average_counter_by_size, average_speedup, series_metrics,
};
pub use chart::{
    AxisOptions, ChartKind, ChartOptions, MetricTables, RenderableTable, select_view,
};
pub use error::{AnalysisError, AnalysisResult};
pub use metric::{ColumnId, MetricKind, SeriesKey, SeriesScope, column_id, column_label};
pub use pivot::{Column, PivotTable};
pub use render::{
    ChartRenderer, ChartSurface, CsvRenderer, JsonRenderer, RenderReceipt, TextTableRenderer,
};
