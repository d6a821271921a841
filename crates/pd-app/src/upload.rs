//! Upload service: turns an upload file into ready-to-draw chart tables.

use std::path::Path;

use pd_analysis::{
    AdvisoryFlags, ChartKind, MetricKind, MetricTables, RenderableTable, SeriesKey,
    SpeedupAdvisory, assess, select_view, series_metrics,
};
use pd_core::ThreadCount;
use pd_data::{Measurement, ParseError, ParsedUpload, WarningThresholds, load_upload};
use tracing::info;

use crate::error::AppResult;
use crate::query::distinct_thread_counts;

/// Everything derived from one upload.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub records: Vec<Measurement>,
    pub parse_errors: Vec<ParseError>,
    pub flags: AdvisoryFlags,
    pub thread_counts: Vec<ThreadCount>,
    pub tables: MetricTables,
    pub speedup_advisories: Vec<SpeedupAdvisory>,
}

impl UploadReport {
    pub fn view(&self, kind: ChartKind) -> RenderableTable {
        select_view(self.tables.table(kind), kind)
    }
}

/// Plots every thread count of the upload for both metric kinds, using the
/// upload's own `p = 0` runs as the serial baseline.
pub fn analyze_upload(upload: ParsedUpload, thresholds: &WarningThresholds) -> UploadReport {
    let ParsedUpload { records, errors } = upload;
    let flags = assess(&records, thresholds);
    let thread_counts = distinct_thread_counts(&records);

    let mut tables = MetricTables::default();
    let mut speedup_advisories = Vec::new();
    for &p in &thread_counts {
        let metrics = series_metrics(&records, p);
        speedup_advisories.extend(metrics.speedup.advisories.iter().copied());
        for metric in MetricKind::ALL {
            tables.add_series(&SeriesKey::new(p, metric), &metrics);
        }
    }

    info!(
        records = records.len(),
        skipped = errors.len(),
        series = thread_counts.len() * MetricKind::ALL.len(),
        "upload analyzed"
    );
    UploadReport {
        records,
        parse_errors: errors,
        flags,
        thread_counts,
        tables,
        speedup_advisories,
    }
}

pub fn load_upload_report(path: &Path, thresholds: &WarningThresholds) -> AppResult<UploadReport> {
    let upload = load_upload(path)?;
    Ok(analyze_upload(upload, thresholds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::ProblemSize;
    use pd_data::parse_upload;

    #[test]
    fn worked_upload_scenario() {
        let upload = parse_upload("100,0,1,1.0,1.2\n100,4,1,0.3,0.4\n");
        let report = analyze_upload(upload, &WarningThresholds::default());

        assert!(report.parse_errors.is_empty());
        assert_eq!(report.thread_counts, vec![ThreadCount(0), ThreadCount(4)]);

        let exec = report.tables.table(ChartKind::ExecutionTime);
        let alg4 = SeriesKey::new(ThreadCount(4), MetricKind::Algorithm).column_id();
        let e2e4 = SeriesKey::new(ThreadCount(4), MetricKind::EndToEnd).column_id();
        let n = ProblemSize::new(100.0).unwrap();
        assert_eq!(exec.value(n, &alg4), Some(0.3));
        assert_eq!(exec.value(n, &e2e4), Some(0.4));

        let speedup = report.tables.table(ChartKind::Speedup);
        let s = speedup.value(n, &alg4).unwrap();
        assert!((s - 1.0 / 0.3).abs() < 1e-9);

        assert!(report.flags.low_runs);
        assert!(!report.flags.no_serial);
    }

    #[test]
    fn signed_zero_sizes_share_one_row() {
        let upload = parse_upload("0,4,1,1.0,1.0\n-0,4,2,3.0,3.0\n");
        let report = analyze_upload(upload, &WarningThresholds::default());

        let view = report.view(ChartKind::ExecutionTime);
        assert_eq!(view.rows.len(), 1);
        let alg4 = SeriesKey::new(ThreadCount(4), MetricKind::Algorithm).column_id();
        let exec = report.tables.table(ChartKind::ExecutionTime);
        assert_eq!(exec.value(ProblemSize::new(0.0).unwrap(), &alg4), Some(2.0));
    }

    #[test]
    fn upload_without_serial_runs_has_no_speedup() {
        let upload = parse_upload("100,4,1,0.3,0.4\nbogus line\n");
        let report = analyze_upload(upload, &WarningThresholds::default());

        assert_eq!(report.parse_errors.len(), 1);
        assert!(report.flags.no_serial);
        assert!(report.view(ChartKind::Speedup).rows.is_empty());
        assert!(!report.view(ChartKind::ExecutionTime).placeholder);
        assert!(!report.speedup_advisories.is_empty());
    }
}
