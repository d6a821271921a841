//! Per-size averaging and speedup computation.

use std::collections::BTreeMap;

use pd_core::{Mean, ProblemSize, Real, ThreadCount, as_ratio, s, speedup};
use pd_data::{Measurement, PerfCounters, PerfRecord};
use tracing::warn;

use crate::error::{AnalysisError, AnalysisResult};
use crate::metric::MetricKind;

/// Problem size to averaged value.
pub type AggregateMap = BTreeMap<ProblemSize, Real>;

/// Mean end-to-end and algorithm time per problem size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeAverages {
    pub end_to_end: AggregateMap,
    pub algorithm: AggregateMap,
}

impl SizeAverages {
    pub fn get(&self, metric: MetricKind) -> &AggregateMap {
        match metric {
            MetricKind::EndToEnd => &self.end_to_end,
            MetricKind::Algorithm => &self.algorithm,
        }
    }
}

/// Groups records by problem size and averages both timings per group.
///
/// Only sizes that occur in `records` appear in the result.
pub fn average_by_size<'a, I>(records: I) -> SizeAverages
where
    I: IntoIterator<Item = &'a Measurement>,
{
    let mut groups: BTreeMap<ProblemSize, (Mean, Mean)> = BTreeMap::new();
    for record in records {
        let (e2e, alg) = groups.entry(record.problem_size).or_default();
        e2e.push(record.end_to_end_seconds());
        alg.push(record.algorithm_seconds());
    }

    let mut averages = SizeAverages::default();
    for (size, (e2e, alg)) in groups {
        // Groups only exist for present records, so both means are defined.
        if let (Some(e2e), Some(alg)) = (e2e.value(), alg.value()) {
            averages.end_to_end.insert(size, e2e);
            averages.algorithm.insert(size, alg);
        }
    }
    averages
}

/// Mean of one performance counter per problem size.
///
/// Records that did not sample the counter are skipped, so a size whose
/// records all lack it does not appear.
pub fn average_counter_by_size<'a, I>(records: I, counter: &str) -> AnalysisResult<AggregateMap>
where
    I: IntoIterator<Item = &'a PerfRecord>,
{
    if PerfCounters::canonical_name(counter).is_none() {
        return Err(AnalysisError::UnknownCounter(counter.to_string()));
    }

    let mut groups: BTreeMap<ProblemSize, Mean> = BTreeMap::new();
    for record in records {
        if let Some(Some(value)) = record.counters.value(counter) {
            groups.entry(record.problem_size).or_default().push(value);
        }
    }
    Ok(groups
        .into_iter()
        .filter_map(|(size, mean)| mean.value().map(|v| (size, v)))
        .collect())
}

/// Why a size has no speedup entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedupGap {
    /// No serial run at this size.
    MissingBaseline,
    /// Parallel time averaged to zero; the ratio is not finite.
    NonFiniteRatio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedupAdvisory {
    pub problem_size: ProblemSize,
    pub metric: MetricKind,
    pub gap: SpeedupGap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedupReport {
    pub end_to_end: AggregateMap,
    pub algorithm: AggregateMap,
    pub advisories: Vec<SpeedupAdvisory>,
}

impl SpeedupReport {
    pub fn get(&self, metric: MetricKind) -> &AggregateMap {
        match metric {
            MetricKind::EndToEnd => &self.end_to_end,
            MetricKind::Algorithm => &self.algorithm,
        }
    }

    pub fn has_missing_baseline(&self) -> bool {
        self.advisories
            .iter()
            .any(|a| a.gap == SpeedupGap::MissingBaseline)
    }
}

/// Serial-over-parallel time ratio for every size of `records`.
pub fn average_speedup<'a, I, J>(records: I, serial_records: J) -> SpeedupReport
where
    I: IntoIterator<Item = &'a Measurement>,
    J: IntoIterator<Item = &'a Measurement>,
{
    speedup_from_averages(&average_by_size(records), &average_by_size(serial_records))
}

pub fn speedup_from_averages(parallel: &SizeAverages, serial: &SizeAverages) -> SpeedupReport {
    let mut report = SpeedupReport::default();
    for metric in MetricKind::ALL {
        let baseline = serial.get(metric);
        let mut ratios = AggregateMap::new();
        for (&size, &time) in parallel.get(metric) {
            let gap = match baseline.get(&size) {
                None => Some(SpeedupGap::MissingBaseline),
                Some(&serial_time) => {
                    let ratio = as_ratio(speedup(s(serial_time), s(time)));
                    if ratio.is_finite() {
                        ratios.insert(size, ratio);
                        None
                    } else {
                        Some(SpeedupGap::NonFiniteRatio)
                    }
                }
            };
            if let Some(gap) = gap {
                warn!(problem_size = %size, %metric, ?gap, "omitting speedup entry");
                report.advisories.push(SpeedupAdvisory {
                    problem_size: size,
                    metric,
                    gap,
                });
            }
        }
        match metric {
            MetricKind::EndToEnd => report.end_to_end = ratios,
            MetricKind::Algorithm => report.algorithm = ratios,
        }
    }
    report
}

/// Execution time and speedup of one thread count, with the serial
/// (`p = 0`) records of the same set as baseline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesMetrics {
    pub execution_time: SizeAverages,
    pub speedup: SpeedupReport,
}

pub fn series_metrics(records: &[Measurement], thread_count: ThreadCount) -> SeriesMetrics {
    let parallel = records.iter().filter(|r| r.thread_count == thread_count);
    let serial = records.iter().filter(|r| r.thread_count.is_serial());

    let execution_time = average_by_size(parallel);
    let speedup = speedup_from_averages(&execution_time, &average_by_size(serial));
    SeriesMetrics {
        execution_time,
        speedup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::{Tolerances, nearly_equal};

    fn rec(n: f64, p: u32, run: u32, alg: f64, e2e: f64) -> Measurement {
        Measurement::from_upload(ProblemSize::new(n).unwrap(), ThreadCount(p), run, alg, e2e)
    }

    fn size(n: f64) -> ProblemSize {
        ProblemSize::new(n).unwrap()
    }

    #[test]
    fn single_record_group_is_its_own_mean() {
        let records = [rec(100.0, 4, 1, 0.3, 0.4)];
        let avg = average_by_size(&records);
        assert_eq!(avg.algorithm.get(&size(100.0)), Some(&0.3));
        assert_eq!(avg.end_to_end.get(&size(100.0)), Some(&0.4));
        assert_eq!(avg.algorithm.len(), 1);
    }

    #[test]
    fn nanosecond_remainders_are_folded_in() {
        let mut a = rec(10.0, 2, 1, 1.0, 2.0);
        a.alg_ns = 500_000_000.0;
        let b = rec(10.0, 2, 2, 2.0, 2.0);
        let avg = average_by_size([&a, &b]);
        let tol = Tolerances::default();
        assert!(nearly_equal(avg.algorithm[&size(10.0)], 1.75, tol));
        assert!(nearly_equal(avg.end_to_end[&size(10.0)], 2.0, tol));
    }

    fn perf(n: f64, p: u32, cycles: Option<f64>) -> PerfRecord {
        PerfRecord {
            problem_size: size(n),
            thread_count: ThreadCount(p),
            run_id: 1,
            approach_id: None,
            machine_id: None,
            counters: PerfCounters {
                cycles,
                ..Default::default()
            },
        }
    }

    #[test]
    fn counter_means_skip_unsampled_records() {
        let records = [
            perf(100.0, 4, Some(1000.0)),
            perf(100.0, 4, Some(3000.0)),
            perf(100.0, 4, None),
            perf(200.0, 4, None),
        ];
        let means = average_counter_by_size(&records, "cycles").unwrap();
        assert_eq!(means.len(), 1);
        assert_eq!(means[&size(100.0)], 2000.0);
    }

    #[test]
    fn unknown_counter_is_an_error() {
        let records = [perf(100.0, 4, Some(1.0))];
        assert!(matches!(
            average_counter_by_size(&records, "flops"),
            Err(AnalysisError::UnknownCounter(name)) if name == "flops"
        ));
    }

    #[test]
    fn worked_scenario_speedup() {
        let records = [rec(100.0, 0, 1, 1.0, 1.2), rec(100.0, 4, 1, 0.3, 0.4)];
        let metrics = series_metrics(&records, ThreadCount(4));

        assert_eq!(metrics.execution_time.algorithm[&size(100.0)], 0.3);
        assert_eq!(metrics.execution_time.end_to_end[&size(100.0)], 0.4);

        let tol = Tolerances { abs: 1e-9, rel: 1e-9 };
        assert!(nearly_equal(metrics.speedup.algorithm[&size(100.0)], 1.0 / 0.3, tol));
        assert!(nearly_equal(metrics.speedup.end_to_end[&size(100.0)], 3.0, tol));
        assert!(metrics.speedup.advisories.is_empty());
    }

    #[test]
    fn missing_baseline_sizes_are_omitted_and_reported() {
        let parallel = [rec(100.0, 4, 1, 0.3, 0.4), rec(200.0, 4, 1, 0.6, 0.8)];
        let serial = [rec(100.0, 0, 1, 1.0, 1.2)];
        let report = average_speedup(&parallel, &serial);

        assert!(report.algorithm.contains_key(&size(100.0)));
        assert!(!report.algorithm.contains_key(&size(200.0)));
        assert!(!report.end_to_end.contains_key(&size(200.0)));
        assert!(report.has_missing_baseline());
        assert_eq!(report.advisories.len(), 2);
        assert!(report.algorithm.values().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_parallel_time_is_not_a_speedup() {
        let parallel = [rec(100.0, 4, 1, 0.0, 0.4)];
        let serial = [rec(100.0, 0, 1, 1.0, 1.2)];
        let report = average_speedup(&parallel, &serial);
        assert!(report.algorithm.is_empty());
        assert_eq!(report.end_to_end.len(), 1);
        assert_eq!(report.advisories[0].gap, SpeedupGap::NonFiniteRatio);
    }

    #[test]
    fn empty_input_yields_empty_maps() {
        let avg = average_by_size(std::iter::empty());
        assert!(avg.algorithm.is_empty());
        let report = average_speedup(std::iter::empty(), std::iter::empty());
        assert_eq!(report, SpeedupReport::default());
    }
}
