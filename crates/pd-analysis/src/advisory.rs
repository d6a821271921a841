//! Coverage advisories for an uploaded data set.

use std::collections::BTreeSet;

use pd_data::{Measurement, WarningThresholds};
use serde::Serialize;
use tracing::info;

/// Non-fatal warnings; processing continues whatever they say.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdvisoryFlags {
    pub low_runs: bool,
    pub low_n: bool,
    pub low_p: bool,
    pub no_serial: bool,
}

impl AdvisoryFlags {
    pub fn any(&self) -> bool {
        self.low_runs || self.low_n || self.low_p || self.no_serial
    }

    pub fn messages(&self, thresholds: &WarningThresholds) -> Vec<String> {
        let mut out = Vec::new();
        if self.low_runs {
            out.push(format!(
                "fewer than {} distinct runs; averages may be noisy",
                thresholds.run_threshold
            ));
        }
        if self.low_n {
            out.push(format!(
                "fewer than {} distinct problem sizes",
                thresholds.n_threshold
            ));
        }
        if self.low_p {
            out.push(format!(
                "fewer than {} distinct thread counts",
                thresholds.p_threshold
            ));
        }
        if self.no_serial {
            out.push("no serial (p = 0) runs; speedup cannot be computed".to_string());
        }
        out
    }
}

pub fn assess(records: &[Measurement], thresholds: &WarningThresholds) -> AdvisoryFlags {
    let runs: BTreeSet<u32> = records.iter().map(|r| r.run_id).collect();
    let sizes: BTreeSet<_> = records.iter().map(|r| r.problem_size).collect();
    let threads: BTreeSet<_> = records.iter().map(|r| r.thread_count).collect();

    let flags = AdvisoryFlags {
        low_runs: runs.len() < thresholds.run_threshold,
        low_n: sizes.len() < thresholds.n_threshold,
        low_p: threads.len() < thresholds.p_threshold,
        no_serial: thresholds.require_serial_baseline && !threads.iter().any(|p| p.is_serial()),
    };
    if flags.any() {
        info!(?flags, "data set below coverage thresholds");
    }
    flags
}
