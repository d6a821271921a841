//! Store fetches behind a comparison panel refresh.
//!
//! A refresh issues its four fetches concurrently on scoped worker threads
//! and feeds the results back to the panel over a channel, in whatever
//! order they complete. The panel binds once all four have arrived.

use std::fmt;
use std::sync::mpsc;
use std::thread;

use pd_data::{Approach, Machine, Measurement, PerfRecord};
use pd_store::{MeasurementStore, StoreError};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::panel::{ComparisonPanel, FetchProgress, PanelFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Numbers,
    Perfs,
    Approaches,
    Machines,
}

impl FetchKind {
    pub const ALL: [FetchKind; 4] = [
        FetchKind::Numbers,
        FetchKind::Perfs,
        FetchKind::Approaches,
        FetchKind::Machines,
    ];
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchKind::Numbers => "numbers",
            FetchKind::Perfs => "perfs",
            FetchKind::Approaches => "approaches",
            FetchKind::Machines => "machines",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum FetchPayload {
    Numbers(Vec<Measurement>),
    Perfs(Vec<PerfRecord>),
    Approaches(Vec<Approach>),
    Machines(Vec<Machine>),
}

impl FetchPayload {
    pub fn kind(&self) -> FetchKind {
        match self {
            FetchPayload::Numbers(_) => FetchKind::Numbers,
            FetchPayload::Perfs(_) => FetchKind::Perfs,
            FetchPayload::Approaches(_) => FetchKind::Approaches,
            FetchPayload::Machines(_) => FetchKind::Machines,
        }
    }
}

/// Runs one of the four refresh queries against `store`.
pub fn fetch<S>(store: &S, kind: FetchKind, filter: &PanelFilter) -> Result<FetchPayload, StoreError>
where
    S: MeasurementStore + ?Sized,
{
    let problem = &filter.problem;
    let architecture = filter.architecture;
    Ok(match kind {
        FetchKind::Numbers => FetchPayload::Numbers(store.numbers_by_problem(problem, architecture)?),
        FetchKind::Perfs => FetchPayload::Perfs(store.perfs_by_problem(problem, architecture)?),
        FetchKind::Approaches => {
            FetchPayload::Approaches(store.approaches_by_problem(problem, architecture)?)
        }
        FetchKind::Machines => {
            FetchPayload::Machines(store.machines_by_problem(problem, architecture)?)
        }
    })
}

/// Refreshes `panel` for `filter` from `store`.
///
/// On an upstream failure the panel keeps its previous tables and the
/// error is returned once every worker has reported.
pub fn refresh_from_store<S>(
    panel: &mut ComparisonPanel,
    store: &S,
    filter: PanelFilter,
) -> AppResult<FetchProgress>
where
    S: MeasurementStore + ?Sized,
{
    let ticket = panel.begin_refresh(filter.clone());
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for kind in FetchKind::ALL {
            let tx = tx.clone();
            let filter = &filter;
            scope.spawn(move || {
                let result = fetch(store, kind, filter);
                // The receiver outlives every worker inside the scope.
                let _ = tx.send((kind, result));
            });
        }
        drop(tx);

        let mut outcome = Ok(FetchProgress::Stale);
        for (kind, result) in rx {
            debug!(%kind, ok = result.is_ok(), "fetch completed");
            match panel.complete_fetch(ticket, kind, result) {
                Ok(progress) => {
                    if progress == FetchProgress::Bound {
                        info!(problem = %filter.problem, "panel refreshed");
                    }
                    if outcome.is_ok() {
                        outcome = Ok(progress);
                    }
                }
                Err(err) => outcome = Err(err),
            }
        }
        outcome
    })
}
