//! Comparison panels: one chart comparing several approaches or machines.
//!
//! A panel moves through three states:
//!
//! - `Empty`: nothing bound yet;
//! - `SeriesSelected`: a refresh for a new filter is in flight;
//! - `DataBound`: the fetched data is bound and series can be toggled.
//!
//! Every refresh carries a [`RefreshTicket`]. Completions for an older ticket
//! are dropped, and the panel binds only once all four fetches for the
//! current ticket have arrived. A failed fetch abandons the refresh and
//! leaves the previously bound tables as they were.

use std::collections::BTreeMap;

use pd_analysis::{
    AnalysisError, ChartKind, ChartOptions, ChartRenderer, ChartSurface, ColumnId, MetricKind,
    MetricTables, RenderReceipt, RenderableTable, SeriesKey, average_counter_by_size,
    select_view, series_metrics,
};
use pd_core::{ApproachId, MachineId, PenvId, ProblemId, ThreadCount};
use pd_data::{Approach, Architecture, Machine, Measurement, PerfCounters, PerfRecord};
use pd_store::StoreError;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::query::{
    approaches_for_machines, distinct_thread_counts, machines_for_approaches,
    penvs_for_approaches,
};
use crate::refresh::{FetchKind, FetchPayload};

/// What a panel compares across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelAxis {
    /// One machine, many approaches.
    #[default]
    ApproachCentric,
    /// One approach, many machines.
    MachineCentric,
}

impl PanelAxis {
    /// `(compared, anchor)` ids of a record owned by `approach` on `machine`.
    fn split_owners<'r>(
        self,
        approach: Option<&'r ApproachId>,
        machine: Option<&'r MachineId>,
    ) -> (Option<&'r str>, Option<&'r str>) {
        let approach = approach.map(ApproachId::as_str);
        let machine = machine.map(MachineId::as_str);
        match self {
            PanelAxis::ApproachCentric => (approach, machine),
            PanelAxis::MachineCentric => (machine, approach),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Empty,
    SeriesSelected,
    DataBound,
}

/// Which slice of the store a panel shows.
///
/// `anchor` is the fixed entity (the machine of an approach-centric panel,
/// the approach of a machine-centric one); `compared` are the entities drawn
/// side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelFilter {
    pub problem: ProblemId,
    pub architecture: Option<Architecture>,
    pub anchor: String,
    pub compared: Vec<String>,
}

impl PanelFilter {
    pub fn new(
        problem: ProblemId,
        anchor: impl Into<String>,
        compared: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            problem,
            architecture: None,
            anchor: anchor.into(),
            compared: compared.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = Some(architecture);
        self
    }
}

/// The user's series choice for one compared entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesChoice {
    pub threads: Vec<ThreadCount>,
    pub plot_e2e: bool,
    pub plot_alg: bool,
}

impl Default for SeriesChoice {
    fn default() -> Self {
        Self {
            threads: Vec::new(),
            plot_e2e: false,
            plot_alg: true,
        }
    }
}

impl SeriesChoice {
    pub fn threads(threads: impl IntoIterator<Item = u32>) -> Self {
        Self {
            threads: threads.into_iter().map(ThreadCount).collect(),
            ..Self::default()
        }
    }

    fn keys(&self, entity: &str, label: &str) -> Vec<SeriesKey> {
        let metrics = [
            (self.plot_e2e, MetricKind::EndToEnd),
            (self.plot_alg, MetricKind::Algorithm),
        ];
        let mut keys = Vec::new();
        for &p in &self.threads {
            for (enabled, metric) in metrics {
                if enabled {
                    keys.push(SeriesKey::scoped(p, metric, entity, label));
                }
            }
        }
        keys
    }
}

/// Series state of one compared entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSelection {
    pub entity: String,
    pub label: String,
    pub available_threads: Vec<ThreadCount>,
    pub choice: SeriesChoice,
    applied: Vec<SeriesKey>,
}

impl SeriesSelection {
    fn new(entity: String, label: String) -> Self {
        Self {
            entity,
            label,
            available_threads: Vec::new(),
            choice: SeriesChoice::default(),
            applied: Vec::new(),
        }
    }

    /// Thread counts whose columns are currently in the tables.
    pub fn applied_threads(&self) -> Vec<ThreadCount> {
        let mut threads: Vec<ThreadCount> = self.applied.iter().map(|k| k.thread_count).collect();
        threads.dedup();
        threads
    }
}

/// Data bound by the last successful refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelCatalog {
    pub numbers: Vec<Measurement>,
    pub perfs: Vec<PerfRecord>,
    pub approaches: Vec<Approach>,
    pub machines: Vec<Machine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

impl RefreshTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// Result of delivering one fetch to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchProgress {
    /// The ticket is not the panel's current refresh; the payload was dropped.
    Stale,
    Waiting { remaining: usize },
    Bound,
}

#[derive(Debug)]
struct PendingRefresh {
    ticket: RefreshTicket,
    filter: PanelFilter,
    numbers: Option<Vec<Measurement>>,
    perfs: Option<Vec<PerfRecord>>,
    approaches: Option<Vec<Approach>>,
    machines: Option<Vec<Machine>>,
}

impl PendingRefresh {
    fn new(ticket: RefreshTicket, filter: PanelFilter) -> Self {
        Self {
            ticket,
            filter,
            numbers: None,
            perfs: None,
            approaches: None,
            machines: None,
        }
    }

    fn store(&mut self, payload: FetchPayload) {
        match payload {
            FetchPayload::Numbers(v) => self.numbers = Some(v),
            FetchPayload::Perfs(v) => self.perfs = Some(v),
            FetchPayload::Approaches(v) => self.approaches = Some(v),
            FetchPayload::Machines(v) => self.machines = Some(v),
        }
    }

    fn remaining(&self) -> usize {
        [
            self.numbers.is_none(),
            self.perfs.is_none(),
            self.approaches.is_none(),
            self.machines.is_none(),
        ]
        .into_iter()
        .filter(|missing| *missing)
        .count()
    }

    fn into_catalog(self) -> (PanelFilter, PanelCatalog) {
        let catalog = PanelCatalog {
            numbers: self.numbers.unwrap_or_default(),
            perfs: self.perfs.unwrap_or_default(),
            approaches: self.approaches.unwrap_or_default(),
            machines: self.machines.unwrap_or_default(),
        };
        (self.filter, catalog)
    }
}

#[derive(Debug)]
pub struct ComparisonPanel {
    axis: PanelAxis,
    state: PanelState,
    filter: Option<PanelFilter>,
    catalog: PanelCatalog,
    selections: BTreeMap<String, SeriesSelection>,
    tables: MetricTables,
    active_chart: ChartKind,
    counter: Option<&'static str>,
    options: ChartOptions,
    generation: u64,
    pending: Option<PendingRefresh>,
}

impl ComparisonPanel {
    pub fn new(axis: PanelAxis) -> Self {
        Self::with_options(axis, ChartOptions::base())
    }

    /// Panel whose charts start from `base` instead of the built-in options.
    pub fn with_options(axis: PanelAxis, base: ChartOptions) -> Self {
        let active_chart = ChartKind::default();
        let mut panel = Self {
            axis,
            state: PanelState::Empty,
            filter: None,
            catalog: PanelCatalog::default(),
            selections: BTreeMap::new(),
            tables: MetricTables::default(),
            active_chart,
            counter: None,
            options: base,
            generation: 0,
            pending: None,
        };
        panel.change_chart(active_chart);
        panel
    }

    pub fn axis(&self) -> PanelAxis {
        self.axis
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Filter of the bound data, if any.
    pub fn filter(&self) -> Option<&PanelFilter> {
        self.filter.as_ref()
    }

    pub fn catalog(&self) -> &PanelCatalog {
        &self.catalog
    }

    pub fn tables(&self) -> &MetricTables {
        &self.tables
    }

    pub fn active_chart(&self) -> ChartKind {
        self.active_chart
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    /// Performance counter plotted by the counter chart.
    pub fn counter(&self) -> Option<&'static str> {
        self.counter
    }

    pub fn selections(&self) -> impl Iterator<Item = &SeriesSelection> {
        self.selections.values()
    }

    pub fn selection(&self, entity: &str) -> Option<&SeriesSelection> {
        self.selections.get(entity)
    }

    pub fn is_refreshing(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a refresh for `filter`, superseding any refresh in flight.
    pub fn begin_refresh(&mut self, filter: PanelFilter) -> RefreshTicket {
        self.generation += 1;
        let ticket = RefreshTicket {
            generation: self.generation,
        };
        if let Some(previous) = &self.pending {
            debug!(
                superseded = previous.ticket.generation,
                generation = ticket.generation,
                "refresh superseded"
            );
        }

        for entity in &filter.compared {
            self.selections
                .entry(entity.clone())
                .or_insert_with(|| SeriesSelection::new(entity.clone(), entity.clone()));
        }
        self.pending = Some(PendingRefresh::new(ticket, filter));
        self.state = PanelState::SeriesSelected;
        ticket
    }

    /// Delivers the result of one fetch issued for `ticket`.
    pub fn complete_fetch(
        &mut self,
        ticket: RefreshTicket,
        kind: FetchKind,
        result: Result<FetchPayload, StoreError>,
    ) -> AppResult<FetchProgress> {
        let current = self.pending.as_ref().map(|p| p.ticket);
        if current != Some(ticket) {
            debug!(%kind, generation = ticket.generation, "stale fetch dropped");
            return Ok(FetchProgress::Stale);
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%kind, error = %err, "fetch failed; keeping previous tables");
                self.abandon_refresh();
                return Err(AppError::UpstreamFetch {
                    kind,
                    message: err.to_string(),
                });
            }
        };

        let Some(pending) = self.pending.as_mut() else {
            return Ok(FetchProgress::Stale);
        };
        pending.store(payload);
        let remaining = pending.remaining();
        if remaining > 0 {
            return Ok(FetchProgress::Waiting { remaining });
        }

        if let Some(pending) = self.pending.take() {
            let (filter, catalog) = pending.into_catalog();
            self.bind(filter, catalog);
        }
        Ok(FetchProgress::Bound)
    }

    fn abandon_refresh(&mut self) {
        self.pending = None;
        let bound: Vec<&String> = self.filter.iter().flat_map(|f| &f.compared).collect();
        self.selections.retain(|entity, _| bound.contains(&entity));
        self.state = if self.filter.is_some() {
            PanelState::DataBound
        } else {
            PanelState::Empty
        };
    }

    /// Binds a completed refresh and rebuilds every table from the current
    /// selections.
    fn bind(&mut self, filter: PanelFilter, catalog: PanelCatalog) {
        let mut selections = BTreeMap::new();
        for entity in &filter.compared {
            let label = self.entity_label(&catalog, entity);
            let available = distinct_thread_counts(
                catalog
                    .numbers
                    .iter()
                    .filter(|r| self.belongs_to(r, &filter, entity)),
            );

            let mut selection = self
                .selections
                .remove(entity)
                .unwrap_or_else(|| SeriesSelection::new(entity.clone(), label.clone()));
            selection.label = label;
            selection.choice.threads.retain(|p| available.contains(p));
            selection.available_threads = available;
            selection.applied.clear();
            selections.insert(entity.clone(), selection);
        }

        self.filter = Some(filter);
        self.catalog = catalog;
        self.selections = selections;
        self.tables.clear();

        let entities: Vec<String> = self.selections.keys().cloned().collect();
        for entity in &entities {
            self.apply_selection(entity);
        }
        self.rebuild_counter_table();
        self.state = PanelState::DataBound;
    }

    fn entity_label(&self, catalog: &PanelCatalog, entity: &str) -> String {
        let name = match self.axis {
            PanelAxis::ApproachCentric => catalog
                .approaches
                .iter()
                .find(|a| a.id.as_str() == entity)
                .map(|a| a.name.clone()),
            PanelAxis::MachineCentric => catalog
                .machines
                .iter()
                .find(|m| m.id.as_str() == entity)
                .map(|m| m.name.clone()),
        };
        name.unwrap_or_else(|| entity.to_string())
    }

    fn belongs_to(&self, record: &Measurement, filter: &PanelFilter, entity: &str) -> bool {
        self.axis
            .split_owners(record.approach_id.as_ref(), record.machine_id.as_ref())
            == (Some(entity), Some(filter.anchor.as_str()))
    }

    fn perf_belongs_to(&self, record: &PerfRecord, filter: &PanelFilter, entity: &str) -> bool {
        self.axis
            .split_owners(record.approach_id.as_ref(), record.machine_id.as_ref())
            == (Some(entity), Some(filter.anchor.as_str()))
    }

    /// Replaces the entity's applied series with its current choice.
    fn apply_selection(&mut self, entity: &str) {
        let Some(filter) = self.filter.as_ref() else {
            return;
        };
        let Some(selection) = self.selections.get(entity) else {
            return;
        };

        let records: Vec<Measurement> = self
            .catalog
            .numbers
            .iter()
            .filter(|r| self.belongs_to(r, filter, entity))
            .cloned()
            .collect();
        let stale = selection.applied.clone();
        let keys = selection.choice.keys(entity, &selection.label);

        for key in &stale {
            self.tables.remove_series(key);
        }
        for key in &keys {
            let metrics = series_metrics(&records, key.thread_count);
            self.tables.add_series(key, &metrics);
        }
        if let Some(selection) = self.selections.get_mut(entity) {
            selection.applied = keys;
        }
    }

    /// Records a new series choice for `entity`.
    ///
    /// While data is bound the previously applied columns of the entity are
    /// removed from every table and the chosen ones added. During a refresh
    /// the choice is kept and applied when the refresh binds.
    pub fn update_series(&mut self, entity: &str, choice: SeriesChoice) -> AppResult<()> {
        if self.state == PanelState::Empty {
            return Err(AppError::InvalidInput(
                "panel has no data to select series from".to_string(),
            ));
        }
        let Some(selection) = self.selections.get_mut(entity) else {
            return Err(AppError::NotFound(format!("compared entity {entity}")));
        };

        if self.state == PanelState::DataBound
            && let Some(p) = choice
                .threads
                .iter()
                .find(|p| !selection.available_threads.contains(p))
        {
            return Err(AppError::InvalidInput(format!(
                "no runs with {p} threads for {entity}"
            )));
        }

        selection.choice = choice;
        if self.state == PanelState::DataBound {
            self.apply_selection(entity);
            self.rebuild_counter_table();
        }
        Ok(())
    }

    /// Switches the active chart and applies its preset options.
    pub fn change_chart(&mut self, kind: ChartKind) {
        self.active_chart = kind;
        self.options.apply_preset(kind);
        if kind == ChartKind::PerfCounter
            && let Some(counter) = self.counter
        {
            self.options.title = Some(format!("Problem size vs. {counter}"));
            self.options.v_axis.title = Some(format!("Mean of {counter}"));
        }
    }

    /// Plots the mean of `counter` in the counter chart, one column per
    /// chosen thread count of each compared entity.
    pub fn select_counter(&mut self, counter: &str) -> AppResult<()> {
        let Some(name) = PerfCounters::canonical_name(counter) else {
            return Err(AnalysisError::UnknownCounter(counter.to_string()).into());
        };
        self.counter = Some(name);
        self.rebuild_counter_table();
        if self.active_chart == ChartKind::PerfCounter {
            self.change_chart(ChartKind::PerfCounter);
        }
        Ok(())
    }

    fn rebuild_counter_table(&mut self) {
        self.tables.perf_counter.clear();
        let (Some(filter), Some(counter)) = (self.filter.as_ref(), self.counter) else {
            return;
        };

        let mut columns = Vec::new();
        for selection in self.selections.values() {
            let records: Vec<&PerfRecord> = self
                .catalog
                .perfs
                .iter()
                .filter(|r| self.perf_belongs_to(r, filter, &selection.entity))
                .collect();
            for &p in &selection.choice.threads {
                let at_p = records.iter().copied().filter(|r| r.thread_count == p);
                // The name was resolved by `select_counter`.
                let Ok(means) = average_counter_by_size(at_p, counter) else {
                    continue;
                };
                columns.push((
                    ColumnId::new(format!("{}:{counter}_{p}_", selection.entity)),
                    format!("{} {counter} P {p} ", selection.label),
                    means,
                ));
            }
        }
        for (id, label, means) in columns {
            self.tables.perf_counter.add_column(id, label, &means);
        }
    }

    /// Entities related to the compared ones: machines for an
    /// approach-centric panel, approaches for a machine-centric one.
    pub fn related_entities(&self) -> Vec<(String, String)> {
        let Some(filter) = &self.filter else {
            return Vec::new();
        };
        match self.axis {
            PanelAxis::ApproachCentric => {
                let ids: Vec<_> = self
                    .catalog
                    .approaches
                    .iter()
                    .filter(|a| filter.compared.iter().any(|c| c == a.id.as_str()))
                    .map(|a| a.id.clone())
                    .collect();
                machines_for_approaches(&self.catalog.numbers, &self.catalog.machines, &ids)
                    .into_iter()
                    .map(|m| (m.id.to_string(), m.name))
                    .collect()
            }
            PanelAxis::MachineCentric => {
                let ids: Vec<_> = self
                    .catalog
                    .machines
                    .iter()
                    .filter(|m| filter.compared.iter().any(|c| c == m.id.as_str()))
                    .map(|m| m.id.clone())
                    .collect();
                approaches_for_machines(&self.catalog.numbers, &self.catalog.approaches, &ids)
                    .into_iter()
                    .map(|a| (a.id.to_string(), a.name))
                    .collect()
            }
        }
    }

    /// Programming environments used by the approaches on this panel.
    pub fn related_penvs(&self) -> Vec<PenvId> {
        let Some(filter) = &self.filter else {
            return Vec::new();
        };
        let approaches: Vec<ApproachId> = match self.axis {
            PanelAxis::ApproachCentric => filter
                .compared
                .iter()
                .filter_map(|c| ApproachId::new(c.as_str()).ok())
                .collect(),
            PanelAxis::MachineCentric => ApproachId::new(filter.anchor.as_str())
                .into_iter()
                .collect(),
        };
        penvs_for_approaches(&self.catalog.numbers, &approaches)
    }

    /// The active chart's table, or the placeholder when nothing is plotted.
    pub fn view(&self) -> RenderableTable {
        select_view(self.tables.table(self.active_chart), self.active_chart)
    }

    pub fn render<R>(&self, renderer: &mut R) -> AppResult<RenderReceipt>
    where
        R: ChartRenderer + ?Sized,
    {
        let mut surface = ChartSurface::acquire(renderer)?;
        Ok(surface.draw(&self.view(), &self.options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::{ApproachId, MachineId, ProblemSize};

    fn number(approach: &str, machine: &str, n: f64, p: u32, alg: f64) -> Measurement {
        Measurement::from_upload(ProblemSize::new(n).unwrap(), ThreadCount(p), 1, alg, alg + 0.1)
            .with_owner(ApproachId::new(approach).unwrap(), MachineId::new(machine).unwrap())
    }

    fn perf(approach: &str, machine: &str, p: u32, run: u32, cycles: f64) -> PerfRecord {
        PerfRecord {
            problem_size: ProblemSize::new(100.0).unwrap(),
            thread_count: ThreadCount(p),
            run_id: run,
            approach_id: Some(ApproachId::new(approach).unwrap()),
            machine_id: Some(MachineId::new(machine).unwrap()),
            counters: PerfCounters {
                cycles: Some(cycles),
                ..Default::default()
            },
        }
    }

    fn approach(id: &str, name: &str) -> Approach {
        Approach {
            id: ApproachId::new(id).unwrap(),
            name: name.to_string(),
            problem_id: ProblemId::new("sort").unwrap(),
            architecture: Architecture::Shared,
        }
    }

    fn machine(id: &str) -> Machine {
        Machine {
            id: MachineId::new(id).unwrap(),
            name: id.to_uppercase(),
            description: None,
        }
    }

    fn filter() -> PanelFilter {
        PanelFilter::new(ProblemId::new("sort").unwrap(), "m1", ["omp", "tbb"])
    }

    fn payloads() -> Vec<(FetchKind, FetchPayload)> {
        vec![
            (
                FetchKind::Numbers,
                FetchPayload::Numbers(vec![
                    number("omp", "m1", 100.0, 0, 1.0),
                    number("omp", "m1", 100.0, 4, 0.5),
                    number("tbb", "m1", 100.0, 0, 1.2),
                    number("tbb", "m1", 100.0, 4, 0.4),
                    number("tbb", "m2", 100.0, 8, 0.2),
                ]),
            ),
            (
                FetchKind::Perfs,
                FetchPayload::Perfs(vec![
                    perf("omp", "m1", 4, 1, 1000.0),
                    perf("omp", "m1", 4, 2, 3000.0),
                    perf("omp", "m2", 4, 1, 9000.0),
                    perf("tbb", "m1", 0, 1, 500.0),
                ]),
            ),
            (
                FetchKind::Approaches,
                FetchPayload::Approaches(vec![approach("omp", "OpenMP"), approach("tbb", "TBB")]),
            ),
            (
                FetchKind::Machines,
                FetchPayload::Machines(vec![machine("m1"), machine("m2")]),
            ),
        ]
    }

    fn bound_panel() -> ComparisonPanel {
        let mut panel = ComparisonPanel::new(PanelAxis::ApproachCentric);
        let ticket = panel.begin_refresh(filter());
        for (kind, payload) in payloads() {
            panel.complete_fetch(ticket, kind, Ok(payload)).unwrap();
        }
        panel
    }

    #[test]
    fn binds_only_after_all_four_fetches() {
        let mut panel = ComparisonPanel::new(PanelAxis::ApproachCentric);
        assert_eq!(panel.state(), PanelState::Empty);

        let ticket = panel.begin_refresh(filter());
        assert_eq!(panel.state(), PanelState::SeriesSelected);

        let mut progress = Vec::new();
        for (kind, payload) in payloads().into_iter().rev() {
            progress.push(panel.complete_fetch(ticket, kind, Ok(payload)).unwrap());
        }
        assert_eq!(
            progress,
            vec![
                FetchProgress::Waiting { remaining: 3 },
                FetchProgress::Waiting { remaining: 2 },
                FetchProgress::Waiting { remaining: 1 },
                FetchProgress::Bound,
            ]
        );
        assert_eq!(panel.state(), PanelState::DataBound);

        let omp = panel.selection("omp").unwrap();
        assert_eq!(omp.label, "OpenMP");
        assert_eq!(omp.available_threads, vec![ThreadCount(0), ThreadCount(4)]);
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut panel = ComparisonPanel::new(PanelAxis::ApproachCentric);
        let old = panel.begin_refresh(filter());
        let new = panel.begin_refresh(filter());

        for (kind, payload) in payloads() {
            assert_eq!(
                panel.complete_fetch(old, kind, Ok(payload)).unwrap(),
                FetchProgress::Stale
            );
        }
        assert_eq!(panel.state(), PanelState::SeriesSelected);

        for (kind, payload) in payloads() {
            panel.complete_fetch(new, kind, Ok(payload)).unwrap();
        }
        assert_eq!(panel.state(), PanelState::DataBound);
        assert!(new.generation() > old.generation());
    }

    #[test]
    fn failed_fetch_keeps_previous_tables() {
        let mut panel = bound_panel();
        panel.update_series("omp", SeriesChoice::threads([4])).unwrap();
        let before = panel.tables().clone();

        let ticket = panel.begin_refresh(filter());
        let err = panel
            .complete_fetch(
                ticket,
                FetchKind::Numbers,
                Err(StoreError::InvalidId("bad".to_string())),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::UpstreamFetch {
                kind: FetchKind::Numbers,
                ..
            }
        ));
        assert_eq!(panel.state(), PanelState::DataBound);
        assert_eq!(panel.tables(), &before);

        let (kind, payload) = payloads().remove(1);
        assert_eq!(
            panel.complete_fetch(ticket, kind, Ok(payload)).unwrap(),
            FetchProgress::Stale
        );
    }

    #[test]
    fn failure_before_first_bind_returns_to_empty() {
        let mut panel = ComparisonPanel::new(PanelAxis::ApproachCentric);
        let ticket = panel.begin_refresh(filter());
        assert!(panel
            .complete_fetch(
                ticket,
                FetchKind::Machines,
                Err(StoreError::InvalidId("x".to_string())),
            )
            .is_err());
        assert_eq!(panel.state(), PanelState::Empty);
        assert_eq!(panel.selections().count(), 0);
    }

    #[test]
    fn update_series_swaps_applied_columns() {
        let mut panel = bound_panel();
        assert!(panel.view().placeholder);

        panel.update_series("omp", SeriesChoice::threads([0, 4])).unwrap();
        panel
            .update_series(
                "tbb",
                SeriesChoice {
                    threads: vec![ThreadCount(4)],
                    plot_e2e: true,
                    plot_alg: true,
                },
            )
            .unwrap();

        let exec = panel.tables().table(ChartKind::ExecutionTime);
        let ids: Vec<&str> = exec.columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["omp:alg_0_", "omp:alg_4_", "tbb:e2e_4_", "tbb:alg_4_"]);
        assert_eq!(exec.columns()[1].label, "OpenMP ALG P 4 ");

        panel.update_series("omp", SeriesChoice::threads([4])).unwrap();
        let exec = panel.tables().table(ChartKind::ExecutionTime);
        assert!(!exec.contains_column(&pd_analysis::ColumnId::new("omp:alg_0_")));
        assert_eq!(exec.series_count(), 3);
        assert_eq!(
            panel.selection("omp").unwrap().applied_threads(),
            vec![ThreadCount(4)]
        );

        let speedup = panel.tables().table(ChartKind::Speedup);
        let omp4 = SeriesKey::scoped(ThreadCount(4), MetricKind::Algorithm, "omp", "OpenMP");
        assert_eq!(
            speedup.value(ProblemSize::new(100.0).unwrap(), &omp4.column_id()),
            Some(2.0)
        );
    }

    #[test]
    fn unavailable_threads_are_rejected() {
        let mut panel = bound_panel();
        // p = 8 exists for tbb only on m2, which is not the anchor.
        let err = panel
            .update_series("tbb", SeriesChoice::threads([8]))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(matches!(
            panel.update_series("mpi", SeriesChoice::default()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn empty_panel_rejects_series_updates() {
        let mut panel = ComparisonPanel::new(PanelAxis::MachineCentric);
        assert!(panel.update_series("m1", SeriesChoice::default()).is_err());
    }

    #[test]
    fn refresh_rebuilds_tables_from_kept_choices() {
        let mut panel = bound_panel();
        panel.update_series("omp", SeriesChoice::threads([4])).unwrap();

        let ticket = panel.begin_refresh(filter());
        panel.update_series("tbb", SeriesChoice::threads([4])).unwrap();
        for (kind, payload) in payloads() {
            panel.complete_fetch(ticket, kind, Ok(payload)).unwrap();
        }

        let exec = panel.tables().table(ChartKind::ExecutionTime);
        let ids: Vec<&str> = exec.columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["omp:alg_4_", "tbb:alg_4_"]);
    }

    #[test]
    fn change_chart_sets_mean_axis_title() {
        let mut panel = ComparisonPanel::new(PanelAxis::ApproachCentric);
        assert_eq!(
            panel.options().v_axis.title.as_deref(),
            Some("Mean of Execution Time (s)")
        );
        panel.change_chart(ChartKind::Speedup);
        assert_eq!(panel.active_chart(), ChartKind::Speedup);
        assert_eq!(panel.options().v_axis.title.as_deref(), Some("Mean of Speedup"));
        assert_eq!(panel.options().title.as_deref(), Some("Problem size vs. Speedup"));
        assert_eq!(panel.options().h_axis.log_scale, Some(true));
    }

    #[test]
    fn karp_flatt_always_shows_placeholder() {
        let mut panel = bound_panel();
        panel.update_series("omp", SeriesChoice::threads([4])).unwrap();
        panel.change_chart(ChartKind::KarpFlatt);
        assert!(panel.view().placeholder);
    }

    #[test]
    fn related_entities_follow_axis() {
        let panel = bound_panel();
        let related = panel.related_entities();
        assert_eq!(
            related,
            vec![
                ("m1".to_string(), "M1".to_string()),
                ("m2".to_string(), "M2".to_string()),
            ]
        );
    }

    #[test]
    fn counter_chart_averages_anchor_perfs() {
        let mut panel = bound_panel();
        panel.update_series("omp", SeriesChoice::threads([4])).unwrap();
        panel.select_counter("CYCLES").unwrap();
        panel.change_chart(ChartKind::PerfCounter);

        assert_eq!(panel.counter(), Some("cycles"));
        assert_eq!(panel.options().v_axis.title.as_deref(), Some("Mean of cycles"));
        let view = panel.view();
        assert!(!view.placeholder);
        assert_eq!(view.columns[1].id.as_str(), "omp:cycles_4_");
        assert_eq!(view.columns[1].label, "OpenMP cycles P 4 ");
        // The m2 sample is off-anchor and must not be averaged in.
        assert_eq!(view.rows, vec![vec![Some(100.0), Some(2000.0)]]);

        panel.update_series("omp", SeriesChoice::threads([0])).unwrap();
        let counters = panel.tables().table(ChartKind::PerfCounter);
        assert!(counters.contains_column(&ColumnId::new("omp:cycles_0_")));
        assert!(!counters.contains_column(&ColumnId::new("omp:cycles_4_")));
    }

    #[test]
    fn unknown_counter_is_rejected() {
        let mut panel = bound_panel();
        assert!(matches!(
            panel.select_counter("flops"),
            Err(AppError::Analysis(_))
        ));
        assert_eq!(panel.counter(), None);
    }

    #[test]
    fn related_penvs_follow_compared_approaches() {
        let mut panel = ComparisonPanel::new(PanelAxis::ApproachCentric);
        let ticket = panel.begin_refresh(filter());
        for (kind, payload) in payloads() {
            let payload = match payload {
                FetchPayload::Numbers(numbers) => FetchPayload::Numbers(
                    numbers
                        .into_iter()
                        .map(|mut n| {
                            n.penv_id = Some(PenvId::new(format!("{}-cc", n.thread_count)).unwrap());
                            n
                        })
                        .collect(),
                ),
                other => other,
            };
            panel.complete_fetch(ticket, kind, Ok(payload)).unwrap();
        }
        let penvs: Vec<String> = panel.related_penvs().iter().map(|p| p.to_string()).collect();
        assert_eq!(penvs, vec!["0-cc", "4-cc", "8-cc"]);
        assert!(ComparisonPanel::new(PanelAxis::MachineCentric)
            .related_penvs()
            .is_empty());
    }
}
