//! Filtered list queries consumed by the dashboard.

use std::collections::BTreeSet;

use pd_core::{ApproachId, CategoryId, MachineId, ProblemId};
use pd_data::{Approach, Architecture, Category, Machine, Measurement, PerfRecord, Problem};

use crate::StoreResult;
use crate::collection::Collection;
use crate::store::JsonStore;

/// Read surface of a measurement store.
///
/// Every query returns records in a stable order. Implementations must be
/// shareable across the fetch workers of a panel refresh.
pub trait MeasurementStore: Send + Sync {
    fn categories(&self) -> StoreResult<Vec<Category>>;

    fn problems_by_category(&self, category: &CategoryId) -> StoreResult<Vec<Problem>>;

    /// Categories filing the problem; empty for an unknown problem.
    fn categories_by_problem(&self, problem: &ProblemId) -> StoreResult<Vec<Category>>;

    fn approaches_by_problem(
        &self,
        problem: &ProblemId,
        architecture: Option<Architecture>,
    ) -> StoreResult<Vec<Approach>>;

    /// Machines that hold at least one measurement for the problem's approaches.
    fn machines_by_problem(
        &self,
        problem: &ProblemId,
        architecture: Option<Architecture>,
    ) -> StoreResult<Vec<Machine>>;

    fn numbers_by_problem(
        &self,
        problem: &ProblemId,
        architecture: Option<Architecture>,
    ) -> StoreResult<Vec<Measurement>>;

    fn perfs_by_problem(
        &self,
        problem: &ProblemId,
        architecture: Option<Architecture>,
    ) -> StoreResult<Vec<PerfRecord>>;
}

impl JsonStore {
    fn approach_ids(
        &self,
        problem: &ProblemId,
        architecture: Option<Architecture>,
    ) -> StoreResult<BTreeSet<ApproachId>> {
        Ok(self
            .approaches_by_problem(problem, architecture)?
            .into_iter()
            .map(|a| a.id)
            .collect())
    }
}

fn owned_by(approach: Option<&ApproachId>, ids: &BTreeSet<ApproachId>) -> bool {
    approach.is_some_and(|id| ids.contains(id))
}

impl MeasurementStore for JsonStore {
    fn categories(&self) -> StoreResult<Vec<Category>> {
        self.decode_all(Collection::Category)
    }

    fn problems_by_category(&self, category: &CategoryId) -> StoreResult<Vec<Problem>> {
        Ok(self
            .decode_all::<Problem>(Collection::Problem)?
            .into_iter()
            .filter(|p| &p.category_id == category)
            .collect())
    }

    fn categories_by_problem(&self, problem: &ProblemId) -> StoreResult<Vec<Category>> {
        let filed_under: BTreeSet<CategoryId> = self
            .decode_all::<Problem>(Collection::Problem)?
            .into_iter()
            .filter(|p| &p.id == problem)
            .map(|p| p.category_id)
            .collect();
        Ok(self
            .decode_all::<Category>(Collection::Category)?
            .into_iter()
            .filter(|c| filed_under.contains(&c.id))
            .collect())
    }

    fn approaches_by_problem(
        &self,
        problem: &ProblemId,
        architecture: Option<Architecture>,
    ) -> StoreResult<Vec<Approach>> {
        Ok(self
            .decode_all::<Approach>(Collection::Approach)?
            .into_iter()
            .filter(|a| &a.problem_id == problem)
            .filter(|a| architecture.is_none_or(|arch| a.architecture == arch))
            .collect())
    }

    fn machines_by_problem(
        &self,
        problem: &ProblemId,
        architecture: Option<Architecture>,
    ) -> StoreResult<Vec<Machine>> {
        let used: BTreeSet<MachineId> = self
            .numbers_by_problem(problem, architecture)?
            .into_iter()
            .filter_map(|n| n.machine_id)
            .collect();
        Ok(self
            .decode_all::<Machine>(Collection::Machine)?
            .into_iter()
            .filter(|m| used.contains(&m.id))
            .collect())
    }

    fn numbers_by_problem(
        &self,
        problem: &ProblemId,
        architecture: Option<Architecture>,
    ) -> StoreResult<Vec<Measurement>> {
        let approaches = self.approach_ids(problem, architecture)?;
        Ok(self
            .decode_all::<Measurement>(Collection::Number)?
            .into_iter()
            .filter(|n| owned_by(n.approach_id.as_ref(), &approaches))
            .collect())
    }

    fn perfs_by_problem(
        &self,
        problem: &ProblemId,
        architecture: Option<Architecture>,
    ) -> StoreResult<Vec<PerfRecord>> {
        let approaches = self.approach_ids(problem, architecture)?;
        Ok(self
            .decode_all::<PerfRecord>(Collection::Perf)?
            .into_iter()
            .filter(|p| owned_by(p.approach_id.as_ref(), &approaches))
            .collect())
    }
}
