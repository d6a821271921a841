//! Query helpers over fetched or uploaded records.

use std::collections::BTreeSet;

use pd_core::{ApproachId, MachineId, PenvId, ProblemSize, ThreadCount};
use pd_data::{Approach, Machine, Measurement};

use crate::error::{AppError, AppResult};

/// Summary of a record set's coverage.
#[derive(Debug, Clone)]
pub struct DataSummary {
    pub record_count: usize,
    pub size_range: (ProblemSize, ProblemSize),
    pub problem_sizes: usize,
    pub thread_counts: Vec<ThreadCount>,
    pub runs: usize,
}

pub fn summarize(records: &[Measurement]) -> AppResult<DataSummary> {
    let sizes: BTreeSet<ProblemSize> = records.iter().map(|r| r.problem_size).collect();
    let (Some(&min), Some(&max)) = (sizes.first(), sizes.last()) else {
        return Err(AppError::InvalidInput("No records in data set".to_string()));
    };
    let runs: BTreeSet<u32> = records.iter().map(|r| r.run_id).collect();

    Ok(DataSummary {
        record_count: records.len(),
        size_range: (min, max),
        problem_sizes: sizes.len(),
        thread_counts: distinct_thread_counts(records),
        runs: runs.len(),
    })
}

/// Distinct thread counts, ascending.
pub fn distinct_thread_counts<'a, I>(records: I) -> Vec<ThreadCount>
where
    I: IntoIterator<Item = &'a Measurement>,
{
    records
        .into_iter()
        .map(|r| r.thread_count)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Machines holding numbers for any of `approaches`, in catalog order.
pub fn machines_for_approaches(
    numbers: &[Measurement],
    machines: &[Machine],
    approaches: &[ApproachId],
) -> Vec<Machine> {
    let used: BTreeSet<&MachineId> = numbers
        .iter()
        .filter(|n| n.approach_id.as_ref().is_some_and(|a| approaches.contains(a)))
        .filter_map(|n| n.machine_id.as_ref())
        .collect();
    machines
        .iter()
        .filter(|m| used.contains(&m.id))
        .cloned()
        .collect()
}

/// Approaches with numbers on any of `machines`, in catalog order.
pub fn approaches_for_machines(
    numbers: &[Measurement],
    approaches: &[Approach],
    machines: &[MachineId],
) -> Vec<Approach> {
    let used: BTreeSet<&ApproachId> = numbers
        .iter()
        .filter(|n| n.machine_id.as_ref().is_some_and(|m| machines.contains(m)))
        .filter_map(|n| n.approach_id.as_ref())
        .collect();
    approaches
        .iter()
        .filter(|a| used.contains(&a.id))
        .cloned()
        .collect()
}

/// Programming environments used by any of `approaches`.
pub fn penvs_for_approaches(numbers: &[Measurement], approaches: &[ApproachId]) -> Vec<PenvId> {
    numbers
        .iter()
        .filter(|n| n.approach_id.as_ref().is_some_and(|a| approaches.contains(a)))
        .filter_map(|n| n.penv_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::ProblemId;
    use pd_data::Architecture;

    fn number(approach: &str, machine: &str, p: u32) -> Measurement {
        Measurement::from_upload(ProblemSize::new(100.0).unwrap(), ThreadCount(p), 1, 1.0, 1.0)
            .with_owner(ApproachId::new(approach).unwrap(), MachineId::new(machine).unwrap())
    }

    fn machine(id: &str) -> Machine {
        Machine {
            id: MachineId::new(id).unwrap(),
            name: id.to_uppercase(),
            description: None,
        }
    }

    #[test]
    fn summary_of_empty_set_is_an_error() {
        assert!(matches!(summarize(&[]), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn summary_counts_distinct_values() {
        let records = vec![number("a", "m", 0), number("a", "m", 4), number("a", "m", 4)];
        let summary = summarize(&records).unwrap();
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.problem_sizes, 1);
        assert_eq!(summary.thread_counts, vec![ThreadCount(0), ThreadCount(4)]);
        assert_eq!(summary.runs, 1);
    }

    #[test]
    fn related_machines_follow_selected_approaches() {
        let numbers = vec![number("a1", "m1", 4), number("a2", "m2", 4)];
        let machines = vec![machine("m1"), machine("m2"), machine("m3")];

        let related =
            machines_for_approaches(&numbers, &machines, &[ApproachId::new("a2").unwrap()]);
        assert_eq!(related, vec![machine("m2")]);

        let approaches = vec![Approach {
            id: ApproachId::new("a1").unwrap(),
            name: "OpenMP".to_string(),
            problem_id: ProblemId::new("p1").unwrap(),
            architecture: Architecture::Shared,
        }];
        let related =
            approaches_for_machines(&numbers, &approaches, &[MachineId::new("m1").unwrap()]);
        assert_eq!(related.len(), 1);
        assert!(approaches_for_machines(&numbers, &approaches, &[MachineId::new("m2").unwrap()])
            .is_empty());
    }

    #[test]
    fn penvs_are_distinct() {
        let mut a = number("a1", "m1", 4);
        a.penv_id = Some(PenvId::new("gcc").unwrap());
        let b = Measurement {
            run_id: 2,
            ..a.clone()
        };
        let penvs = penvs_for_approaches(&[a, b], &[ApproachId::new("a1").unwrap()]);
        assert_eq!(penvs, vec![PenvId::new("gcc").unwrap()]);
    }
}
