//! Record schema shared by uploads and the measurement store.
//!
//! Field names on the wire follow the store's document layout (`n`, `p`,
//! `algS`, ...), so documents written by the harness deserialize directly.

use pd_core::{
    ApproachId, CategoryId, MachineId, PenvId, ProblemId, ProblemSize, Real, ThreadCount,
    split_seconds,
};
use serde::{Deserialize, Serialize};

/// One timed run of one approach on one machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    #[serde(rename = "n")]
    pub problem_size: ProblemSize,
    #[serde(rename = "p")]
    pub thread_count: ThreadCount,
    pub run_id: u32,
    #[serde(rename = "algS")]
    pub alg_s: Real,
    #[serde(rename = "algNS", default)]
    pub alg_ns: Real,
    #[serde(rename = "e2eS")]
    pub e2e_s: Real,
    #[serde(rename = "e2eNS", default)]
    pub e2e_ns: Real,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach_id: Option<ApproachId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<MachineId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penv_id: Option<PenvId>,
}

impl Measurement {
    /// Record as read from an upload file: no owners, no nanosecond remainders.
    pub fn from_upload(
        problem_size: ProblemSize,
        thread_count: ThreadCount,
        run_id: u32,
        alg_s: Real,
        e2e_s: Real,
    ) -> Self {
        Self {
            problem_size,
            thread_count,
            run_id,
            alg_s,
            alg_ns: 0.0,
            e2e_s,
            e2e_ns: 0.0,
            approach_id: None,
            machine_id: None,
            penv_id: None,
        }
    }

    /// Algorithm-only time in seconds.
    pub fn algorithm_seconds(&self) -> Real {
        split_seconds(self.alg_s, self.alg_ns)
    }

    /// End-to-end time in seconds.
    pub fn end_to_end_seconds(&self) -> Real {
        split_seconds(self.e2e_s, self.e2e_ns)
    }

    pub fn with_owner(mut self, approach_id: ApproachId, machine_id: MachineId) -> Self {
        self.approach_id = Some(approach_id);
        self.machine_id = Some(machine_id);
        self
    }
}

/// Hardware performance counter sample for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerfCounters {
    pub cycles: Option<f64>,
    pub instructions: Option<f64>,
    pub cache_references: Option<f64>,
    pub cache_misses: Option<f64>,
    pub bus_cycles: Option<f64>,
    #[serde(rename = "L1DcacheLoads")]
    pub l1d_cache_loads: Option<f64>,
    #[serde(rename = "L1DcacheLoadMisses")]
    pub l1d_cache_load_misses: Option<f64>,
    #[serde(rename = "L1DcacheStores")]
    pub l1d_cache_stores: Option<f64>,
    #[serde(rename = "dTLBLoads")]
    pub dtlb_loads: Option<f64>,
    #[serde(rename = "dTLBLoadMisses")]
    pub dtlb_load_misses: Option<f64>,
    #[serde(rename = "LLCLoads")]
    pub llc_loads: Option<f64>,
    #[serde(rename = "LLCLoadMisses")]
    pub llc_load_misses: Option<f64>,
    #[serde(rename = "LLCStores")]
    pub llc_stores: Option<f64>,
    pub branches: Option<f64>,
    pub branch_misses: Option<f64>,
    pub context_switches: Option<f64>,
    pub cpu_migrations: Option<f64>,
    pub page_faults: Option<f64>,
}

impl PerfCounters {
    /// Counter names in store order, paired with their values.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 18] {
        [
            ("cycles", self.cycles),
            ("instructions", self.instructions),
            ("cacheReferences", self.cache_references),
            ("cacheMisses", self.cache_misses),
            ("busCycles", self.bus_cycles),
            ("L1DcacheLoads", self.l1d_cache_loads),
            ("L1DcacheLoadMisses", self.l1d_cache_load_misses),
            ("L1DcacheStores", self.l1d_cache_stores),
            ("dTLBLoads", self.dtlb_loads),
            ("dTLBLoadMisses", self.dtlb_load_misses),
            ("LLCLoads", self.llc_loads),
            ("LLCLoadMisses", self.llc_load_misses),
            ("LLCStores", self.llc_stores),
            ("branches", self.branches),
            ("branchMisses", self.branch_misses),
            ("contextSwitches", self.context_switches),
            ("cpuMigrations", self.cpu_migrations),
            ("pageFaults", self.page_faults),
        ]
    }

    pub fn recorded_count(&self) -> usize {
        self.entries().iter().filter(|(_, v)| v.is_some()).count()
    }

    /// Every counter name, in store order.
    pub fn names() -> [&'static str; 18] {
        Self::default().entries().map(|(name, _)| name)
    }

    /// Store name of the counter called `name`, ignoring ASCII case.
    pub fn canonical_name(name: &str) -> Option<&'static str> {
        Self::names()
            .into_iter()
            .find(|known| known.eq_ignore_ascii_case(name))
    }

    /// Value of the counter called `name`. `None` when no such counter
    /// exists; `Some(None)` when it exists but was not recorded.
    pub fn value(&self, name: &str) -> Option<Option<f64>> {
        self.entries()
            .into_iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// Performance counter document keyed like a [`Measurement`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerfRecord {
    #[serde(rename = "n")]
    pub problem_size: ProblemSize,
    #[serde(rename = "p")]
    pub thread_count: ThreadCount,
    pub run_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach_id: Option<ApproachId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<MachineId>,
    #[serde(flatten)]
    pub counters: PerfCounters,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    #[default]
    Shared,
    Distributed,
}

impl Architecture {
    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::Shared => "shared",
            Architecture::Distributed => "distributed",
        }
    }
}

impl std::str::FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shared" => Ok(Architecture::Shared),
            "distributed" => Ok(Architecture::Distributed),
            other => Err(format!("unknown architecture: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Problem {
    #[serde(rename = "_id")]
    pub id: ProblemId,
    pub name: String,
    pub category_id: CategoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Approach {
    #[serde(rename = "_id")]
    pub id: ApproachId,
    pub name: String,
    pub problem_id: ProblemId,
    #[serde(default)]
    pub architecture: Architecture,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Machine {
    #[serde(rename = "_id")]
    pub id: MachineId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
