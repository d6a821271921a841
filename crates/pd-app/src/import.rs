//! Imports an upload into the measurement store.

use std::collections::BTreeSet;

use pd_core::{ApproachId, MachineId, ProblemId};
use pd_data::{Approach, Machine, ParsedUpload, validate_measurement};
use pd_store::{Collection, JsonStore, compute_record_id};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Distinct documents written, new or overwritten.
    pub written: usize,
    pub skipped_lines: usize,
    /// Lines identical to an earlier line of the same upload. They hash to
    /// the same document and are stored once.
    pub collapsed: usize,
    /// Ids of the written documents, in upload order.
    pub ids: Vec<String>,
}

/// Stores every parsed record of `upload` as a number owned by `approach`
/// on `machine`.
///
/// Ids are derived from record content, so importing the same upload again
/// rewrites the same documents.
pub fn import_upload(
    store: &JsonStore,
    upload: &ParsedUpload,
    problem: &ProblemId,
    approach: &ApproachId,
    machine: &MachineId,
) -> AppResult<ImportSummary> {
    let owner: Approach = serde_json::from_value(store.show(Collection::Approach, approach.as_str())?)
        .map_err(|e| AppError::Data(format!("approach {approach}: {e}")))?;
    if &owner.problem_id != problem {
        return Err(AppError::InvalidInput(format!(
            "approach {approach} belongs to problem {}, not {problem}",
            owner.problem_id
        )));
    }
    let _: Machine = serde_json::from_value(store.show(Collection::Machine, machine.as_str())?)
        .map_err(|e| AppError::Data(format!("machine {machine}: {e}")))?;

    let records = upload
        .records
        .iter()
        .map(|r| r.clone().with_owner(approach.clone(), machine.clone()))
        .collect::<Vec<_>>();
    for record in &records {
        validate_measurement(record)?;
    }

    let mut summary = ImportSummary {
        skipped_lines: upload.errors.len(),
        ..ImportSummary::default()
    };
    let mut seen = BTreeSet::new();
    for record in &records {
        let id = compute_record_id(record);
        if !seen.insert(id.clone()) {
            summary.collapsed += 1;
            continue;
        }
        let body = serde_json::to_value(record).map_err(|e| AppError::Data(e.to_string()))?;
        store.upsert(Collection::Number, &id, body)?;
        summary.ids.push(id);
        summary.written += 1;
    }

    if summary.skipped_lines > 0 {
        warn!(skipped = summary.skipped_lines, "upload lines skipped on import");
    }
    if summary.collapsed > 0 {
        warn!(collapsed = summary.collapsed, "duplicate upload lines stored once");
    }
    info!(%approach, %machine, written = summary.written, "upload imported");
    Ok(summary)
}
