//! Content-based ids for imported measurements.

use pd_data::Measurement;
use sha2::{Digest, Sha256};

/// Length of generated ids, matching the 24 hex digits of a store object id.
const ID_LEN: usize = 24;

/// Derives a stable document id from a measurement's content.
///
/// Importing the same upload twice yields the same ids, so the second import
/// overwrites instead of duplicating.
pub fn compute_record_id(record: &Measurement) -> String {
    let mut hasher = Sha256::new();

    let record_json = serde_json::to_string(record).unwrap_or_default();
    hasher.update(record_json.as_bytes());

    let result = hasher.finalize();
    let mut id = format!("{:x}", result);
    id.truncate(ID_LEN);
    id
}
