//! pd-store: measurement store query surface and a file-backed document store.

pub mod collection;
pub mod hash;
pub mod patch;
pub mod query;
pub mod store;

pub use collection::Collection;
pub use hash::compute_record_id;
pub use patch::{PatchError, PatchOp, apply_patch};
pub use query::MeasurementStore;
pub use store::JsonStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{collection} not found: {id}")]
    NotFound { collection: Collection, id: String },

    #[error("{collection} already exists: {id}")]
    Conflict { collection: Collection, id: String },

    #[error("Invalid document id: {0:?}")]
    InvalidId(String),

    #[error("Invalid document: {reason}")]
    InvalidDocument { reason: String },

    #[error("Failed to decode {collection} {id}: {source}")]
    Decode {
        collection: Collection,
        id: String,
        source: serde_json::Error,
    },

    #[error("Patch rejected: {0}")]
    Patch(#[from] PatchError),
}
