//! Shared application service layer for perfdash.
//!
//! This crate sits between the CLI and the lower crates: it turns uploads
//! into chart tables, drives the comparison panels and their store
//! refreshes, and imports uploads into the measurement store.

pub mod error;
pub mod import;
pub mod panel;
pub mod query;
pub mod refresh;
pub mod upload;

pub use error::{AppError, AppResult};
pub use import::{ImportSummary, import_upload};
pub use panel::{
    ComparisonPanel, FetchProgress, PanelAxis, PanelCatalog, PanelFilter, PanelState,
    RefreshTicket, SeriesChoice, SeriesSelection,
};
pub use query::{
    DataSummary, approaches_for_machines, distinct_thread_counts, machines_for_approaches,
    penvs_for_approaches, summarize,
};
pub use refresh::{FetchKind, FetchPayload, fetch, refresh_from_store};
pub use upload::{UploadReport, analyze_upload, load_upload_report};
