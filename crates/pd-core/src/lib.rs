//! pd-core: stable foundation for perfdash.
//!
//! Contains:
//! - units (uom time and ratio quantities for speedups)
//! - numeric (Real + tolerances + running means)
//! - ids (typed entity ids and thread counts)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
