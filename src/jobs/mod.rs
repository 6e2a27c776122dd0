//! The two scheduled jobs.
//!
//! The refresh job runs every 4-12 hours and is the sole writer of the
//! forecast table; the hourly current-estimate job reads it only on the
//! fallback path. They are independent short-lived processes; the table's
//! atomic-replace discipline is the only coordination between them.

mod current;
mod refresh;

pub use current::{CurrentEstimateJob, EstimateSource};
pub use refresh::RefreshJob;
