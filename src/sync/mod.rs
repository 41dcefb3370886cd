//! The sync subsystem (§4.4/§4.5): a pure planner, an executor that applies
//! the plan against the store/adapter traits, and a periodic background job
//! that drives both on a timer.

mod error;
mod executor;
mod job;
mod planner;

pub use error::{SyncCategory, SyncError, SyncResult};
pub use executor::{SyncExecutor, Syncer};
pub use job::SyncJob;
pub use planner::{build_plan, SyncPlan};
