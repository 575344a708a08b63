//! Scheduled jobs.
//!
//! - `OverdueSweep`: one pass of overdue marking plus customer blocking
//! - `SweepScheduler`: background task running the sweep once a day

pub mod overdue_sweep;
pub mod scheduler;

pub use overdue_sweep::{OverdueSweep, SweepReport};
pub use scheduler::{SweepScheduler, SweepSchedulerHandle, next_run_after};
