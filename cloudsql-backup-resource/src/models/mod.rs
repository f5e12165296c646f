//! Data model for backup runs and the operations that create them.

pub mod backup_run;
pub mod operation;
pub mod timezone;

pub use backup_run::{sort_by_recency, BackupRun, BackupRunList, RunPhase};
pub use operation::{BackupContext, BackupOperation};
