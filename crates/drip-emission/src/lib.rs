//! # drip-emission — Token emission schedulers.
//!
//! All calculations use integer arithmetic only, with checked `U256`
//! operations; overflow is an error, never a wrap.
//!
//! - **Decaying schedule**: per-period amounts shrink geometrically at each
//!   period boundary; partial periods are paid pro rata.
//! - **Linear emission**: a constant per-second rate.
//! - **Team allocation**: a fixed share of every mint split among the team.
//! - **Scheduler**: the mint clock driving either curve against the pool.

pub mod linear;
pub mod schedule;
pub mod scheduler;
pub mod team;

pub use linear::LinearEmission;
pub use schedule::EmissionSchedule;
pub use scheduler::{DecayingScheduler, LinearScheduler, MintReceipt, Scheduler};
pub use team::{TeamAllocation, TeamMember, TeamSplit};
