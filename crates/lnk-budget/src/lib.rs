//! Rate budgeting: per-window action ceilings plus human-like pacing.
//!
//! Every dispatched action passes through exactly one chokepoint, the
//! [`Scheduler`], which couples the hard daily ceiling with randomized
//! inter-action spacing.

pub mod budget;
pub mod pacing;
pub mod scheduler;

pub use budget::{BudgetStore, RateBudget, next_window_boundary};
pub use pacing::{draw_jitter, eligible_at};
pub use scheduler::Scheduler;
