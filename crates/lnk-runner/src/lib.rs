//! Campaign execution: per-candidate dispatch and the run loop that
//! drives a campaign through its lifecycle.

pub mod dispatcher;
pub mod runner;

pub use dispatcher::{ConnectionDispatcher, DispatchReport};
pub use runner::{CampaignRunner, RunOptions};
