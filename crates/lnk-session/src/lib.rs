//! Session persistence: one authenticated handle per account, single
//! holder at a time, opaque auth blob on disk.

pub mod state;
pub mod store;

pub use state::SessionState;
pub use store::{SessionHandle, SessionStore, default_state_root};
