//! Filter compilation: targeting criteria → canonical platform query.

pub mod compiler;
pub mod mappings;

pub use compiler::{CanonicalQuery, compile};
