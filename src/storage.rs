//! Storage implementations for sessions

mod interface;
pub use interface::*;

pub mod memory;
