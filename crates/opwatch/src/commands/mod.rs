//! Command implementations

pub mod operation;
