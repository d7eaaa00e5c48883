//! Command implementations for the Sluice CLI

pub mod check;
pub mod replay;
