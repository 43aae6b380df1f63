//! CLI command handlers

pub mod caption;
pub mod extract;
pub mod stats;
