//! PolyHedge Library
//!
//! Position ledger and hedge strategy engine for Polymarket binary markets

pub mod agent;
pub mod config;
pub mod error;
pub mod execution;
pub mod persistence;
pub mod position;
pub mod strategy;
pub mod types;
