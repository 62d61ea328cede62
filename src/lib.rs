//! FinSight - GRPV composite stock scoring and market-intelligence card
//! analytics.
//!
//! The library holds the two computation cores, [`scoring`] and
//! [`analysis`], plus the input, runner and report layers the `finsight`
//! binary wires together.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod input;
pub mod models;
pub mod report;
pub mod runner;
pub mod scoring;
