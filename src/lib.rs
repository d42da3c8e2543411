//! Monthly Payroll Engine
//!
//! This crate computes monthly payroll slips for every employee in a salary
//! period. A versioned compensation policy is snapshotted into each period;
//! slips are calculated through an ordered, audited pipeline (contract, KPI,
//! attendance, travel, sales, income, overtime, insurance, tax, adjustments,
//! status) and periods move between ONGOING and COMPLETED under explicit
//! lifecycle commands.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;
