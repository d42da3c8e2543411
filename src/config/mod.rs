//! Configuration loading and management for the payroll engine.
//!
//! This module loads the versioned compensation policy from YAML files
//! (insurance rates and ceilings, tax brackets, KPI tiers, sales tiers,
//! overtime multipliers) and captures immutable snapshots of it for
//! salary periods.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/policy").unwrap();
//! println!("Loaded policy: {}", config.metadata().name);
//! ```

mod loader;
mod snapshot;
mod types;

pub use loader::ConfigLoader;
pub use snapshot::ConfigSnapshot;
pub use types::{
    AccidentInsurance, InsuranceConfig, InsuranceScheme, KpiConfig, OvertimeMultipliers,
    PolicyConfig, PolicyMetadata, SalesConfig, SalesCriterion, SalesMetric, SalesTier, TaxBracket,
    TaxConfig,
};
