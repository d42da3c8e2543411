//! Configuration types for the compensation policy.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML policy files.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Metadata about the compensation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    /// Internal policy code (e.g., "COMP-POLICY").
    pub code: String,
    /// The human-readable name of the policy.
    pub name: String,
    /// Where the policy is published.
    pub source: String,
}

/// Rates and ceiling of one insurance scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceScheme {
    /// Employee contribution rate (e.g., 0.08).
    pub employee_rate: Decimal,
    /// Employer contribution rate.
    pub employer_rate: Decimal,
    /// Maximum contribution base.
    pub ceiling: Decimal,
}

/// Employer-only accident insurance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentInsurance {
    /// Employer contribution rate.
    pub employer_rate: Decimal,
    /// Whether the base is capped at the social insurance ceiling.
    #[serde(default = "default_true")]
    pub use_capped_base: bool,
}

fn default_true() -> bool {
    true
}

/// Insurance section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceConfig {
    /// Social insurance.
    pub social: InsuranceScheme,
    /// Health insurance.
    pub health: InsuranceScheme,
    /// Unemployment insurance.
    pub unemployment: InsuranceScheme,
    /// Trade union fee.
    pub union: InsuranceScheme,
    /// Accident insurance.
    pub accident: AccidentInsurance,
}

/// One progressive tax bracket.
///
/// Brackets are ordered by `upper_bound`; the last bracket is open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Inclusive upper bound of taxable income; `None` for the top bracket.
    #[serde(default)]
    pub upper_bound: Option<Decimal>,
    /// Rate applied to income inside the bracket.
    pub rate: Decimal,
}

/// Tax section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Monthly personal deduction.
    pub personal_deduction: Decimal,
    /// Monthly deduction per dependent.
    pub dependent_deduction: Decimal,
    /// Progressive brackets, lowest first.
    #[serde(default)]
    pub brackets: Vec<TaxBracket>,
    /// Flat withholding rate.
    #[serde(default = "default_flat_rate")]
    pub flat_rate: Decimal,
    /// Gross income below which no flat tax is withheld.
    pub flat_minimum: Decimal,
}

fn default_flat_rate() -> Decimal {
    Decimal::new(10, 2)
}

/// KPI section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiConfig {
    /// Grade letter to bonus percentage (e.g., "A" → 0.10).
    #[serde(default)]
    pub tiers: BTreeMap<String, Decimal>,
    /// Grade used when neither HR nor the manager graded the employee.
    #[serde(default = "default_kpi_grade")]
    pub default_grade: String,
}

fn default_kpi_grade() -> String {
    "C".to_string()
}

/// The sales figure a tier criterion is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesMetric {
    /// Revenue closed in the month.
    Revenue,
    /// Number of transactions closed in the month.
    TransactionCount,
}

/// A minimum a sales figure must reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesCriterion {
    /// The figure compared.
    pub metric: SalesMetric,
    /// Inclusive minimum.
    pub min: Decimal,
}

/// A sales commission tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesTier {
    /// Tier code reported as the business grade (e.g., "M2").
    pub code: String,
    /// Total monthly income the tier guarantees.
    pub amount: Decimal,
    /// Every criterion must hold for the tier to apply.
    #[serde(default)]
    pub criteria: Vec<SalesCriterion>,
}

/// Sales section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesConfig {
    /// The only position eligible for the tier bonus.
    pub position_code: String,
    /// Commission tiers (any order; evaluated highest amount first).
    #[serde(default)]
    pub tiers: Vec<SalesTier>,
    /// Grade reported when no tier qualifies.
    #[serde(default = "default_business_grade")]
    pub default_grade: String,
}

fn default_business_grade() -> String {
    "M0".to_string()
}

/// Overtime multipliers per bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeMultipliers {
    /// Weekday overtime multiplier (e.g., 1.5).
    pub weekday: Decimal,
    /// Weekend overtime multiplier (e.g., 2.0).
    pub weekend: Decimal,
    /// Public holiday overtime multiplier (e.g., 3.0).
    pub holiday: Decimal,
}

/// One version of the compensation policy, effective from a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// The date from which this version applies.
    pub effective_date: NaiveDate,
    /// Insurance schemes.
    pub insurance: InsuranceConfig,
    /// Personal income tax.
    pub tax: TaxConfig,
    /// KPI bonus tiers.
    pub kpi: KpiConfig,
    /// Sales commission tiers.
    pub sales: SalesConfig,
    /// Overtime multipliers.
    pub overtime: OvertimeMultipliers,
}
