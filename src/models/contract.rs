//! Employment contract model.
//!
//! A [`Contract`] carries the salary components and the tax/insurance flags
//! the payroll pipeline consumes. Which contract applies to a month is
//! decided by `calculation::resolve_contract`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Drafted but not in force.
    Draft,
    /// In force.
    Active,
    /// Ended at its natural end date.
    Expired,
    /// Ended early.
    Terminated,
}

/// How personal income tax is computed for a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxCalculationMethod {
    /// No tax withheld.
    None,
    /// Progressive brackets after deductions.
    Progressive,
    /// Flat 10% withholding above the configured minimum.
    #[serde(rename = "flat_10")]
    Flat10,
}

/// Which share of the salary is paid for probation days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetPercentage {
    /// Probation days are paid in full.
    #[default]
    Full,
    /// Probation days are paid at the probation factor.
    Reduced,
}

/// Represents an employment contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Unique identifier for the contract.
    pub id: Uuid,
    /// The employee the contract belongs to.
    pub employee_id: String,
    /// Contract status.
    pub status: ContractStatus,
    /// First day the contract is in force.
    pub effective_date: NaiveDate,
    /// Date the contract was signed.
    #[serde(default)]
    pub sign_date: Option<NaiveDate>,
    /// When the contract record was created.
    pub created_at: DateTime<Utc>,
    /// Monthly base salary.
    pub base_salary: Decimal,
    /// Monthly KPI salary.
    pub kpi_salary: Decimal,
    /// Monthly lunch allowance.
    pub lunch_allowance: Decimal,
    /// Monthly phone allowance.
    pub phone_allowance: Decimal,
    /// Other monthly allowances.
    pub other_allowance: Decimal,
    /// Tax method; `None` behaves like [`TaxCalculationMethod::None`].
    #[serde(default)]
    pub tax_calculation_method: Option<TaxCalculationMethod>,
    /// Probation pay share.
    #[serde(default)]
    pub net_percentage: NetPercentage,
    /// Whether the contract participates in social insurance.
    pub has_social_insurance: bool,
}
