//! Statutory insurance contributions.
//!
//! Only official employees whose contract participates in social insurance
//! contribute, and only if they became official before the 15th of the
//! month. The base salary is capped at the social insurance ceiling, and
//! each scheme re-caps that base at its own ceiling.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{InsuranceConfig, InsuranceScheme};
use crate::models::{AuditStep, PayMonth};

use super::round_money;

/// Day of the month before which a newly official employee contributes.
pub const INSURANCE_CUTOFF_DAY: u32 = 15;

/// Employee and employer parts of one scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contribution {
    /// Deducted from the employee.
    pub employee: Decimal,
    /// Paid by the employer.
    pub employer: Decimal,
}

/// The result of the insurance stage.
#[derive(Debug, Clone)]
pub struct InsuranceResult {
    /// Whether contributions apply.
    pub eligible: bool,
    /// Base salary after the social ceiling.
    pub social_insurance_base: Decimal,
    /// Social insurance.
    pub social: Contribution,
    /// Health insurance.
    pub health: Contribution,
    /// Unemployment insurance.
    pub unemployment: Contribution,
    /// Union fee.
    pub union: Contribution,
    /// Employer accident insurance.
    pub employer_accident: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

impl InsuranceResult {
    /// Sum of the employee parts.
    pub fn employee_total(&self) -> Decimal {
        self.social.employee
            + self.health.employee
            + self.unemployment.employee
            + self.union.employee
    }
}

/// Decides whether insurance contributions apply for the month.
pub fn is_insurance_eligible(
    has_social_insurance: bool,
    is_official: bool,
    official_conversion_date: Option<NaiveDate>,
    month: PayMonth,
) -> bool {
    let cutoff = month.day(INSURANCE_CUTOFF_DAY);
    has_social_insurance
        && is_official
        && official_conversion_date.is_none_or(|converted| converted < cutoff)
}

fn contribute(base: Decimal, scheme: &InsuranceScheme) -> Contribution {
    let capped = base.min(scheme.ceiling);
    Contribution {
        employee: round_money(capped * scheme.employee_rate),
        employer: round_money(capped * scheme.employer_rate),
    }
}

/// Calculates every insurance contribution.
///
/// Ineligible employees get a zero base and zero contributions.
pub fn calculate_insurance(
    eligible: bool,
    base_salary: Decimal,
    config: &InsuranceConfig,
    step_number: u32,
) -> InsuranceResult {
    let (social_insurance_base, social, health, unemployment, union, employer_accident) =
        if eligible {
            let base = base_salary.min(config.social.ceiling);
            let accident_base = if config.accident.use_capped_base {
                base
            } else {
                base_salary
            };
            (
                base,
                contribute(base, &config.social),
                contribute(base, &config.health),
                contribute(base, &config.unemployment),
                contribute(base, &config.union),
                round_money(accident_base * config.accident.employer_rate),
            )
        } else {
            (
                Decimal::ZERO,
                Contribution::default(),
                Contribution::default(),
                Contribution::default(),
                Contribution::default(),
                Decimal::ZERO,
            )
        };

    let employee_total =
        social.employee + health.employee + unemployment.employee + union.employee;
    let reasoning = if eligible {
        format!(
            "Base {} capped at {}: employee contributions {}",
            base_salary, social_insurance_base, employee_total
        )
    } else {
        "Not eligible for insurance this month".to_string()
    };

    let audit_step = AuditStep::new(
        step_number,
        "insurance",
        "Insurance Contributions",
        serde_json::json!({
            "eligible": eligible,
            "base_salary": base_salary.to_string(),
            "social_ceiling": config.social.ceiling.to_string(),
        }),
        serde_json::json!({
            "social_insurance_base": social_insurance_base.to_string(),
            "employee_social_insurance": social.employee.to_string(),
            "employer_social_insurance": social.employer.to_string(),
            "employee_health_insurance": health.employee.to_string(),
            "employer_health_insurance": health.employer.to_string(),
            "employee_unemployment_insurance": unemployment.employee.to_string(),
            "employer_unemployment_insurance": unemployment.employer.to_string(),
            "employee_union_fee": union.employee.to_string(),
            "employer_union_fee": union.employer.to_string(),
            "employer_accident_insurance": employer_accident.to_string(),
        }),
        reasoning,
    );

    InsuranceResult {
        eligible,
        social_insurance_base,
        social,
        health,
        unemployment,
        union,
        employer_accident,
        audit_step,
    }
}
