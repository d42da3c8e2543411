//! Personal income tax.
//!
//! Three methods are supported, chosen by the contract:
//!
//! - none: no tax is withheld.
//! - progressive: gross income less the exempt parts and deductions is
//!   taxed bracket by bracket.
//! - flat 10%: the flat rate applies to gross income at or above the
//!   policy minimum.

use rust_decimal::Decimal;

use crate::config::{ConfigSnapshot, TaxBracket};
use crate::error::EngineResult;
use crate::models::{AuditStep, TaxCalculationMethod};

use super::{round_money, PROBATION_FACTOR};

/// Inputs to the income tax stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncomeTaxInputs {
    /// Gross income.
    pub gross_income: Decimal,
    /// Non-taxable travel reimbursements.
    pub non_taxable_travel_expense: Decimal,
    /// Sum of the employee insurance contributions.
    pub employee_insurance: Decimal,
    /// Tax-exempt overtime premium.
    pub non_taxable_overtime_salary: Decimal,
    /// Lunch allowance.
    pub lunch_allowance: Decimal,
    /// Phone allowance.
    pub phone_allowance: Decimal,
    /// Days worked as official.
    pub official_working_days: Decimal,
    /// Days worked on probation.
    pub probation_working_days: Decimal,
    /// Standard working days.
    pub standard_working_days: Decimal,
    /// Registered dependents.
    pub dependent_count: u32,
}

/// The result of the income tax stage.
#[derive(Debug, Clone)]
pub struct IncomeTaxResult {
    /// The method applied.
    pub method: TaxCalculationMethod,
    /// Lunch and phone allowance share exempt from tax.
    pub non_taxable_allowance: Decimal,
    /// Income subject to tax before deductions.
    pub taxable_income_base: Decimal,
    /// Personal deduction applied.
    pub personal_deduction: Decimal,
    /// Dependent deduction applied.
    pub dependent_deduction: Decimal,
    /// Income after deductions.
    pub taxable_income: Decimal,
    /// Tax withheld.
    pub personal_income_tax: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Exempt share of the lunch and phone allowances for the days worked.
pub fn calculate_non_taxable_allowance(inputs: &IncomeTaxInputs) -> Decimal {
    if inputs.standard_working_days.is_zero() {
        return Decimal::ZERO;
    }
    let days =
        inputs.probation_working_days * PROBATION_FACTOR + inputs.official_working_days;
    round_money(
        (inputs.lunch_allowance + inputs.phone_allowance) * days / inputs.standard_working_days,
    )
}

/// Applies progressive brackets to a taxable income.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::progressive_tax;
/// use payroll_engine::config::TaxBracket;
/// use rust_decimal::Decimal;
///
/// let brackets = vec![
///     TaxBracket { upper_bound: Some(Decimal::new(5_000_000, 0)), rate: Decimal::new(5, 2) },
///     TaxBracket { upper_bound: None, rate: Decimal::new(10, 2) },
/// ];
/// assert_eq!(progressive_tax(Decimal::new(7_000_000, 0), &brackets), Decimal::new(450_000, 0));
/// ```
pub fn progressive_tax(taxable_income: Decimal, brackets: &[TaxBracket]) -> Decimal {
    let mut tax = Decimal::ZERO;
    let mut lower = Decimal::ZERO;
    for bracket in brackets {
        let upper = bracket
            .upper_bound
            .map_or(taxable_income, |bound| bound.min(taxable_income));
        if upper <= lower {
            break;
        }
        tax += (upper - lower) * bracket.rate;
        match bracket.upper_bound {
            Some(bound) => lower = bound,
            None => break,
        }
    }
    round_money(tax)
}

/// Calculates personal income tax.
///
/// Fails only when the progressive method is used and the snapshot has no
/// brackets.
pub fn calculate_income_tax(
    method: Option<TaxCalculationMethod>,
    inputs: &IncomeTaxInputs,
    snapshot: &ConfigSnapshot,
    step_number: u32,
) -> EngineResult<IncomeTaxResult> {
    let method = method.unwrap_or(TaxCalculationMethod::None);

    let mut non_taxable_allowance = Decimal::ZERO;
    let mut taxable_income_base = Decimal::ZERO;
    let mut personal_deduction = Decimal::ZERO;
    let mut dependent_deduction = Decimal::ZERO;
    let mut taxable_income = Decimal::ZERO;
    let mut tax = Decimal::ZERO;

    let reasoning = match method {
        TaxCalculationMethod::None => "Contract withholds no income tax".to_string(),
        TaxCalculationMethod::Progressive => {
            let brackets = snapshot.tax_brackets()?;
            non_taxable_allowance = calculate_non_taxable_allowance(inputs);
            taxable_income_base = inputs.gross_income
                - inputs.non_taxable_travel_expense
                - inputs.employee_insurance
                - inputs.non_taxable_overtime_salary
                - non_taxable_allowance;
            personal_deduction = snapshot.tax.personal_deduction;
            dependent_deduction =
                snapshot.tax.dependent_deduction * Decimal::from(inputs.dependent_count);
            taxable_income =
                (taxable_income_base - personal_deduction - dependent_deduction).max(Decimal::ZERO);
            tax = progressive_tax(taxable_income, brackets);
            format!(
                "Taxable base {} less deductions {} = {}; progressive tax {}",
                taxable_income_base,
                personal_deduction + dependent_deduction,
                taxable_income,
                tax
            )
        }
        TaxCalculationMethod::Flat10 => {
            taxable_income_base = inputs.gross_income;
            taxable_income = inputs.gross_income;
            if inputs.gross_income >= snapshot.tax.flat_minimum {
                tax = round_money(inputs.gross_income * snapshot.tax.flat_rate);
                format!(
                    "Flat {}% of gross {} = {}",
                    snapshot.tax.flat_rate * Decimal::ONE_HUNDRED,
                    inputs.gross_income,
                    tax
                )
            } else {
                format!(
                    "Gross {} is below the flat withholding minimum {}",
                    inputs.gross_income, snapshot.tax.flat_minimum
                )
            }
        }
    };

    let audit_step = AuditStep::new(
        step_number,
        "income_tax",
        "Personal Income Tax",
        serde_json::json!({
            "method": method,
            "gross_income": inputs.gross_income.to_string(),
            "employee_insurance": inputs.employee_insurance.to_string(),
            "non_taxable_travel_expense": inputs.non_taxable_travel_expense.to_string(),
            "non_taxable_overtime_salary": inputs.non_taxable_overtime_salary.to_string(),
            "dependent_count": inputs.dependent_count,
        }),
        serde_json::json!({
            "non_taxable_allowance": non_taxable_allowance.to_string(),
            "taxable_income_base": taxable_income_base.to_string(),
            "taxable_income": taxable_income.to_string(),
            "personal_income_tax": tax.to_string(),
        }),
        reasoning,
    );

    Ok(IncomeTaxResult {
        method,
        non_taxable_allowance,
        taxable_income_base,
        personal_deduction,
        dependent_deduction,
        taxable_income,
        personal_income_tax: tax,
        audit_step,
    })
}
