//! Position income, worked-days income, hourly rate and gross income.

use rust_decimal::Decimal;

use crate::models::{AuditStep, NetPercentage};

use super::{round_money, round_rate, PROBATION_FACTOR, STANDARD_HOURS_PER_DAY};

/// Components of the full monthly income of a position.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionIncomeComponents {
    /// Base salary.
    pub base_salary: Decimal,
    /// Lunch allowance.
    pub lunch_allowance: Decimal,
    /// Phone allowance.
    pub phone_allowance: Decimal,
    /// Other allowances.
    pub other_allowance: Decimal,
    /// KPI salary.
    pub kpi_salary: Decimal,
    /// KPI bonus.
    pub kpi_bonus: Decimal,
    /// Sales bonus.
    pub business_progressive_salary: Decimal,
    /// Travel allowance pro-rated by working days.
    pub travel_expense_by_working_days: Decimal,
}

/// The result of an income stage.
#[derive(Debug, Clone)]
pub struct IncomeResult {
    /// The computed amount.
    pub amount: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Sums the full monthly income of the position.
pub fn calculate_total_position_income(
    components: &PositionIncomeComponents,
    step_number: u32,
) -> IncomeResult {
    let amount = round_money(
        components.base_salary
            + components.lunch_allowance
            + components.phone_allowance
            + components.other_allowance
            + components.kpi_salary
            + components.kpi_bonus
            + components.business_progressive_salary
            + components.travel_expense_by_working_days,
    );

    let audit_step = AuditStep::new(
        step_number,
        "total_position_income",
        "Total Position Income",
        serde_json::json!({
            "base_salary": components.base_salary.to_string(),
            "lunch_allowance": components.lunch_allowance.to_string(),
            "phone_allowance": components.phone_allowance.to_string(),
            "other_allowance": components.other_allowance.to_string(),
            "kpi_salary": components.kpi_salary.to_string(),
            "kpi_bonus": components.kpi_bonus.to_string(),
            "business_progressive_salary": components.business_progressive_salary.to_string(),
            "travel_expense_by_working_days": components.travel_expense_by_working_days.to_string(),
        }),
        serde_json::json!({ "total_position_income": amount.to_string() }),
        format!("Total position income {}", amount),
    );

    IncomeResult { amount, audit_step }
}

/// Pro-rates the position income by the days actually worked.
///
/// Probation days are paid at 85% when the contract's net percentage is
/// reduced. Zero standard working days yields zero income.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_actual_working_days_income;
/// use payroll_engine::models::NetPercentage;
/// use rust_decimal::Decimal;
///
/// let result = calculate_actual_working_days_income(
///     Decimal::new(21_000_000, 0),
///     Decimal::new(10, 0),
///     Decimal::ZERO,
///     Decimal::new(21, 0),
///     NetPercentage::Full,
///     8,
/// );
/// assert_eq!(result.amount, Decimal::new(10_000_000, 0));
/// ```
pub fn calculate_actual_working_days_income(
    total_position_income: Decimal,
    official_working_days: Decimal,
    probation_working_days: Decimal,
    standard_working_days: Decimal,
    net_percentage: NetPercentage,
    step_number: u32,
) -> IncomeResult {
    let probation_factor = match net_percentage {
        NetPercentage::Reduced => PROBATION_FACTOR,
        NetPercentage::Full => Decimal::ONE,
    };

    let (amount, reasoning) = if standard_working_days.is_zero() {
        (
            Decimal::ZERO,
            "Standard working days is zero; no income earned".to_string(),
        )
    } else {
        let earned = official_working_days * total_position_income
            + probation_working_days * total_position_income * probation_factor;
        let amount = round_money(earned / standard_working_days);
        (
            amount,
            format!(
                "({} official days + {} probation days × {}) / {} standard days of {} = {}",
                official_working_days,
                probation_working_days,
                probation_factor,
                standard_working_days,
                total_position_income,
                amount
            ),
        )
    };

    let audit_step = AuditStep::new(
        step_number,
        "actual_working_days_income",
        "Actual Working Days Income",
        serde_json::json!({
            "total_position_income": total_position_income.to_string(),
            "official_working_days": official_working_days.to_string(),
            "probation_working_days": probation_working_days.to_string(),
            "standard_working_days": standard_working_days.to_string(),
            "probation_factor": probation_factor.to_string(),
        }),
        serde_json::json!({ "actual_working_days_income": amount.to_string() }),
        reasoning,
    );

    IncomeResult { amount, audit_step }
}

/// Derives the hourly rate used for overtime, rounded to two places.
///
/// Probationary employees' rate is reduced to 85%.
pub fn calculate_hourly_rate(
    total_position_income: Decimal,
    is_probationary: bool,
    standard_working_days: Decimal,
    step_number: u32,
) -> IncomeResult {
    let factor = if is_probationary {
        PROBATION_FACTOR
    } else {
        Decimal::ONE
    };
    let hours = standard_working_days * STANDARD_HOURS_PER_DAY;
    let amount = if hours.is_zero() {
        Decimal::ZERO
    } else {
        round_rate(total_position_income * factor / hours)
    };

    let audit_step = AuditStep::new(
        step_number,
        "hourly_rate",
        "Hourly Rate",
        serde_json::json!({
            "total_position_income": total_position_income.to_string(),
            "is_probationary": is_probationary,
            "standard_hours": hours.to_string(),
        }),
        serde_json::json!({ "hourly_rate": amount.to_string() }),
        format!(
            "{} × {} / {} standard hours = {}/hr",
            total_position_income, factor, hours, amount
        ),
    );

    IncomeResult { amount, audit_step }
}

/// Components of gross income.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrossIncomeComponents {
    /// Income for the days worked.
    pub actual_working_days_income: Decimal,
    /// Overtime at the plain rate.
    pub taxable_overtime_salary: Decimal,
    /// Tax-exempt overtime premium.
    pub non_taxable_overtime_salary: Decimal,
    /// Taxable travel reimbursements.
    pub taxable_travel_expense: Decimal,
    /// Non-taxable travel reimbursements.
    pub non_taxable_travel_expense: Decimal,
}

/// Sums gross income.
pub fn calculate_gross_income(
    components: &GrossIncomeComponents,
    step_number: u32,
) -> IncomeResult {
    let amount = round_money(
        components.actual_working_days_income
            + components.taxable_overtime_salary
            + components.non_taxable_overtime_salary
            + components.taxable_travel_expense
            + components.non_taxable_travel_expense,
    );

    let audit_step = AuditStep::new(
        step_number,
        "gross_income",
        "Gross Income",
        serde_json::json!({
            "actual_working_days_income": components.actual_working_days_income.to_string(),
            "taxable_overtime_salary": components.taxable_overtime_salary.to_string(),
            "non_taxable_overtime_salary": components.non_taxable_overtime_salary.to_string(),
            "taxable_travel_expense": components.taxable_travel_expense.to_string(),
            "non_taxable_travel_expense": components.non_taxable_travel_expense.to_string(),
        }),
        serde_json::json!({ "gross_income": amount.to_string() }),
        format!("Gross income {}", amount),
    );

    IncomeResult { amount, audit_step }
}
