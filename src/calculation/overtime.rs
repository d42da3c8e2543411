//! Overtime pay calculation.
//!
//! Overtime hours are paid at the bucket multipliers. The part paid at the
//! plain hourly rate is taxable; the premium above it is tax-exempt up to
//! twice the taxable part.

use rust_decimal::Decimal;

use crate::config::OvertimeMultipliers;
use crate::models::AuditStep;

use super::round_money;

/// Overtime hours per bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct OvertimeHours {
    /// Weekday hours.
    pub weekday: Decimal,
    /// Weekend hours.
    pub weekend: Decimal,
    /// Public holiday hours.
    pub holiday: Decimal,
}

impl OvertimeHours {
    /// Sum of all buckets.
    pub fn total(&self) -> Decimal {
        self.weekday + self.weekend + self.holiday
    }
}

/// The result of the overtime stage.
#[derive(Debug, Clone)]
pub struct OvertimeResult {
    /// Total overtime hours.
    pub total_hours: Decimal,
    /// Overtime paid at the bucket multipliers.
    pub overtime_pay: Decimal,
    /// Overtime at the plain hourly rate.
    pub taxable_overtime_salary: Decimal,
    /// Premium above the plain rate.
    pub overtime_progress_allowance: Decimal,
    /// Tax-exempt share of the premium.
    pub non_taxable_overtime_salary: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates overtime pay and its taxable split.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{calculate_overtime, OvertimeHours};
/// use payroll_engine::config::OvertimeMultipliers;
/// use rust_decimal::Decimal;
///
/// let multipliers = OvertimeMultipliers {
///     weekday: Decimal::new(15, 1),
///     weekend: Decimal::new(2, 0),
///     holiday: Decimal::new(3, 0),
/// };
/// let hours = OvertimeHours { weekday: Decimal::new(2, 0), ..Default::default() };
/// let result = calculate_overtime(hours, Decimal::new(100_000, 0), &multipliers, 10);
/// assert_eq!(result.overtime_pay, Decimal::new(300_000, 0));
/// assert_eq!(result.taxable_overtime_salary, Decimal::new(200_000, 0));
/// assert_eq!(result.non_taxable_overtime_salary, Decimal::new(100_000, 0));
/// ```
pub fn calculate_overtime(
    hours: OvertimeHours,
    hourly_rate: Decimal,
    multipliers: &OvertimeMultipliers,
    step_number: u32,
) -> OvertimeResult {
    let total_hours = hours.total();
    let overtime_pay = round_money(
        hours.weekday * hourly_rate * multipliers.weekday
            + hours.weekend * hourly_rate * multipliers.weekend
            + hours.holiday * hourly_rate * multipliers.holiday,
    );
    let taxable_overtime_salary = round_money(total_hours * hourly_rate);
    let overtime_progress_allowance = (overtime_pay - taxable_overtime_salary).max(Decimal::ZERO);
    let cap = taxable_overtime_salary * Decimal::TWO;
    let capped = overtime_progress_allowance > cap;
    let non_taxable_overtime_salary = overtime_progress_allowance.min(cap);

    let reasoning = if total_hours.is_zero() {
        "No overtime worked".to_string()
    } else {
        format!(
            "{} hours at {}/hr: pay {}, taxable {}, premium {}{}",
            total_hours,
            hourly_rate,
            overtime_pay,
            taxable_overtime_salary,
            overtime_progress_allowance,
            if capped {
                format!(", tax-exempt part capped at {}", cap)
            } else {
                String::new()
            }
        )
    };

    let audit_step = AuditStep::new(
        step_number,
        "overtime",
        "Overtime",
        serde_json::json!({
            "weekday_hours": hours.weekday.to_string(),
            "weekend_hours": hours.weekend.to_string(),
            "holiday_hours": hours.holiday.to_string(),
            "hourly_rate": hourly_rate.to_string(),
        }),
        serde_json::json!({
            "overtime_pay": overtime_pay.to_string(),
            "taxable_overtime_salary": taxable_overtime_salary.to_string(),
            "overtime_progress_allowance": overtime_progress_allowance.to_string(),
            "non_taxable_overtime_salary": non_taxable_overtime_salary.to_string(),
        }),
        reasoning,
    );

    OvertimeResult {
        total_hours,
        overtime_pay,
        taxable_overtime_salary,
        overtime_progress_allowance,
        non_taxable_overtime_salary,
        audit_step,
    }
}
