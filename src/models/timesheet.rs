//! Monthly attendance records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PayMonth;

/// An employee's attendance summary for one month.
///
/// Day counts are decimals because half days are common.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timesheet {
    /// The employee the timesheet belongs to.
    pub employee_id: String,
    /// The month covered.
    pub month: PayMonth,
    /// Days worked as an official employee.
    pub official_working_days: Decimal,
    /// Days worked while on probation.
    pub probation_working_days: Decimal,
    /// Total days worked.
    pub total_working_days: Decimal,
    /// Overtime hours on weekdays.
    #[serde(default)]
    pub weekday_overtime_hours: Decimal,
    /// Overtime hours on weekends.
    #[serde(default)]
    pub weekend_overtime_hours: Decimal,
    /// Overtime hours on public holidays.
    #[serde(default)]
    pub holiday_overtime_hours: Decimal,
}

impl Timesheet {
    /// Sum of the three overtime buckets.
    pub fn total_overtime_hours(&self) -> Decimal {
        self.weekday_overtime_hours + self.weekend_overtime_hours + self.holiday_overtime_hours
    }
}

/// KPI grades assigned to an employee for one month.
///
/// The HR grade wins over the manager grade when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiAssessment {
    /// The employee assessed.
    pub employee_id: String,
    /// The month assessed.
    pub month: PayMonth,
    /// Grade given by the line manager.
    #[serde(default)]
    pub manager_grade: Option<String>,
    /// Grade confirmed by HR.
    #[serde(default)]
    pub hr_grade: Option<String>,
}
