//! Attendance lookup.

use rust_decimal::Decimal;

use crate::models::{AuditStep, Timesheet};

/// Working days and overtime hours for the month.
///
/// Every field is zero when no timesheet exists.
#[derive(Debug, Clone)]
pub struct AttendanceSummary {
    /// Whether a timesheet was found.
    pub found: bool,
    /// Days worked as official.
    pub official_working_days: Decimal,
    /// Days worked on probation.
    pub probation_working_days: Decimal,
    /// Total days worked.
    pub total_working_days: Decimal,
    /// Weekday overtime hours.
    pub weekday_overtime_hours: Decimal,
    /// Weekend overtime hours.
    pub weekend_overtime_hours: Decimal,
    /// Holiday overtime hours.
    pub holiday_overtime_hours: Decimal,
    /// The audit step recording this lookup.
    pub audit_step: AuditStep,
}

impl AttendanceSummary {
    /// Sum of the three overtime buckets.
    pub fn total_overtime_hours(&self) -> Decimal {
        self.weekday_overtime_hours + self.weekend_overtime_hours + self.holiday_overtime_hours
    }
}

/// Summarizes the month's timesheet.
pub fn summarize_attendance(timesheet: Option<&Timesheet>, step_number: u32) -> AttendanceSummary {
    let (found, days, overtime) = match timesheet {
        Some(t) => (
            true,
            [
                t.official_working_days,
                t.probation_working_days,
                t.total_working_days,
            ],
            [
                t.weekday_overtime_hours,
                t.weekend_overtime_hours,
                t.holiday_overtime_hours,
            ],
        ),
        None => (false, [Decimal::ZERO; 3], [Decimal::ZERO; 3]),
    };

    let reasoning = if found {
        format!(
            "{} days worked ({} official, {} probation), {} overtime hours",
            days[2],
            days[0],
            days[1],
            overtime.iter().copied().sum::<Decimal>()
        )
    } else {
        "No timesheet found; working days and overtime default to zero".to_string()
    };

    let audit_step = AuditStep::new(
        step_number,
        "attendance",
        "Attendance",
        serde_json::json!({ "timesheet_found": found }),
        serde_json::json!({
            "official_working_days": days[0].to_string(),
            "probation_working_days": days[1].to_string(),
            "total_working_days": days[2].to_string(),
            "weekday_overtime_hours": overtime[0].to_string(),
            "weekend_overtime_hours": overtime[1].to_string(),
            "holiday_overtime_hours": overtime[2].to_string(),
        }),
        reasoning,
    );

    AttendanceSummary {
        found,
        official_working_days: days[0],
        probation_working_days: days[1],
        total_working_days: days[2],
        weekday_overtime_hours: overtime[0],
        weekend_overtime_hours: overtime[1],
        holiday_overtime_hours: overtime[2],
        audit_step,
    }
}
