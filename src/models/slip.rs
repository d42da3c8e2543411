//! Payroll slip model.
//!
//! A [`PayrollSlip`] is the per-employee, per-period payroll output. Its
//! derived values live in [`SlipFigures`] and are only ever replaced as a
//! whole by the calculation service. Status changes outside a calculation
//! go through the operator commands on this type (hold, unhold, deliver).

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::{EmploymentType, NetPercentage, PeriodStatus, TaxCalculationMethod};

/// Status of a payroll slip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlipStatus {
    /// Blocked by missing inputs or unpaid penalties.
    Pending,
    /// Complete and payable.
    Ready,
    /// Held by an operator; survives recalculation.
    Hold,
    /// Paid out.
    Delivered,
}

impl fmt::Display for SlipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlipStatus::Pending => "PENDING",
            SlipStatus::Ready => "READY",
            SlipStatus::Hold => "HOLD",
            SlipStatus::Delivered => "DELIVERED",
        };
        f.write_str(s)
    }
}

/// Every value the calculation pipeline derives for a slip.
///
/// All monetary values are rounded to whole currency units at the point
/// they are produced; recomputing on unchanged inputs reproduces them
/// exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlipFigures {
    // Employee identity, cached at calculation time.
    /// Employee code.
    pub employee_code: String,
    /// Employee full name.
    pub employee_name: String,
    /// Department name.
    pub department: String,
    /// Position code.
    pub position_code: String,
    /// Position name.
    pub position_name: String,
    /// Employment type at calculation time.
    pub employment_type: Option<EmploymentType>,
    /// Whether the employee belongs to a business department.
    pub is_sale_employee: bool,
    /// Official conversion date at calculation time.
    pub official_conversion_date: Option<NaiveDate>,

    // Contract.
    /// The contract used, if one was found.
    pub contract_id: Option<Uuid>,
    /// Base salary.
    pub base_salary: Decimal,
    /// KPI salary.
    pub kpi_salary: Decimal,
    /// Lunch allowance.
    pub lunch_allowance: Decimal,
    /// Phone allowance.
    pub phone_allowance: Decimal,
    /// Other allowances.
    pub other_allowance: Decimal,
    /// Tax method from the contract.
    pub tax_calculation_method: Option<TaxCalculationMethod>,
    /// Probation pay share from the contract.
    pub net_percentage: NetPercentage,
    /// Social insurance flag from the contract.
    pub has_social_insurance: bool,

    // KPI.
    /// KPI grade applied.
    pub kpi_grade: String,
    /// Percentage attached to the grade.
    pub kpi_percentage: Decimal,
    /// KPI bonus.
    pub kpi_bonus: Decimal,

    // Attendance.
    /// Whether a timesheet was found.
    pub has_timesheet: bool,
    /// Standard working days of the period.
    pub standard_working_days: Decimal,
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
    /// Sum of all overtime hours.
    pub total_overtime_hours: Decimal,

    // Travel.
    /// Taxable travel reimbursement.
    pub taxable_travel_expense: Decimal,
    /// Non-taxable travel reimbursement.
    pub non_taxable_travel_expense: Decimal,
    /// Travel allowance pro-rated by working days.
    pub travel_expense_by_working_days: Decimal,

    // Sales.
    /// Revenue closed in the month.
    pub sales_revenue: Decimal,
    /// Transactions closed in the month.
    pub sales_transaction_count: u32,
    /// Sales tier reached ("M0" when none).
    pub business_grade: String,
    /// Sales-tier bonus; never negative.
    pub business_progressive_salary: Decimal,

    // Income.
    /// Full monthly income of the position.
    pub total_position_income: Decimal,
    /// Income earned for the days actually worked.
    pub actual_working_days_income: Decimal,
    /// Hourly rate used for overtime.
    pub hourly_rate: Decimal,
    /// Overtime paid at the bucket multipliers.
    pub overtime_pay: Decimal,
    /// Overtime at the plain hourly rate (taxable).
    pub taxable_overtime_salary: Decimal,
    /// Premium above the plain hourly rate.
    pub overtime_progress_allowance: Decimal,
    /// Tax-exempt share of the overtime premium.
    pub non_taxable_overtime_salary: Decimal,
    /// Gross income.
    pub gross_income: Decimal,

    // Insurance.
    /// Whether insurance contributions apply.
    pub is_insurance_eligible: bool,
    /// Social insurance base after the social ceiling.
    pub social_insurance_base: Decimal,
    /// Employee social insurance.
    pub employee_social_insurance: Decimal,
    /// Employer social insurance.
    pub employer_social_insurance: Decimal,
    /// Employee health insurance.
    pub employee_health_insurance: Decimal,
    /// Employer health insurance.
    pub employer_health_insurance: Decimal,
    /// Employee unemployment insurance.
    pub employee_unemployment_insurance: Decimal,
    /// Employer unemployment insurance.
    pub employer_unemployment_insurance: Decimal,
    /// Employee union fee.
    pub employee_union_fee: Decimal,
    /// Employer union fee.
    pub employer_union_fee: Decimal,
    /// Employer accident insurance.
    pub employer_accident_insurance: Decimal,

    // Tax.
    /// Lunch and phone allowance share exempt from tax.
    pub non_taxable_allowance: Decimal,
    /// Income subject to tax before deductions.
    pub taxable_income_base: Decimal,
    /// Personal deduction applied.
    pub personal_deduction: Decimal,
    /// Number of dependents.
    pub dependent_count: u32,
    /// Total dependent deduction.
    pub dependent_deduction: Decimal,
    /// Income after deductions.
    pub taxable_income: Decimal,
    /// Personal income tax.
    pub personal_income_tax: Decimal,

    // Adjustments.
    /// Back pay owed to the employee.
    pub back_pay_amount: Decimal,
    /// Amount recovered from the employee.
    pub recovery_amount: Decimal,

    /// Net salary.
    pub net_salary: Decimal,

    // Penalties.
    /// Whether unpaid penalty tickets exist for the month.
    pub has_unpaid_penalty: bool,
    /// Number of unpaid penalty tickets.
    pub unpaid_penalty_count: u32,
}

impl SlipFigures {
    /// Sum of the four employee-side insurance contributions.
    pub fn employee_insurance_total(&self) -> Decimal {
        self.employee_social_insurance
            + self.employee_health_insurance
            + self.employee_unemployment_insurance
            + self.employee_union_fee
    }

    /// Recomputes net salary from the stored components.
    pub fn reconstructed_net_salary(&self) -> Decimal {
        self.gross_income - self.employee_insurance_total() + self.back_pay_amount
            - self.recovery_amount
            - self.personal_income_tax
    }
}

/// Represents a payroll slip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollSlip {
    /// Unique identifier.
    pub id: Uuid,
    /// The owning salary period.
    pub period_id: Uuid,
    /// The employee paid.
    pub employee_id: String,
    /// Current status.
    pub status: SlipStatus,
    /// Every missing input or blocking rule, joined with "; ".
    pub status_note: Option<String>,
    /// Why the slip is held.
    pub hold_reason: Option<String>,
    /// When the slip was held.
    pub held_at: Option<DateTime<Utc>>,
    /// Who held the slip.
    pub held_by: Option<String>,
    /// When the slip was delivered.
    pub delivered_at: Option<DateTime<Utc>>,
    /// The period the slip is paid in (not owned).
    pub payment_period_id: Option<Uuid>,
    /// When the figures were last calculated.
    pub calculated_at: Option<DateTime<Utc>>,
    /// Set when a delivered payslip must be e-mailed again.
    pub needs_resend_email: bool,
    /// When the slip was created.
    pub created_at: DateTime<Utc>,
    /// Derived values.
    pub figures: SlipFigures,
}

impl PayrollSlip {
    /// Creates a PENDING slip paid in its own period.
    pub fn new(period_id: Uuid, employee_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            period_id,
            employee_id: employee_id.into(),
            status: SlipStatus::Pending,
            status_note: None,
            hold_reason: None,
            held_at: None,
            held_by: None,
            delivered_at: None,
            payment_period_id: Some(period_id),
            calculated_at: None,
            needs_resend_email: false,
            created_at: now,
            figures: SlipFigures::default(),
        }
    }

    /// Returns true if the slip is paid in a period other than its own.
    pub fn is_carried_over(&self) -> bool {
        self.payment_period_id
            .is_some_and(|payment| payment != self.period_id)
    }

    /// Returns true if the slip can no longer change.
    ///
    /// A slip is frozen once it is delivered under a completed period.
    pub fn is_frozen(&self, period_status: PeriodStatus) -> bool {
        self.status == SlipStatus::Delivered && period_status == PeriodStatus::Completed
    }

    /// Returns true if the slip has been calculated at least once.
    pub fn has_been_calculated(&self) -> bool {
        self.calculated_at.is_some()
    }

    /// Puts the slip on hold.
    ///
    /// Legal from every status except HOLD. A frozen slip cannot be held.
    pub fn hold(
        &mut self,
        reason: &str,
        by: &str,
        period_status: PeriodStatus,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        if self.status == SlipStatus::Hold {
            return Err(EngineError::SlipAlreadyHeld { slip_id: self.id });
        }
        if self.is_frozen(period_status) {
            return Err(EngineError::SlipFrozen { slip_id: self.id });
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EngineError::HoldReasonRequired);
        }
        self.status = SlipStatus::Hold;
        self.hold_reason = Some(reason.to_string());
        self.held_at = Some(now);
        self.held_by = Some(by.to_string());
        Ok(())
    }

    /// Releases a held slip back to PENDING.
    ///
    /// The caller is expected to recalculate the slip right after, which
    /// decides its real status.
    pub fn unhold(&mut self) -> EngineResult<()> {
        if self.status != SlipStatus::Hold {
            return Err(EngineError::SlipNotHeld {
                slip_id: self.id,
                status: self.status,
            });
        }
        self.status = SlipStatus::Pending;
        self.hold_reason = None;
        self.held_at = None;
        self.held_by = None;
        Ok(())
    }

    /// Marks a READY slip as delivered in the given payment period.
    pub fn deliver(&mut self, payment_period_id: Uuid, now: DateTime<Utc>) {
        self.status = SlipStatus::Delivered;
        self.delivered_at = Some(now);
        self.payment_period_id = Some(payment_period_id);
        self.needs_resend_email = false;
    }
}
