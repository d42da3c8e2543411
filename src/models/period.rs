//! Salary period model.
//!
//! A [`SalaryPeriod`] is the monthly aggregate root: it owns the policy
//! snapshot, the rollup statistics and the ONGOING ⇄ COMPLETED lifecycle.
//! Slips are stored separately and reference their period by id.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfigSnapshot;
use crate::error::{EngineError, EngineResult};

use super::PayMonth;

/// Lifecycle status of a salary period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    /// Open for calculation and edits.
    Ongoing,
    /// Closed; month-keyed records are read-only.
    Completed,
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodStatus::Ongoing => f.write_str("ONGOING"),
            PeriodStatus::Completed => f.write_str("COMPLETED"),
        }
    }
}

/// Optional deadlines attached to a period.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodDeadlines {
    /// Last day for salary proposals.
    #[serde(default)]
    pub proposal_deadline: Option<NaiveDate>,
    /// Last day for KPI assessments.
    #[serde(default)]
    pub kpi_assessment_deadline: Option<NaiveDate>,
    /// Planned payment date.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

/// Rollup counters recomputed from scratch by the statistics aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodStatistics {
    /// Number of slips owned by the period.
    pub total_slips: u32,
    /// Slips in PENDING.
    pub pending_count: u32,
    /// Slips in READY.
    pub ready_count: u32,
    /// Slips in HOLD.
    pub hold_count: u32,
    /// Slips in DELIVERED.
    pub delivered_count: u32,
    /// PENDING + HOLD, plus READY when the period is completed.
    pub deferred_count: u32,
    /// Sum of gross income across slips.
    pub total_gross_income: Decimal,
    /// Sum of net salary across slips.
    pub total_net_salary: Decimal,
    /// Recovery vouchers in the month.
    pub recovery_voucher_count: u32,
    /// Unpaid penalty tickets in the month.
    pub unpaid_penalty_count: u32,
    /// Paid penalty tickets in the month.
    pub paid_penalty_count: u32,
    /// Travel expenses in the month.
    pub travel_expense_count: u32,
    /// Slips whose payslip e-mail must be sent again.
    pub resend_email_count: u32,
}

/// Represents a monthly salary period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryPeriod {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-facing code (e.g., "SAL-2025-03").
    pub code: String,
    /// The month covered; unique across periods.
    pub month: PayMonth,
    /// Lifecycle status.
    pub status: PeriodStatus,
    /// Policy snapshot captured at creation.
    snapshot: Option<ConfigSnapshot>,
    /// Standard working days used to pro-rate income.
    pub standard_working_days: Decimal,
    /// Deadlines.
    pub deadlines: PeriodDeadlines,
    /// Rollup statistics.
    pub statistics: PeriodStatistics,
    /// When the period was created.
    pub created_at: DateTime<Utc>,
    /// When the period was last completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Who last completed the period.
    pub completed_by: Option<String>,
    /// When the period was last reopened.
    pub uncompleted_at: Option<DateTime<Utc>>,
}

impl SalaryPeriod {
    /// Creates an ONGOING period.
    pub fn new(
        month: PayMonth,
        snapshot: Option<ConfigSnapshot>,
        standard_working_days: Decimal,
        deadlines: PeriodDeadlines,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: Self::code_for(month),
            month,
            status: PeriodStatus::Ongoing,
            snapshot,
            standard_working_days,
            deadlines,
            statistics: PeriodStatistics::default(),
            created_at: now,
            completed_at: None,
            completed_by: None,
            uncompleted_at: None,
        }
    }

    /// The period code for a month.
    ///
    /// ```
    /// use payroll_engine::models::{PayMonth, SalaryPeriod};
    ///
    /// assert_eq!(SalaryPeriod::code_for(PayMonth::new(2025, 3).unwrap()), "SAL-2025-03");
    /// ```
    pub fn code_for(month: PayMonth) -> String {
        format!("SAL-{}", month)
    }

    /// Returns the policy snapshot or a configuration error.
    pub fn snapshot(&self) -> EngineResult<&ConfigSnapshot> {
        self.snapshot
            .as_ref()
            .ok_or(EngineError::MissingSnapshot { period_id: self.id })
    }

    /// Returns true if the period has a snapshot.
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Returns true if the period is completed.
    pub fn is_completed(&self) -> bool {
        self.status == PeriodStatus::Completed
    }

    /// Moves the period to COMPLETED.
    pub fn mark_completed(&mut self, by: &str, now: DateTime<Utc>) -> EngineResult<()> {
        if self.is_completed() {
            return Err(EngineError::PeriodAlreadyCompleted {
                code: self.code.clone(),
            });
        }
        self.status = PeriodStatus::Completed;
        self.completed_at = Some(now);
        self.completed_by = Some(by.to_string());
        Ok(())
    }

    /// Moves the period back to ONGOING.
    ///
    /// Whether newer periods exist is checked by the caller, which can see
    /// every period.
    pub fn mark_uncompleted(&mut self, now: DateTime<Utc>) -> EngineResult<()> {
        if !self.is_completed() {
            return Err(EngineError::PeriodNotCompleted {
                code: self.code.clone(),
            });
        }
        self.status = PeriodStatus::Ongoing;
        self.uncompleted_at = Some(now);
        Ok(())
    }
}
