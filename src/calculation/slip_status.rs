//! Slip status determination.
//!
//! The next status is looked up in an explicit transition table keyed by
//! the slip's current status, the owning period's status and whether the
//! slip's inputs are complete. HOLD is sticky, and DELIVERED only reverts
//! to READY while its period is ONGOING.

use std::fmt;

use crate::models::{AuditStep, PayMonth, PeriodStatus, SlipStatus};

/// A condition that keeps a slip from becoming payable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockingReason {
    /// No contract applies for the month.
    MissingContract(PayMonth),
    /// No timesheet exists for the month.
    MissingTimesheet(PayMonth),
    /// Unpaid penalty tickets exist for the month.
    UnpaidPenalties(u32),
}

impl fmt::Display for BlockingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockingReason::MissingContract(month) => {
                write!(f, "No contract found for {}", month)
            }
            BlockingReason::MissingTimesheet(month) => {
                write!(f, "No timesheet found for {}", month)
            }
            BlockingReason::UnpaidPenalties(count) => {
                write!(f, "{} unpaid penalty ticket(s)", count)
            }
        }
    }
}

/// An input that was missing but does not block payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// No KPI grade; the default grade was used.
    KpiGradeDefaulted(String),
    /// A sales-position employee had no sales revenue.
    NoSalesRevenue,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::KpiGradeDefaulted(grade) => {
                write!(f, "No KPI assessment; grade defaulted to {}", grade)
            }
            Notice::NoSalesRevenue => f.write_str("No sales revenue recorded"),
        }
    }
}

/// Whether every required input was present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// Contract and timesheet exist and no penalty is unpaid.
    Complete,
    /// At least one blocking reason applies.
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Keep,
    Become(SlipStatus),
}

use Completeness::{Blocked, Complete};
use Outcome::{Become, Keep};
use PeriodStatus::{Completed, Ongoing};
use SlipStatus::{Delivered, Hold, Pending, Ready};

/// Every (current, period, completeness) combination.
///
/// DELIVERED under COMPLETED is frozen; calculation never reaches the table
/// for it, and the table keeps it unchanged regardless.
const TRANSITIONS: [(SlipStatus, PeriodStatus, Completeness, Outcome); 16] = [
    (Pending, Ongoing, Complete, Become(Ready)),
    (Pending, Ongoing, Blocked, Become(Pending)),
    (Pending, Completed, Complete, Become(Ready)),
    (Pending, Completed, Blocked, Become(Pending)),
    (Ready, Ongoing, Complete, Keep),
    (Ready, Ongoing, Blocked, Become(Pending)),
    (Ready, Completed, Complete, Keep),
    (Ready, Completed, Blocked, Become(Pending)),
    (Hold, Ongoing, Complete, Keep),
    (Hold, Ongoing, Blocked, Keep),
    (Hold, Completed, Complete, Keep),
    (Hold, Completed, Blocked, Keep),
    (Delivered, Ongoing, Complete, Become(Ready)),
    (Delivered, Ongoing, Blocked, Become(Pending)),
    (Delivered, Completed, Complete, Keep),
    (Delivered, Completed, Blocked, Keep),
];

/// Looks up the next status.
pub fn next_status(
    current: SlipStatus,
    period_status: PeriodStatus,
    completeness: Completeness,
) -> SlipStatus {
    TRANSITIONS
        .iter()
        .find(|(from, period, complete, _)| {
            *from == current && *period == period_status && *complete == completeness
        })
        .map_or(current, |(_, _, _, outcome)| match outcome {
            Keep => current,
            Become(status) => *status,
        })
}

/// Joins blocking reasons and notices into a status note.
pub fn compose_status_note(blocking: &[BlockingReason], notices: &[Notice]) -> Option<String> {
    let parts: Vec<String> = blocking
        .iter()
        .map(ToString::to_string)
        .chain(notices.iter().map(ToString::to_string))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// The status decision for a slip.
#[derive(Debug, Clone)]
pub struct StatusDecision {
    /// The new status.
    pub status: SlipStatus,
    /// The new note.
    pub note: Option<String>,
    /// The audit step recording this decision.
    pub audit_step: AuditStep,
}

/// Decides a slip's status and note.
///
/// A held slip keeps its status and its existing note.
pub fn determine_status(
    current: SlipStatus,
    current_note: Option<&str>,
    period_status: PeriodStatus,
    blocking: &[BlockingReason],
    notices: &[Notice],
    step_number: u32,
) -> StatusDecision {
    let completeness = if blocking.is_empty() {
        Complete
    } else {
        Blocked
    };
    let status = next_status(current, period_status, completeness);
    let note = if current == Hold {
        current_note.map(str::to_string)
    } else {
        compose_status_note(blocking, notices)
    };

    let reasoning = if current == Hold {
        "Slip is on hold; status unchanged".to_string()
    } else if status == current {
        format!("Status stays {}", status)
    } else {
        format!("Status {} -> {}", current, status)
    };

    let audit_step = AuditStep::new(
        step_number,
        "slip_status",
        "Slip Status",
        serde_json::json!({
            "current_status": current,
            "period_status": period_status,
            "blocking_reasons": blocking.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }),
        serde_json::json!({
            "status": status,
            "status_note": note,
        }),
        reasoning,
    );

    StatusDecision {
        status,
        note,
        audit_step,
    }
}
