//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every condition that can stop a payroll command. Missing provider
//! inputs such as a contract or timesheet are not errors: they degrade to
//! zero values and are reported through the slip's status note.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{PayMonth, SlipStatus};

/// The main error type for the payroll engine.
///
/// Variants fall into three groups: configuration errors (fatal for the
/// slip being calculated and for any batch containing it), invariant
/// violations (returned synchronously to the caller of a command), and
/// lookups of records that do not exist.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/policy.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/policy.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No policy version is effective for the requested month.
    #[error("No policy version is effective for {month}")]
    PolicyVersionNotFound {
        /// The month that has no effective policy.
        month: PayMonth,
    },

    /// A salary period has no configuration snapshot attached.
    #[error("Salary period {period_id} has no configuration snapshot")]
    MissingSnapshot {
        /// The period lacking a snapshot.
        period_id: Uuid,
    },

    /// A snapshot is missing a list the pipeline needs.
    #[error("Configuration snapshot is missing '{section}'")]
    MissingPolicySection {
        /// The dotted path of the missing section (e.g. "tax.brackets").
        section: String,
    },

    /// A second salary period was requested for the same month.
    #[error("A salary period already exists for {month}")]
    DuplicatePeriod {
        /// The month that already has a period.
        month: PayMonth,
    },

    /// A second slip was requested for the same employee in a period.
    #[error("Employee '{employee_id}' already has a slip in period {period_id}")]
    DuplicateSlip {
        /// The owning period.
        period_id: Uuid,
        /// The employee that already has a slip.
        employee_id: String,
    },

    /// The slip is already on hold.
    #[error("Payroll slip {slip_id} is already on hold")]
    SlipAlreadyHeld {
        /// The held slip.
        slip_id: Uuid,
    },

    /// The slip is not on hold.
    #[error("Payroll slip {slip_id} is not on hold (status {status})")]
    SlipNotHeld {
        /// The slip that was asked to be released.
        slip_id: Uuid,
        /// The slip's current status.
        status: SlipStatus,
    },

    /// A hold was requested without a reason.
    #[error("A reason is required to hold a payroll slip")]
    HoldReasonRequired,

    /// The slip is delivered under a completed period and cannot change.
    #[error("Payroll slip {slip_id} is delivered in a completed period and is frozen")]
    SlipFrozen {
        /// The frozen slip.
        slip_id: Uuid,
    },

    /// The slip has been calculated and can no longer be deleted.
    #[error("Payroll slip {slip_id} has already been calculated and cannot be deleted")]
    SlipAlreadyCalculated {
        /// The slip that was asked to be deleted.
        slip_id: Uuid,
    },

    /// The period cannot be reopened because later periods exist.
    #[error("Cannot uncomplete salary period {code}: newer salary periods exist")]
    NewerPeriodsExist {
        /// The code of the period that was asked to reopen.
        code: String,
    },

    /// The period must be completed for this command.
    #[error("Salary period {code} is not completed")]
    PeriodNotCompleted {
        /// The period code.
        code: String,
    },

    /// The period is already completed.
    #[error("Salary period {code} is already completed")]
    PeriodAlreadyCompleted {
        /// The period code.
        code: String,
    },

    /// A month-keyed record was changed while its month is closed.
    #[error("Cannot modify {record} for {month}: the salary period is completed")]
    PeriodLocked {
        /// The month whose period is completed.
        month: PayMonth,
        /// The kind of record that was rejected (e.g. "travel expense").
        record: String,
    },

    /// A penalty ticket in a closed month was changed beyond UNPAID→PAID.
    #[error("Penalty ticket {ticket_id} for {month} may only be marked as paid")]
    PenaltyTicketLocked {
        /// The ticket that was rejected.
        ticket_id: Uuid,
        /// The ticket's month.
        month: PayMonth,
    },

    /// The salary period was not found.
    #[error("Salary period not found: {period_id}")]
    PeriodNotFound {
        /// The missing period id.
        period_id: Uuid,
    },

    /// The payroll slip was not found.
    #[error("Payroll slip not found: {slip_id}")]
    SlipNotFound {
        /// The missing slip id.
        slip_id: Uuid,
    },

    /// The employee was not found.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The missing employee id.
        employee_id: String,
    },

    /// A month-keyed record was not found.
    #[error("{record} not found: {id}")]
    RecordNotFound {
        /// The kind of record.
        record: String,
        /// The missing id.
        id: Uuid,
    },

    /// A batch recalculation was cancelled before it finished.
    #[error("Batch recalculation of period {period_id} was cancelled")]
    BatchCancelled {
        /// The period being recalculated.
        period_id: Uuid,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Returns true for errors caused by the policy configuration.
    ///
    /// These abort the slip without writes and halt a containing batch.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            EngineError::ConfigNotFound { .. }
                | EngineError::ConfigParseError { .. }
                | EngineError::PolicyVersionNotFound { .. }
                | EngineError::MissingSnapshot { .. }
                | EngineError::MissingPolicySection { .. }
        )
    }

    /// Returns true for violated lifecycle or protection invariants.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            EngineError::DuplicatePeriod { .. }
                | EngineError::DuplicateSlip { .. }
                | EngineError::SlipAlreadyHeld { .. }
                | EngineError::SlipNotHeld { .. }
                | EngineError::HoldReasonRequired
                | EngineError::SlipFrozen { .. }
                | EngineError::SlipAlreadyCalculated { .. }
                | EngineError::NewerPeriodsExist { .. }
                | EngineError::PeriodNotCompleted { .. }
                | EngineError::PeriodAlreadyCompleted { .. }
                | EngineError::PeriodLocked { .. }
                | EngineError::PenaltyTicketLocked { .. }
        )
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/policy.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/policy.yaml"
        );
    }

    #[test]
    fn test_newer_periods_exist_names_reason() {
        let error = EngineError::NewerPeriodsExist {
            code: "SAL-2025-03".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot uncomplete salary period SAL-2025-03: newer salary periods exist"
        );
    }

    #[test]
    fn test_period_locked_displays_month_and_record() {
        let error = EngineError::PeriodLocked {
            month: PayMonth::new(2025, 3).unwrap(),
            record: "travel expense".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot modify travel expense for 2025-03: the salary period is completed"
        );
    }

    #[test]
    fn test_slip_not_held_displays_status() {
        let error = EngineError::SlipNotHeld {
            slip_id: Uuid::nil(),
            status: SlipStatus::Ready,
        };
        assert!(error.to_string().contains("READY"));
    }

    #[test]
    fn test_configuration_errors_are_classified() {
        assert!(
            EngineError::MissingPolicySection {
                section: "tax.brackets".to_string()
            }
            .is_configuration_error()
        );
        assert!(
            EngineError::MissingSnapshot {
                period_id: Uuid::nil()
            }
            .is_configuration_error()
        );
        assert!(!EngineError::HoldReasonRequired.is_configuration_error());
    }

    #[test]
    fn test_invariant_violations_are_classified() {
        assert!(EngineError::HoldReasonRequired.is_invariant_violation());
        assert!(
            EngineError::NewerPeriodsExist {
                code: "SAL-2025-01".to_string()
            }
            .is_invariant_violation()
        );
        assert!(
            !EngineError::SlipNotFound {
                slip_id: Uuid::nil()
            }
            .is_invariant_violation()
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_missing_snapshot() -> EngineResult<()> {
            Err(EngineError::MissingSnapshot {
                period_id: Uuid::nil(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_missing_snapshot()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
