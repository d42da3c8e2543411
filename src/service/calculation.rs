//! The slip calculation command.
//!
//! The pipeline runs against a consistent read of the store. The result is
//! committed under the write lock only if the slip and its period are still
//! exactly as they were read; otherwise the calculation is redone. A failed
//! calculation writes nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calculation::{PeriodContext, SlipCalculation, calculate_slip};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, PayrollSlip, PeriodStatus, SlipStatus};
use crate::providers::InputBundle;
use crate::store::StoreData;

use super::PayrollService;
use super::statistics::refresh_statistics;

const MAX_COMMIT_ATTEMPTS: usize = 3;

/// What a calculation request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationOutcome {
    /// The slip was recalculated and stored.
    Calculated,
    /// The slip is delivered under a completed period; nothing changed.
    Frozen,
}

/// Result of [`PayrollService::calculate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationReport {
    /// The slip as stored after the command.
    pub slip: PayrollSlip,
    /// One step per pipeline stage; empty for a frozen slip.
    pub audit_steps: Vec<AuditStep>,
    /// What happened.
    pub outcome: CalculationOutcome,
}

enum Prepared {
    Frozen(PayrollSlip),
    Calculated {
        base: PayrollSlip,
        period_status: PeriodStatus,
        calculation: SlipCalculation,
    },
}

fn prepare(data: &StoreData, slip_id: Uuid) -> EngineResult<Prepared> {
    prepare_slip(data, data.slip(slip_id)?.clone())
}

/// Runs the pipeline for a slip version that may differ from the stored one.
fn prepare_slip(data: &StoreData, slip: PayrollSlip) -> EngineResult<Prepared> {
    let period = data.period(slip.period_id)?;
    if slip.is_frozen(period.status) {
        return Ok(Prepared::Frozen(slip));
    }

    let context = PeriodContext {
        month: period.month,
        status: period.status,
        standard_working_days: period.standard_working_days,
        snapshot: period.snapshot()?,
    };
    let inputs = InputBundle::gather(data, &slip.employee_id, period.month).ok_or_else(|| {
        EngineError::EmployeeNotFound {
            employee_id: slip.employee_id.clone(),
        }
    })?;
    let calculation = calculate_slip(&slip, &context, &inputs.as_slip_inputs())?;

    Ok(Prepared::Calculated {
        base: slip,
        period_status: period.status,
        calculation,
    })
}

/// Builds the slip to store from the version that was read.
fn apply(
    base: &PayrollSlip,
    period_status: PeriodStatus,
    calculation: &SlipCalculation,
    now: DateTime<Utc>,
) -> PayrollSlip {
    let mut slip = base.clone();
    let net_changed = base.figures.net_salary != calculation.figures.net_salary;
    if base.status == SlipStatus::Delivered
        && period_status == PeriodStatus::Ongoing
        && base.has_been_calculated()
        && net_changed
    {
        slip.needs_resend_email = true;
    }
    slip.figures = calculation.figures.clone();
    slip.status = calculation.status;
    slip.status_note = calculation.status_note.clone();
    slip.calculated_at = Some(now);
    slip
}

fn commit(
    data: &mut StoreData,
    updated: &PayrollSlip,
    calculation: &SlipCalculation,
) -> EngineResult<()> {
    data.commit_calculation(updated.clone(), &calculation.consumed)?;
    refresh_statistics(data, updated.period_id)
}

/// Calculates `slip` and stores it inside a running write command.
///
/// `slip` replaces the stored version only if the calculation succeeds. A
/// frozen slip is returned as given and nothing is written.
pub(super) fn calculate_locked(
    data: &mut StoreData,
    slip: PayrollSlip,
) -> EngineResult<CalculationReport> {
    match prepare_slip(data, slip)? {
        Prepared::Frozen(slip) => Ok(CalculationReport {
            slip,
            audit_steps: Vec::new(),
            outcome: CalculationOutcome::Frozen,
        }),
        Prepared::Calculated {
            base,
            period_status,
            calculation,
        } => {
            let updated = apply(&base, period_status, &calculation, Utc::now());
            commit(data, &updated, &calculation)?;
            Ok(CalculationReport {
                slip: updated,
                audit_steps: calculation.audit_steps,
                outcome: CalculationOutcome::Calculated,
            })
        }
    }
}

impl PayrollService {
    /// Recalculates a slip and stores the result.
    ///
    /// A slip delivered under a completed period is left untouched. Missing
    /// inputs never fail the command; a broken policy snapshot does, and
    /// nothing is written in that case.
    pub fn calculate(&self, slip_id: Uuid) -> EngineResult<CalculationReport> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let (base, period_status, calculation) =
                match self.store.read(|data| prepare(data, slip_id))? {
                    Prepared::Frozen(slip) => {
                        debug!(slip_id = %slip_id, "Slip is frozen; skipping calculation");
                        return Ok(CalculationReport {
                            slip,
                            audit_steps: Vec::new(),
                            outcome: CalculationOutcome::Frozen,
                        });
                    }
                    Prepared::Calculated {
                        base,
                        period_status,
                        calculation,
                    } => (base, period_status, calculation),
                };

            let updated = apply(&base, period_status, &calculation, Utc::now());
            let committed = self.store.write(|data| {
                let unchanged = *data.slip(slip_id)? == base
                    && data.period(base.period_id)?.status == period_status;
                if !unchanged {
                    return Ok(false);
                }
                commit(data, &updated, &calculation)?;
                Ok(true)
            })?;

            if committed {
                info!(
                    slip_id = %slip_id,
                    employee_id = %updated.employee_id,
                    status = %updated.status,
                    net_salary = %updated.figures.net_salary,
                    "Calculated payroll slip"
                );
                return Ok(CalculationReport {
                    slip: updated,
                    audit_steps: calculation.audit_steps,
                    outcome: CalculationOutcome::Calculated,
                });
            }
            debug!(slip_id = %slip_id, attempt, "Slip changed during calculation; retrying");
        }

        Err(EngineError::CalculationError {
            message: format!("payroll slip {} kept changing during calculation", slip_id),
        })
    }
}
