//! Period lifecycle and slip hold commands.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollSlip, SalaryPeriod, SlipStatus};
use crate::store::StoreData;

use super::calculation::calculate_locked;
use super::statistics::refresh_statistics;
use super::{CalculationReport, PayrollService};

/// Returns true if no period covers a later month.
fn is_latest(data: &StoreData, period: &SalaryPeriod) -> bool {
    !data.periods().any(|p| p.month > period.month)
}

impl PayrollService {
    /// Completes a period.
    ///
    /// Every READY slip of the period is delivered in it. READY slips left
    /// in earlier completed periods are delivered here too and become
    /// carried over. PENDING and HOLD slips stay as they are.
    pub fn complete(&self, period_id: Uuid, by: &str) -> EngineResult<SalaryPeriod> {
        let result = self.store.write(|data| {
            let month = data.period(period_id)?.month;
            let earlier_completed: Vec<Uuid> = data
                .periods()
                .filter(|p| p.is_completed() && p.month < month)
                .map(|p| p.id)
                .collect();
            let deliverable: Vec<(Uuid, Uuid)> = data
                .slips_in_period(period_id)
                .chain(
                    earlier_completed
                        .iter()
                        .flat_map(|id| data.slips_in_period(*id)),
                )
                .filter(|s| s.status == SlipStatus::Ready)
                .map(|s| (s.id, s.period_id))
                .collect();

            let now = Utc::now();
            data.period_mut(period_id)?.mark_completed(by, now)?;
            for (slip_id, _) in &deliverable {
                data.slip_mut(*slip_id)?.deliver(period_id, now);
            }

            let mut touched: Vec<Uuid> = deliverable.iter().map(|(_, owner)| *owner).collect();
            touched.push(period_id);
            touched.sort();
            touched.dedup();
            for id in touched {
                refresh_statistics(data, id)?;
            }

            let carried_over = deliverable
                .iter()
                .filter(|(_, owner)| *owner != period_id)
                .count();
            info!(
                period_id = %period_id,
                delivered = deliverable.len(),
                carried_over,
                completed_by = %by,
                "Completed salary period"
            );
            data.period(period_id).cloned()
        });
        if let Err(err) = &result {
            warn!(period_id = %period_id, error = %err, "Failed to complete salary period");
        }
        result
    }

    /// Returns true if the period is completed and no later period exists.
    pub fn can_uncomplete(&self, period_id: Uuid) -> EngineResult<bool> {
        self.store.read(|data| {
            let period = data.period(period_id)?;
            Ok(period.is_completed() && is_latest(data, period))
        })
    }

    /// Reopens a completed period.
    ///
    /// Only the latest period can be reopened. Delivered slips stay
    /// delivered until they are recalculated.
    pub fn uncomplete(&self, period_id: Uuid) -> EngineResult<SalaryPeriod> {
        let result = self.store.write(|data| {
            let period = data.period(period_id)?;
            if !period.is_completed() {
                return Err(EngineError::PeriodNotCompleted {
                    code: period.code.clone(),
                });
            }
            if !is_latest(data, period) {
                return Err(EngineError::NewerPeriodsExist {
                    code: period.code.clone(),
                });
            }

            data.period_mut(period_id)?.mark_uncompleted(Utc::now())?;
            refresh_statistics(data, period_id)?;
            info!(period_id = %period_id, "Reopened salary period");
            data.period(period_id).cloned()
        });
        if let Err(err) = &result {
            warn!(period_id = %period_id, error = %err, "Failed to uncomplete salary period");
        }
        result
    }

    /// Puts a slip on hold.
    pub fn hold(&self, slip_id: Uuid, reason: &str, by: &str) -> EngineResult<PayrollSlip> {
        self.store.write(|data| {
            let period_id = data.slip(slip_id)?.period_id;
            let period_status = data.period(period_id)?.status;
            let slip = data.slip_mut(slip_id)?;
            slip.hold(reason, by, period_status, Utc::now())?;
            let slip = slip.clone();
            refresh_statistics(data, period_id)?;

            info!(slip_id = %slip_id, held_by = %by, reason = %reason.trim(), "Held payroll slip");
            Ok(slip)
        })
    }

    /// Releases a held slip and recalculates it.
    ///
    /// Release and recalculation commit together; if the calculation fails
    /// the slip stays on hold.
    pub fn unhold(&self, slip_id: Uuid, by: &str) -> EngineResult<CalculationReport> {
        let result = self.store.write(|data| {
            let mut slip = data.slip(slip_id)?.clone();
            slip.unhold()?;
            calculate_locked(data, slip)
        });
        match &result {
            Ok(report) => info!(
                slip_id = %slip_id,
                released_by = %by,
                status = %report.slip.status,
                "Released payroll slip"
            ),
            Err(err) => warn!(slip_id = %slip_id, error = %err, "Failed to release payroll slip"),
        }
        result
    }
}
