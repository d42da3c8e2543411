//! Payroll commands.
//!
//! [`PayrollService`] is the single entry point for everything that changes
//! payroll state: period creation and slip generation, calculation, the
//! period lifecycle, hold/unhold and the month-keyed record commands. Every
//! command runs under one store write guard and refreshes the affected
//! period's statistics explicitly before releasing it.

mod batch;
mod calculation;
mod lifecycle;
mod records;
mod statistics;

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Contract, Employee, KpiAssessment, PayMonth, PayrollSlip, PeriodDeadlines, SalaryPeriod,
    Timesheet,
};
use crate::providers::EmployeeDirectory;
use crate::store::PayrollStore;

pub use batch::{BatchRecalculation, BatchReport};
pub use calculation::{CalculationOutcome, CalculationReport};
pub use statistics::{compute_statistics, refresh_month_statistics, refresh_statistics};

/// Runs payroll commands against a store.
///
/// Cheap to clone; clones share the store and the policy.
#[derive(Debug, Clone)]
pub struct PayrollService {
    store: Arc<PayrollStore>,
    config: Arc<ConfigLoader>,
}

impl PayrollService {
    /// Creates a service over a store and a loaded policy.
    pub fn new(store: Arc<PayrollStore>, config: Arc<ConfigLoader>) -> Self {
        Self { store, config }
    }

    /// Returns the store.
    pub fn store(&self) -> &PayrollStore {
        &self.store
    }

    /// Returns the policy loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns a copy of a period.
    pub fn period(&self, period_id: Uuid) -> EngineResult<SalaryPeriod> {
        self.store.read(|data| data.period(period_id).cloned())
    }

    /// Returns a copy of a slip.
    pub fn slip(&self, slip_id: Uuid) -> EngineResult<PayrollSlip> {
        self.store.read(|data| data.slip(slip_id).cloned())
    }

    /// Creates an ONGOING period for a month.
    ///
    /// Captures the policy in force for the month. Standard working days
    /// default to the number of weekdays in the month.
    pub fn create_period(
        &self,
        month: PayMonth,
        standard_working_days: Option<Decimal>,
        deadlines: PeriodDeadlines,
    ) -> EngineResult<SalaryPeriod> {
        let snapshot = self.config.snapshot_for(month)?;
        let standard_working_days =
            standard_working_days.unwrap_or_else(|| Decimal::from(month.weekday_count()));
        let period = SalaryPeriod::new(
            month,
            Some(snapshot),
            standard_working_days,
            deadlines,
            Utc::now(),
        );

        self.store.write(|data| data.insert_period(period.clone()))?;
        info!(
            period_id = %period.id,
            code = %period.code,
            standard_working_days = %period.standard_working_days,
            "Created salary period"
        );
        Ok(period)
    }

    /// Creates a PENDING slip for every employee active in the period's month.
    ///
    /// Employees that already have a slip are skipped. Returns the new slips.
    pub fn generate_slips(&self, period_id: Uuid) -> EngineResult<Vec<PayrollSlip>> {
        self.store.write(|data| {
            let month = data.period(period_id)?.month;
            let now = Utc::now();
            let created: Vec<PayrollSlip> = data
                .employees_active_in(month)
                .into_iter()
                .filter(|e| data.slip_for_employee(period_id, &e.id).is_none())
                .map(|e| PayrollSlip::new(period_id, e.id, now))
                .collect();
            for slip in &created {
                data.insert_slip(slip.clone())?;
            }
            refresh_statistics(data, period_id)?;

            info!(
                period_id = %period_id,
                created = created.len(),
                "Generated payroll slips"
            );
            Ok(created)
        })
    }

    /// Creates a PENDING slip for an employee joining mid-period.
    pub fn onboard_employee(
        &self,
        period_id: Uuid,
        employee_id: &str,
    ) -> EngineResult<PayrollSlip> {
        self.store.write(|data| {
            if data.employee(employee_id).is_none() {
                return Err(EngineError::EmployeeNotFound {
                    employee_id: employee_id.to_string(),
                });
            }
            let slip = PayrollSlip::new(period_id, employee_id, Utc::now());
            data.insert_slip(slip.clone())?;
            refresh_statistics(data, period_id)?;

            info!(
                period_id = %period_id,
                slip_id = %slip.id,
                employee_id = %employee_id,
                "Onboarded employee"
            );
            Ok(slip)
        })
    }

    /// Deletes a slip that has never been calculated.
    pub fn delete_slip(&self, slip_id: Uuid) -> EngineResult<PayrollSlip> {
        self.store.write(|data| {
            if data.slip(slip_id)?.has_been_calculated() {
                return Err(EngineError::SlipAlreadyCalculated { slip_id });
            }
            let slip = data.remove_slip(slip_id)?;
            refresh_statistics(data, slip.period_id)?;

            info!(slip_id = %slip_id, employee_id = %slip.employee_id, "Deleted payroll slip");
            Ok(slip)
        })
    }

    /// Adds or replaces an employee record.
    pub fn upsert_employee(&self, employee: Employee) -> EngineResult<()> {
        self.store.write(|data| {
            data.upsert_employee(employee);
            Ok(())
        })
    }

    /// Adds or replaces a contract.
    pub fn upsert_contract(&self, contract: Contract) -> EngineResult<()> {
        self.store.write(|data| {
            data.upsert_contract(contract);
            Ok(())
        })
    }

    /// Adds or replaces a monthly timesheet.
    pub fn upsert_timesheet(&self, timesheet: Timesheet) -> EngineResult<()> {
        self.store.write(|data| {
            data.upsert_timesheet(timesheet);
            Ok(())
        })
    }

    /// Adds or replaces a KPI assessment.
    pub fn upsert_kpi_assessment(&self, assessment: KpiAssessment) -> EngineResult<()> {
        self.store.write(|data| {
            data.upsert_kpi_assessment(assessment);
            Ok(())
        })
    }
}
