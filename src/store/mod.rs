//! In-memory payroll store.
//!
//! Holds periods, slips and every input the calculation reads. All state
//! sits behind one `RwLock`; every command runs its reads, checks and writes
//! under a single guard, so a command either applies completely or not at
//! all. Mutating methods on [`StoreData`] validate before they write.
//!
//! # Example
//!
//! ```
//! use payroll_engine::store::PayrollStore;
//!
//! let store = PayrollStore::new();
//! assert_eq!(store.read(|data| data.periods().count()), 0);
//! ```

mod records;

use std::collections::BTreeMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::calculation::ConsumedRecords;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Contract, Employee, KpiAssessment, PayMonth, PayrollSlip, PenaltyTicket, RecoveryVoucher,
    SalaryPeriod, SalesRevenue, Timesheet, TravelExpense,
};
use crate::providers::{
    ContractProvider, EmployeeDirectory, KpiProvider, MonthRecordProvider, TimesheetProvider,
};

use records::ClosedMonths;

/// Every table of the store.
#[derive(Debug, Default)]
pub struct StoreData {
    periods: BTreeMap<Uuid, SalaryPeriod>,
    slips: BTreeMap<Uuid, PayrollSlip>,
    employees: BTreeMap<String, Employee>,
    contracts: BTreeMap<Uuid, Contract>,
    timesheets: BTreeMap<(String, PayMonth), Timesheet>,
    kpi_assessments: BTreeMap<(String, PayMonth), KpiAssessment>,
    travel_expenses: BTreeMap<Uuid, TravelExpense>,
    sales_revenues: BTreeMap<Uuid, SalesRevenue>,
    recovery_vouchers: BTreeMap<Uuid, RecoveryVoucher>,
    penalty_tickets: BTreeMap<Uuid, PenaltyTicket>,
}

impl StoreData {
    // Periods

    /// Returns a period.
    pub fn period(&self, period_id: Uuid) -> EngineResult<&SalaryPeriod> {
        self.periods
            .get(&period_id)
            .ok_or(EngineError::PeriodNotFound { period_id })
    }

    /// Returns a period for modification.
    pub fn period_mut(&mut self, period_id: Uuid) -> EngineResult<&mut SalaryPeriod> {
        self.periods
            .get_mut(&period_id)
            .ok_or(EngineError::PeriodNotFound { period_id })
    }

    /// Iterates over every period.
    pub fn periods(&self) -> impl Iterator<Item = &SalaryPeriod> {
        self.periods.values()
    }

    /// Returns the period of a month, if one exists.
    pub fn period_for_month(&self, month: PayMonth) -> Option<&SalaryPeriod> {
        self.periods.values().find(|p| p.month == month)
    }

    /// Adds a period; one period per month.
    pub fn insert_period(&mut self, period: SalaryPeriod) -> EngineResult<()> {
        if self.period_for_month(period.month).is_some() {
            return Err(EngineError::DuplicatePeriod {
                month: period.month,
            });
        }
        self.periods.insert(period.id, period);
        Ok(())
    }

    fn closed_months(&self) -> ClosedMonths {
        self.periods
            .values()
            .filter(|p| p.is_completed())
            .map(|p| p.month)
            .collect()
    }

    // Slips

    /// Returns a slip.
    pub fn slip(&self, slip_id: Uuid) -> EngineResult<&PayrollSlip> {
        self.slips
            .get(&slip_id)
            .ok_or(EngineError::SlipNotFound { slip_id })
    }

    /// Returns a slip for modification.
    pub fn slip_mut(&mut self, slip_id: Uuid) -> EngineResult<&mut PayrollSlip> {
        self.slips
            .get_mut(&slip_id)
            .ok_or(EngineError::SlipNotFound { slip_id })
    }

    /// Slips owned by a period.
    pub fn slips_in_period(&self, period_id: Uuid) -> impl Iterator<Item = &PayrollSlip> {
        self.slips.values().filter(move |s| s.period_id == period_id)
    }

    /// The slip of an employee in a period, if any.
    pub fn slip_for_employee(&self, period_id: Uuid, employee_id: &str) -> Option<&PayrollSlip> {
        self.slips_in_period(period_id)
            .find(|s| s.employee_id == employee_id)
    }

    /// Adds a slip; one slip per employee and period.
    pub fn insert_slip(&mut self, slip: PayrollSlip) -> EngineResult<()> {
        self.period(slip.period_id)?;
        if self
            .slip_for_employee(slip.period_id, &slip.employee_id)
            .is_some()
        {
            return Err(EngineError::DuplicateSlip {
                period_id: slip.period_id,
                employee_id: slip.employee_id,
            });
        }
        self.slips.insert(slip.id, slip);
        Ok(())
    }

    /// Removes a slip.
    pub fn remove_slip(&mut self, slip_id: Uuid) -> EngineResult<PayrollSlip> {
        self.slips
            .remove(&slip_id)
            .ok_or(EngineError::SlipNotFound { slip_id })
    }

    /// Stores a calculated slip and records exactly which rows it counted.
    pub fn commit_calculation(
        &mut self,
        slip: PayrollSlip,
        consumed: &ConsumedRecords,
    ) -> EngineResult<()> {
        let slip_id = slip.id;
        let stored = self.slip_mut(slip_id)?;
        *stored = slip;
        records::assign_consumed(&mut self.travel_expenses, &consumed.travel_expenses, slip_id);
        records::assign_consumed(&mut self.sales_revenues, &consumed.sales_revenues, slip_id);
        records::assign_consumed(&mut self.recovery_vouchers, &consumed.vouchers, slip_id);
        Ok(())
    }

    // Inputs owned by other systems

    /// Adds or replaces an employee.
    pub fn upsert_employee(&mut self, employee: Employee) {
        self.employees.insert(employee.id.clone(), employee);
    }

    /// Adds or replaces a contract.
    pub fn upsert_contract(&mut self, contract: Contract) {
        self.contracts.insert(contract.id, contract);
    }

    /// Adds or replaces a timesheet.
    pub fn upsert_timesheet(&mut self, timesheet: Timesheet) {
        self.timesheets.insert(
            (timesheet.employee_id.clone(), timesheet.month),
            timesheet,
        );
    }

    /// Adds or replaces a KPI assessment.
    pub fn upsert_kpi_assessment(&mut self, assessment: KpiAssessment) {
        self.kpi_assessments.insert(
            (assessment.employee_id.clone(), assessment.month),
            assessment,
        );
    }

    // Penalty tickets

    /// Adds a penalty ticket to an open month.
    pub fn insert_penalty_ticket(&mut self, ticket: PenaltyTicket) -> EngineResult<()> {
        let closed = self.closed_months();
        records::insert(&mut self.penalty_tickets, &closed, ticket)
    }

    /// Replaces a penalty ticket; closed months only accept a payment.
    pub fn update_penalty_ticket(&mut self, ticket: PenaltyTicket) -> EngineResult<PenaltyTicket> {
        let closed = self.closed_months();
        records::update_penalty_ticket(&mut self.penalty_tickets, &closed, ticket)
    }

    /// Removes a penalty ticket from an open month.
    pub fn remove_penalty_ticket(&mut self, id: Uuid) -> EngineResult<PenaltyTicket> {
        let closed = self.closed_months();
        records::remove(&mut self.penalty_tickets, &closed, id)
    }

    /// Returns a penalty ticket.
    pub fn penalty_ticket(&self, id: Uuid) -> Option<&PenaltyTicket> {
        self.penalty_tickets.get(&id)
    }

    /// Penalty tickets of a month.
    pub fn penalty_tickets_in(&self, month: PayMonth) -> impl Iterator<Item = &PenaltyTicket> {
        self.penalty_tickets.values().filter(move |t| t.month == month)
    }
}

macro_rules! consumable_table {
    (
        $table:ident,
        $ty:ty,
        $insert:ident,
        $update:ident,
        $remove:ident,
        $get:ident,
        $in_month:ident
    ) => {
        impl StoreData {
            #[doc = concat!("Adds a row to `", stringify!($table), "` in an open month.")]
            pub fn $insert(&mut self, record: $ty) -> EngineResult<()> {
                let closed = self.closed_months();
                records::insert(&mut self.$table, &closed, record)
            }

            #[doc = concat!("Replaces a row of `", stringify!($table), "` in an open month.")]
            pub fn $update(&mut self, record: $ty) -> EngineResult<$ty> {
                let closed = self.closed_months();
                records::update_consumable(&mut self.$table, &closed, record)
            }

            #[doc = concat!("Removes a row of `", stringify!($table), "` from an open month.")]
            pub fn $remove(&mut self, id: Uuid) -> EngineResult<$ty> {
                let closed = self.closed_months();
                records::remove(&mut self.$table, &closed, id)
            }

            #[doc = concat!("Returns a row of `", stringify!($table), "`.")]
            pub fn $get(&self, id: Uuid) -> Option<&$ty> {
                self.$table.get(&id)
            }

            #[doc = concat!("Rows of `", stringify!($table), "` in a month.")]
            pub fn $in_month(&self, month: PayMonth) -> impl Iterator<Item = &$ty> {
                self.$table.values().filter(move |r| r.month == month)
            }
        }
    };
}

consumable_table!(
    travel_expenses,
    TravelExpense,
    insert_travel_expense,
    update_travel_expense,
    remove_travel_expense,
    travel_expense,
    travel_expenses_in
);
consumable_table!(
    sales_revenues,
    SalesRevenue,
    insert_sales_revenue,
    update_sales_revenue,
    remove_sales_revenue,
    sales_revenue,
    sales_revenues_in
);
consumable_table!(
    recovery_vouchers,
    RecoveryVoucher,
    insert_recovery_voucher,
    update_recovery_voucher,
    remove_recovery_voucher,
    recovery_voucher,
    recovery_vouchers_in
);

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct PayrollStore {
    data: RwLock<StoreData>,
}

impl PayrollStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a read-only query under the read lock.
    pub fn read<T>(&self, f: impl FnOnce(&StoreData) -> T) -> T {
        f(&self.data.read())
    }

    /// Runs a command under the write lock.
    ///
    /// The command sees and changes the store as one unit; no other reader
    /// or writer observes an intermediate state.
    pub fn write<T>(&self, f: impl FnOnce(&mut StoreData) -> EngineResult<T>) -> EngineResult<T> {
        f(&mut self.data.write())
    }
}

impl EmployeeDirectory for StoreData {
    fn employee(&self, employee_id: &str) -> Option<Employee> {
        self.employees.get(employee_id).cloned()
    }

    fn employees_active_in(&self, month: PayMonth) -> Vec<Employee> {
        self.employees
            .values()
            .filter(|e| e.is_active_in(month))
            .cloned()
            .collect()
    }
}

impl ContractProvider for StoreData {
    fn contracts_for(&self, employee_id: &str) -> Vec<Contract> {
        self.contracts
            .values()
            .filter(|c| c.employee_id == employee_id)
            .cloned()
            .collect()
    }
}

impl TimesheetProvider for StoreData {
    fn timesheet(&self, employee_id: &str, month: PayMonth) -> Option<Timesheet> {
        self.timesheets
            .get(&(employee_id.to_string(), month))
            .cloned()
    }
}

impl KpiProvider for StoreData {
    fn kpi_assessment(&self, employee_id: &str, month: PayMonth) -> Option<KpiAssessment> {
        self.kpi_assessments
            .get(&(employee_id.to_string(), month))
            .cloned()
    }
}

impl MonthRecordProvider for StoreData {
    fn travel_expenses(&self, employee_id: &str, month: PayMonth) -> Vec<TravelExpense> {
        records::for_employee(&self.travel_expenses, employee_id, month)
    }

    fn sales_revenues(&self, employee_id: &str, month: PayMonth) -> Vec<SalesRevenue> {
        records::for_employee(&self.sales_revenues, employee_id, month)
    }

    fn recovery_vouchers(&self, employee_id: &str, month: PayMonth) -> Vec<RecoveryVoucher> {
        records::for_employee(&self.recovery_vouchers, employee_id, month)
    }

    fn penalty_tickets(&self, employee_id: &str, month: PayMonth) -> Vec<PenaltyTicket> {
        records::for_employee(&self.penalty_tickets, employee_id, month)
    }
}

impl EmployeeDirectory for PayrollStore {
    fn employee(&self, employee_id: &str) -> Option<Employee> {
        self.read(|data| data.employee(employee_id))
    }

    fn employees_active_in(&self, month: PayMonth) -> Vec<Employee> {
        self.read(|data| data.employees_active_in(month))
    }
}

impl ContractProvider for PayrollStore {
    fn contracts_for(&self, employee_id: &str) -> Vec<Contract> {
        self.read(|data| data.contracts_for(employee_id))
    }
}

impl TimesheetProvider for PayrollStore {
    fn timesheet(&self, employee_id: &str, month: PayMonth) -> Option<Timesheet> {
        self.read(|data| data.timesheet(employee_id, month))
    }
}

impl KpiProvider for PayrollStore {
    fn kpi_assessment(&self, employee_id: &str, month: PayMonth) -> Option<KpiAssessment> {
        self.read(|data| data.kpi_assessment(employee_id, month))
    }
}

impl MonthRecordProvider for PayrollStore {
    fn travel_expenses(&self, employee_id: &str, month: PayMonth) -> Vec<TravelExpense> {
        self.read(|data| data.travel_expenses(employee_id, month))
    }

    fn sales_revenues(&self, employee_id: &str, month: PayMonth) -> Vec<SalesRevenue> {
        self.read(|data| data.sales_revenues(employee_id, month))
    }

    fn recovery_vouchers(&self, employee_id: &str, month: PayMonth) -> Vec<RecoveryVoucher> {
        self.read(|data| data.recovery_vouchers(employee_id, month))
    }

    fn penalty_tickets(&self, employee_id: &str, month: PayMonth) -> Vec<PenaltyTicket> {
        self.read(|data| data.penalty_tickets(employee_id, month))
    }
}
