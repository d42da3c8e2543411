//! Read-only input providers.
//!
//! The calculation service reads employees, contracts, attendance, KPI
//! assessments and month-keyed records through these traits. Absence is
//! never an error: a provider returns `None` or an empty list and the
//! pipeline degrades to zero or a default.

use crate::calculation::SlipInputs;
use crate::models::{
    Contract, Employee, KpiAssessment, PayMonth, PenaltyTicket, RecoveryVoucher, SalesRevenue,
    Timesheet, TravelExpense,
};

/// Looks up employees.
pub trait EmployeeDirectory: Send + Sync {
    /// Returns the employee with the given id.
    fn employee(&self, employee_id: &str) -> Option<Employee>;

    /// Returns every employee who worked at least part of the month.
    fn employees_active_in(&self, month: PayMonth) -> Vec<Employee>;
}

/// Supplies employment contracts.
pub trait ContractProvider: Send + Sync {
    /// Returns every contract of the employee, in any status.
    fn contracts_for(&self, employee_id: &str) -> Vec<Contract>;
}

/// Supplies monthly timesheets.
pub trait TimesheetProvider: Send + Sync {
    /// Returns the employee's timesheet for the month.
    fn timesheet(&self, employee_id: &str, month: PayMonth) -> Option<Timesheet>;
}

/// Supplies KPI assessments.
pub trait KpiProvider: Send + Sync {
    /// Returns the employee's KPI assessment for the month.
    fn kpi_assessment(&self, employee_id: &str, month: PayMonth) -> Option<KpiAssessment>;
}

/// Supplies month-keyed records.
pub trait MonthRecordProvider: Send + Sync {
    /// Travel expenses for the employee and month.
    fn travel_expenses(&self, employee_id: &str, month: PayMonth) -> Vec<TravelExpense>;

    /// Sales revenues for the employee and month.
    fn sales_revenues(&self, employee_id: &str, month: PayMonth) -> Vec<SalesRevenue>;

    /// Recovery vouchers for the employee and month.
    fn recovery_vouchers(&self, employee_id: &str, month: PayMonth) -> Vec<RecoveryVoucher>;

    /// Penalty tickets for the employee and month.
    fn penalty_tickets(&self, employee_id: &str, month: PayMonth) -> Vec<PenaltyTicket>;
}

/// Every provider the calculation needs.
pub trait PayrollInputs:
    EmployeeDirectory + ContractProvider + TimesheetProvider + KpiProvider + MonthRecordProvider
{
}

impl<T> PayrollInputs for T where
    T: EmployeeDirectory + ContractProvider + TimesheetProvider + KpiProvider + MonthRecordProvider
{
}

/// Owned copies of one employee's inputs for one month.
#[derive(Debug, Clone)]
pub struct InputBundle {
    /// The employee.
    pub employee: Employee,
    /// The employee's contracts.
    pub contracts: Vec<Contract>,
    /// The month's timesheet.
    pub timesheet: Option<Timesheet>,
    /// The month's KPI assessment.
    pub kpi_assessment: Option<KpiAssessment>,
    /// The month's travel expenses.
    pub travel_expenses: Vec<TravelExpense>,
    /// The month's sales revenues.
    pub sales_revenues: Vec<SalesRevenue>,
    /// The month's recovery vouchers.
    pub vouchers: Vec<RecoveryVoucher>,
    /// The month's penalty tickets.
    pub penalty_tickets: Vec<PenaltyTicket>,
}

impl InputBundle {
    /// Gathers every input for an employee and month.
    ///
    /// Returns `None` only when the employee itself is unknown.
    pub fn gather<P: PayrollInputs + ?Sized>(
        providers: &P,
        employee_id: &str,
        month: PayMonth,
    ) -> Option<Self> {
        let employee = providers.employee(employee_id)?;
        Some(Self {
            contracts: providers.contracts_for(employee_id),
            timesheet: providers.timesheet(employee_id, month),
            kpi_assessment: providers.kpi_assessment(employee_id, month),
            travel_expenses: providers.travel_expenses(employee_id, month),
            sales_revenues: providers.sales_revenues(employee_id, month),
            vouchers: providers.recovery_vouchers(employee_id, month),
            penalty_tickets: providers.penalty_tickets(employee_id, month),
            employee,
        })
    }

    /// Borrows the bundle as pipeline inputs.
    pub fn as_slip_inputs(&self) -> SlipInputs<'_> {
        SlipInputs {
            employee: &self.employee,
            contracts: &self.contracts,
            timesheet: self.timesheet.as_ref(),
            kpi_assessment: self.kpi_assessment.as_ref(),
            travel_expenses: &self.travel_expenses,
            sales_revenues: &self.sales_revenues,
            vouchers: &self.vouchers,
            penalty_tickets: &self.penalty_tickets,
        }
    }
}
