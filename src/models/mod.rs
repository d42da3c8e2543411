//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod contract;
mod employee;
mod month;
mod period;
mod records;
mod slip;
mod timesheet;

pub use audit::AuditStep;
pub use contract::{Contract, ContractStatus, NetPercentage, TaxCalculationMethod};
pub use employee::{DepartmentFunction, Employee, EmploymentStatus, EmploymentType};
pub use month::PayMonth;
pub use period::{PeriodDeadlines, PeriodStatistics, PeriodStatus, SalaryPeriod};
pub use records::{
    ConsumableRecord, MonthRecord, PenaltyStatus, PenaltyTicket, RecoveryVoucher, SalesRevenue,
    TravelExpense, TravelExpenseCategory, VoucherType,
};
pub use slip::{PayrollSlip, SlipFigures, SlipStatus};
pub use timesheet::{KpiAssessment, Timesheet};
