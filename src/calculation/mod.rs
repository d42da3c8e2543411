//! Calculation logic for the payroll engine.
//!
//! Each stage of the slip pipeline lives in its own module and returns its
//! result together with an [`AuditStep`](crate::models::AuditStep): contract
//! resolution, KPI bonus, attendance, travel expenses, sales bonus, income,
//! overtime, insurance, income tax, adjustments and status determination.
//! [`calculate_slip`] composes them in order.

mod adjustments;
mod attendance;
mod contract_resolution;
mod income;
mod income_tax;
mod insurance;
mod kpi_bonus;
mod overtime;
mod pipeline;
mod rounding;
mod sales_bonus;
mod slip_status;
mod travel_expense;

pub use adjustments::{
    NetSalaryComponents, NetSalaryResult, PenaltyCheck, VoucherTotals, aggregate_vouchers,
    calculate_net_salary, check_penalties,
};
pub use attendance::{AttendanceSummary, summarize_attendance};
pub use contract_resolution::{ContractResolution, resolve_contract};
pub use income::{
    GrossIncomeComponents, IncomeResult, PositionIncomeComponents,
    calculate_actual_working_days_income, calculate_gross_income, calculate_hourly_rate,
    calculate_total_position_income,
};
pub use income_tax::{
    IncomeTaxInputs, IncomeTaxResult, calculate_income_tax, calculate_non_taxable_allowance,
    progressive_tax,
};
pub use insurance::{
    Contribution, INSURANCE_CUTOFF_DAY, InsuranceResult, calculate_insurance,
    is_insurance_eligible,
};
pub use kpi_bonus::{KpiBonusResult, assessed_grade, calculate_kpi_bonus};
pub use overtime::{OvertimeHours, OvertimeResult, calculate_overtime};
pub use pipeline::{ConsumedRecords, PeriodContext, SlipCalculation, SlipInputs, calculate_slip};
pub use rounding::{
    MONEY_DECIMALS, PROBATION_FACTOR, RATE_DECIMALS, STANDARD_HOURS_PER_DAY, round_money,
    round_rate,
};
pub use sales_bonus::{
    SalesBonusDeductions, SalesBonusResult, calculate_sales_bonus, select_tier,
};
pub use slip_status::{
    BlockingReason, Completeness, Notice, StatusDecision, compose_status_note, determine_status,
    next_status,
};
pub use travel_expense::{TravelExpenseTotals, aggregate_travel_expenses};
