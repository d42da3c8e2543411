//! The slip calculation pipeline.
//!
//! Runs every stage in order against a set of already-loaded inputs and
//! produces the complete set of derived values, the next status and one
//! audit step per stage. The pipeline itself never touches storage; the
//! calculation service loads the inputs and commits the outcome.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::{ConfigSnapshot, SalesTier};
use crate::error::EngineResult;
use crate::models::{
    AuditStep, Contract, Employee, KpiAssessment, PayMonth, PayrollSlip, PenaltyTicket,
    PeriodStatus, RecoveryVoucher, SalesRevenue, SlipFigures, SlipStatus, Timesheet,
    TravelExpense,
};

use super::adjustments::{
    NetSalaryComponents, aggregate_vouchers, calculate_net_salary, check_penalties,
};
use super::attendance::summarize_attendance;
use super::contract_resolution::resolve_contract;
use super::income::{
    calculate_actual_working_days_income, calculate_gross_income, calculate_hourly_rate,
    calculate_total_position_income, GrossIncomeComponents, PositionIncomeComponents,
};
use super::income_tax::{calculate_income_tax, IncomeTaxInputs};
use super::insurance::{calculate_insurance, is_insurance_eligible};
use super::kpi_bonus::{assessed_grade, calculate_kpi_bonus};
use super::overtime::{calculate_overtime, OvertimeHours};
use super::sales_bonus::{calculate_sales_bonus, SalesBonusDeductions};
use super::slip_status::{determine_status, BlockingReason, Notice};
use super::travel_expense::aggregate_travel_expenses;

/// The period a slip is calculated under.
#[derive(Debug, Clone, Copy)]
pub struct PeriodContext<'a> {
    /// The month paid.
    pub month: PayMonth,
    /// The period's status.
    pub status: PeriodStatus,
    /// Standard working days.
    pub standard_working_days: Decimal,
    /// The period's policy snapshot.
    pub snapshot: &'a ConfigSnapshot,
}

/// Everything the providers returned for one employee and month.
#[derive(Debug, Clone, Copy)]
pub struct SlipInputs<'a> {
    /// The employee.
    pub employee: &'a Employee,
    /// The employee's contracts (any status).
    pub contracts: &'a [Contract],
    /// The month's timesheet.
    pub timesheet: Option<&'a Timesheet>,
    /// The month's KPI assessment.
    pub kpi_assessment: Option<&'a KpiAssessment>,
    /// The month's travel expenses.
    pub travel_expenses: &'a [TravelExpense],
    /// The month's sales revenues.
    pub sales_revenues: &'a [SalesRevenue],
    /// The month's recovery vouchers.
    pub vouchers: &'a [RecoveryVoucher],
    /// The month's penalty tickets.
    pub penalty_tickets: &'a [PenaltyTicket],
}

/// Month-keyed rows counted by a calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumedRecords {
    /// Travel expenses.
    pub travel_expenses: Vec<Uuid>,
    /// Sales revenues.
    pub sales_revenues: Vec<Uuid>,
    /// Recovery vouchers.
    pub vouchers: Vec<Uuid>,
}

/// The outcome of running the pipeline for one slip.
#[derive(Debug, Clone)]
pub struct SlipCalculation {
    /// Every derived value.
    pub figures: SlipFigures,
    /// The next status.
    pub status: SlipStatus,
    /// The next status note.
    pub status_note: Option<String>,
    /// Rows to mark as consumed by the slip.
    pub consumed: ConsumedRecords,
    /// One step per stage, in order.
    pub audit_steps: Vec<AuditStep>,
}

fn identity_step(employee: &Employee, step_number: u32) -> AuditStep {
    AuditStep::new(
        step_number,
        "employee_identity",
        "Employee Identity",
        serde_json::json!({ "employee_id": employee.id }),
        serde_json::json!({
            "code": employee.code,
            "full_name": employee.full_name,
            "department": employee.department,
            "position_code": employee.position_code,
            "employment_type": employee.employment_type,
            "is_sale_employee": employee.is_sale_employee(),
        }),
        format!(
            "{} ({}) in {} as {}",
            employee.full_name, employee.code, employee.department, employee.position_name
        ),
    )
}

/// Runs the full pipeline for one slip.
///
/// Missing optional inputs degrade to zero or the policy default and are
/// reported in the status note. Only configuration problems fail: an empty
/// KPI tier map, missing sales tiers for a sales-position employee, or
/// missing tax brackets for a progressive contract.
pub fn calculate_slip(
    slip: &PayrollSlip,
    period: &PeriodContext<'_>,
    inputs: &SlipInputs<'_>,
) -> EngineResult<SlipCalculation> {
    let snapshot = period.snapshot;
    let employee = inputs.employee;
    snapshot.ensure_kpi_tiers()?;

    let mut audit_steps = Vec::with_capacity(17);
    let mut blocking = Vec::new();
    let mut notices = Vec::new();
    let mut figures = SlipFigures {
        employee_code: employee.code.clone(),
        employee_name: employee.full_name.clone(),
        department: employee.department.clone(),
        position_code: employee.position_code.clone(),
        position_name: employee.position_name.clone(),
        employment_type: Some(employee.employment_type),
        is_sale_employee: employee.is_sale_employee(),
        official_conversion_date: employee.official_conversion_date,
        standard_working_days: period.standard_working_days,
        dependent_count: employee.dependent_count,
        ..SlipFigures::default()
    };

    // Step 1: Employee identity
    audit_steps.push(identity_step(employee, 1));

    // Step 2: Contract resolution
    let resolution = resolve_contract(employee, inputs.contracts, period.month, 2);
    audit_steps.push(resolution.audit_step);
    match &resolution.contract {
        Some(contract) => {
            figures.contract_id = Some(contract.id);
            figures.base_salary = contract.base_salary;
            figures.kpi_salary = contract.kpi_salary;
            figures.lunch_allowance = contract.lunch_allowance;
            figures.phone_allowance = contract.phone_allowance;
            figures.other_allowance = contract.other_allowance;
            figures.tax_calculation_method = contract.tax_calculation_method;
            figures.net_percentage = contract.net_percentage;
            figures.has_social_insurance = contract.has_social_insurance;
        }
        None => blocking.push(BlockingReason::MissingContract(period.month)),
    }

    // Step 3: KPI bonus
    let kpi = calculate_kpi_bonus(
        assessed_grade(inputs.kpi_assessment),
        figures.is_sale_employee,
        figures.base_salary,
        figures.kpi_salary,
        &snapshot.kpi,
        3,
    );
    if kpi.defaulted {
        notices.push(Notice::KpiGradeDefaulted(kpi.grade.clone()));
    }
    figures.kpi_grade = kpi.grade;
    figures.kpi_percentage = kpi.percentage;
    figures.kpi_bonus = kpi.bonus;
    audit_steps.push(kpi.audit_step);

    // Step 4: Attendance
    let attendance = summarize_attendance(inputs.timesheet, 4);
    if !attendance.found {
        blocking.push(BlockingReason::MissingTimesheet(period.month));
    }
    figures.has_timesheet = attendance.found;
    figures.official_working_days = attendance.official_working_days;
    figures.probation_working_days = attendance.probation_working_days;
    figures.total_working_days = attendance.total_working_days;
    figures.weekday_overtime_hours = attendance.weekday_overtime_hours;
    figures.weekend_overtime_hours = attendance.weekend_overtime_hours;
    figures.holiday_overtime_hours = attendance.holiday_overtime_hours;
    figures.total_overtime_hours = attendance.total_overtime_hours();
    audit_steps.push(attendance.audit_step);

    // Step 5: Travel expenses
    let travel = aggregate_travel_expenses(inputs.travel_expenses, slip.id, 5);
    figures.taxable_travel_expense = travel.taxable;
    figures.non_taxable_travel_expense = travel.non_taxable;
    figures.travel_expense_by_working_days = travel.by_working_days;
    audit_steps.push(travel.audit_step);

    // Step 6: Sales bonus
    let sales_position = employee.position_code == snapshot.sales.position_code;
    let eligible = sales_position && resolution.contract.is_some();
    let tiers: &[SalesTier] = if eligible {
        snapshot.sales_tiers()?
    } else {
        &[]
    };
    let sales = calculate_sales_bonus(
        eligible,
        inputs.sales_revenues,
        slip.id,
        tiers,
        &snapshot.sales.default_grade,
        SalesBonusDeductions {
            base_salary: figures.base_salary,
            kpi_salary: figures.kpi_salary,
            lunch_allowance: figures.lunch_allowance,
            other_allowance: figures.other_allowance,
            travel_expense_by_working_days: figures.travel_expense_by_working_days,
        },
        6,
    );
    if sales_position && sales.counted.is_empty() {
        notices.push(Notice::NoSalesRevenue);
    }
    figures.sales_revenue = sales.revenue;
    figures.sales_transaction_count = sales.transaction_count;
    figures.business_grade = sales.grade;
    figures.business_progressive_salary = sales.bonus;
    audit_steps.push(sales.audit_step);

    // Step 7: Total position income
    let position_income = calculate_total_position_income(
        &PositionIncomeComponents {
            base_salary: figures.base_salary,
            lunch_allowance: figures.lunch_allowance,
            phone_allowance: figures.phone_allowance,
            other_allowance: figures.other_allowance,
            kpi_salary: figures.kpi_salary,
            kpi_bonus: figures.kpi_bonus,
            business_progressive_salary: figures.business_progressive_salary,
            travel_expense_by_working_days: figures.travel_expense_by_working_days,
        },
        7,
    );
    figures.total_position_income = position_income.amount;
    audit_steps.push(position_income.audit_step);

    // Step 8: Actual working days income
    let actual = calculate_actual_working_days_income(
        figures.total_position_income,
        figures.official_working_days,
        figures.probation_working_days,
        figures.standard_working_days,
        figures.net_percentage,
        8,
    );
    figures.actual_working_days_income = actual.amount;
    audit_steps.push(actual.audit_step);

    // Step 9: Hourly rate
    let hourly = calculate_hourly_rate(
        figures.total_position_income,
        employee.is_probationary(),
        figures.standard_working_days,
        9,
    );
    figures.hourly_rate = hourly.amount;
    audit_steps.push(hourly.audit_step);

    // Step 10: Overtime
    let overtime = calculate_overtime(
        OvertimeHours {
            weekday: figures.weekday_overtime_hours,
            weekend: figures.weekend_overtime_hours,
            holiday: figures.holiday_overtime_hours,
        },
        figures.hourly_rate,
        &snapshot.overtime,
        10,
    );
    figures.overtime_pay = overtime.overtime_pay;
    figures.taxable_overtime_salary = overtime.taxable_overtime_salary;
    figures.overtime_progress_allowance = overtime.overtime_progress_allowance;
    figures.non_taxable_overtime_salary = overtime.non_taxable_overtime_salary;
    audit_steps.push(overtime.audit_step);

    // Step 11: Gross income
    let gross = calculate_gross_income(
        &GrossIncomeComponents {
            actual_working_days_income: figures.actual_working_days_income,
            taxable_overtime_salary: figures.taxable_overtime_salary,
            non_taxable_overtime_salary: figures.non_taxable_overtime_salary,
            taxable_travel_expense: figures.taxable_travel_expense,
            non_taxable_travel_expense: figures.non_taxable_travel_expense,
        },
        11,
    );
    figures.gross_income = gross.amount;
    audit_steps.push(gross.audit_step);

    // Step 12: Insurance
    let insurance_eligible = is_insurance_eligible(
        figures.has_social_insurance,
        employee.is_official(),
        employee.official_conversion_date,
        period.month,
    );
    let insurance = calculate_insurance(
        insurance_eligible,
        figures.base_salary,
        &snapshot.insurance,
        12,
    );
    figures.is_insurance_eligible = insurance.eligible;
    figures.social_insurance_base = insurance.social_insurance_base;
    figures.employee_social_insurance = insurance.social.employee;
    figures.employer_social_insurance = insurance.social.employer;
    figures.employee_health_insurance = insurance.health.employee;
    figures.employer_health_insurance = insurance.health.employer;
    figures.employee_unemployment_insurance = insurance.unemployment.employee;
    figures.employer_unemployment_insurance = insurance.unemployment.employer;
    figures.employee_union_fee = insurance.union.employee;
    figures.employer_union_fee = insurance.union.employer;
    figures.employer_accident_insurance = insurance.employer_accident;
    audit_steps.push(insurance.audit_step);

    // Step 13: Income tax
    let tax = calculate_income_tax(
        figures.tax_calculation_method,
        &IncomeTaxInputs {
            gross_income: figures.gross_income,
            non_taxable_travel_expense: figures.non_taxable_travel_expense,
            employee_insurance: figures.employee_insurance_total(),
            non_taxable_overtime_salary: figures.non_taxable_overtime_salary,
            lunch_allowance: figures.lunch_allowance,
            phone_allowance: figures.phone_allowance,
            official_working_days: figures.official_working_days,
            probation_working_days: figures.probation_working_days,
            standard_working_days: figures.standard_working_days,
            dependent_count: figures.dependent_count,
        },
        snapshot,
        13,
    )?;
    figures.non_taxable_allowance = tax.non_taxable_allowance;
    figures.taxable_income_base = tax.taxable_income_base;
    figures.personal_deduction = tax.personal_deduction;
    figures.dependent_deduction = tax.dependent_deduction;
    figures.taxable_income = tax.taxable_income;
    figures.personal_income_tax = tax.personal_income_tax;
    audit_steps.push(tax.audit_step);

    // Step 14: Back pay and recovery
    let vouchers = aggregate_vouchers(inputs.vouchers, slip.id, 14);
    figures.back_pay_amount = vouchers.back_pay;
    figures.recovery_amount = vouchers.recovery;
    audit_steps.push(vouchers.audit_step);

    // Step 15: Net salary
    let net = calculate_net_salary(
        &NetSalaryComponents {
            gross_income: figures.gross_income,
            employee_insurance: figures.employee_insurance_total(),
            back_pay_amount: figures.back_pay_amount,
            recovery_amount: figures.recovery_amount,
            personal_income_tax: figures.personal_income_tax,
        },
        15,
    );
    figures.net_salary = net.net_salary;
    audit_steps.push(net.audit_step);

    // Step 16: Penalties
    let penalties = check_penalties(inputs.penalty_tickets, 16);
    if penalties.has_unpaid() {
        blocking.push(BlockingReason::UnpaidPenalties(penalties.unpaid_count));
    }
    figures.has_unpaid_penalty = penalties.has_unpaid();
    figures.unpaid_penalty_count = penalties.unpaid_count;
    audit_steps.push(penalties.audit_step);

    // Step 17: Status
    let decision = determine_status(
        slip.status,
        slip.status_note.as_deref(),
        period.status,
        &blocking,
        &notices,
        17,
    );
    audit_steps.push(decision.audit_step);

    Ok(SlipCalculation {
        figures,
        status: decision.status,
        status_note: decision.note,
        consumed: ConsumedRecords {
            travel_expenses: travel.counted,
            sales_revenues: sales.counted,
            vouchers: vouchers.counted,
        },
        audit_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::models::{DepartmentFunction, PenaltyStatus, TravelExpenseCategory, VoucherType};
    use crate::test_support::{
        dec, march_2025, sample_contract, sample_employee, sample_kpi_assessment, sample_policy,
        sample_snapshot, sample_timesheet,
    };
    use chrono::Utc;

    fn slip() -> PayrollSlip {
        PayrollSlip::new(Uuid::new_v4(), "emp_001", Utc::now())
    }

    fn context(snapshot: &ConfigSnapshot) -> PeriodContext<'_> {
        PeriodContext {
            month: march_2025(),
            status: PeriodStatus::Ongoing,
            standard_working_days: dec("21"),
            snapshot,
        }
    }

    /// PIPE-001: complete inputs produce a READY slip
    #[test]
    fn test_full_month_official_employee() {
        let snapshot = sample_snapshot();
        let employee = sample_employee();
        let contracts = vec![sample_contract()];
        let timesheet = sample_timesheet();
        let kpi = sample_kpi_assessment();
        let inputs = SlipInputs {
            employee: &employee,
            contracts: &contracts,
            timesheet: Some(&timesheet),
            kpi_assessment: Some(&kpi),
            travel_expenses: &[],
            sales_revenues: &[],
            vouchers: &[],
            penalty_tickets: &[],
        };

        let result = calculate_slip(&slip(), &context(&snapshot), &inputs).unwrap();
        let f = &result.figures;
        assert_eq!(result.status, SlipStatus::Ready);
        assert_eq!(result.status_note, None);
        assert_eq!(f.kpi_bonus, dec("500000"));
        assert_eq!(f.total_position_income, dec("26730000"));
        assert_eq!(f.actual_working_days_income, dec("26730000"));
        assert_eq!(f.gross_income, dec("26730000"));
        assert_eq!(f.employee_insurance_total(), dec("2300000"));
        assert_eq!(f.personal_income_tax, dec("1080000"));
        assert_eq!(f.net_salary, dec("23350000"));
        assert_eq!(f.net_salary, f.reconstructed_net_salary());
        assert_eq!(result.audit_steps.len(), 17);
        assert_eq!(
            result
                .audit_steps
                .iter()
                .map(|s| s.step_number)
                .collect::<Vec<_>>(),
            (1..=17).collect::<Vec<_>>()
        );
    }

    /// PIPE-002: no contract and no timesheet
    #[test]
    fn test_no_contract_no_timesheet() {
        let snapshot = sample_snapshot();
        let employee = sample_employee();
        let inputs = SlipInputs {
            employee: &employee,
            contracts: &[],
            timesheet: None,
            kpi_assessment: None,
            travel_expenses: &[],
            sales_revenues: &[],
            vouchers: &[],
            penalty_tickets: &[],
        };

        let result = calculate_slip(&slip(), &context(&snapshot), &inputs).unwrap();
        assert_eq!(result.status, SlipStatus::Pending);
        let note = result.status_note.unwrap();
        assert!(note.contains("contract"));
        assert!(note.contains("timesheet"));
        assert_eq!(result.figures.gross_income, Decimal::ZERO);
        assert_eq!(result.figures.net_salary, Decimal::ZERO);
        assert_eq!(result.figures.base_salary, Decimal::ZERO);
    }

    /// PIPE-003: sales executive reaching M2
    #[test]
    fn test_sales_executive_m2() {
        let snapshot = sample_snapshot();
        let mut employee = sample_employee();
        employee.department_function = DepartmentFunction::Business;
        employee.position_code = "sales_executive".to_string();
        let mut contract = sample_contract();
        contract.base_salary = dec("10000000");
        contract.kpi_salary = dec("2000000");
        contract.phone_allowance = dec("0");
        let contracts = vec![contract];
        let timesheet = sample_timesheet();
        let revenue = SalesRevenue {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            month: march_2025(),
            revenue: dec("250000000"),
            transaction_count: 12,
            consumed_by: None,
        };
        let inputs = SlipInputs {
            employee: &employee,
            contracts: &contracts,
            timesheet: Some(&timesheet),
            kpi_assessment: None,
            travel_expenses: &[],
            sales_revenues: std::slice::from_ref(&revenue),
            vouchers: &[],
            penalty_tickets: &[],
        };

        let result = calculate_slip(&slip(), &context(&snapshot), &inputs).unwrap();
        assert_eq!(result.figures.business_grade, "M2");
        assert_eq!(result.figures.business_progressive_salary, dec("22270000"));
        assert_eq!(result.consumed.sales_revenues, vec![revenue.id]);
        // Default KPI grade is informational only.
        assert_eq!(result.status, SlipStatus::Ready);
        assert!(result.status_note.unwrap().contains("grade defaulted to C"));
    }

    /// PIPE-004: unpaid penalty keeps the slip pending
    #[test]
    fn test_unpaid_penalty_blocks() {
        let snapshot = sample_snapshot();
        let employee = sample_employee();
        let contracts = vec![sample_contract()];
        let timesheet = sample_timesheet();
        let ticket = PenaltyTicket {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            month: march_2025(),
            amount: dec("200000"),
            reason: "Late".to_string(),
            status: PenaltyStatus::Unpaid,
        };
        let inputs = SlipInputs {
            employee: &employee,
            contracts: &contracts,
            timesheet: Some(&timesheet),
            kpi_assessment: None,
            travel_expenses: &[],
            sales_revenues: &[],
            vouchers: &[],
            penalty_tickets: std::slice::from_ref(&ticket),
        };

        let result = calculate_slip(&slip(), &context(&snapshot), &inputs).unwrap();
        assert_eq!(result.status, SlipStatus::Pending);
        assert!(result.figures.has_unpaid_penalty);
        assert_eq!(result.figures.unpaid_penalty_count, 1);
    }

    #[test]
    fn test_travel_and_vouchers_flow_into_net() {
        let snapshot = sample_snapshot();
        let employee = sample_employee();
        let contracts = vec![sample_contract()];
        let timesheet = sample_timesheet();
        let kpi = sample_kpi_assessment();
        let travel = vec![TravelExpense {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            month: march_2025(),
            category: TravelExpenseCategory::NonTaxable,
            amount: dec("150000"),
            description: String::new(),
            consumed_by: None,
        }];
        let vouchers = vec![RecoveryVoucher {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            month: march_2025(),
            voucher_type: VoucherType::BackPay,
            amount: dec("500000"),
            reason: String::new(),
            consumed_by: None,
        }];
        let inputs = SlipInputs {
            employee: &employee,
            contracts: &contracts,
            timesheet: Some(&timesheet),
            kpi_assessment: Some(&kpi),
            travel_expenses: &travel,
            sales_revenues: &[],
            vouchers: &vouchers,
            penalty_tickets: &[],
        };

        let result = calculate_slip(&slip(), &context(&snapshot), &inputs).unwrap();
        let f = &result.figures;
        assert_eq!(f.gross_income, dec("26880000"));
        // Non-taxable travel is excluded from the tax base.
        assert_eq!(f.taxable_income_base, dec("23200000"));
        assert_eq!(f.net_salary, dec("24000000"));
        assert_eq!(result.consumed.travel_expenses.len(), 1);
        assert_eq!(result.consumed.vouchers.len(), 1);
    }

    #[test]
    fn test_empty_kpi_tiers_is_configuration_error() {
        let mut policy = sample_policy();
        policy.kpi.tiers.clear();
        let snapshot = ConfigSnapshot::capture(&policy);
        let employee = sample_employee();
        let inputs = SlipInputs {
            employee: &employee,
            contracts: &[],
            timesheet: None,
            kpi_assessment: None,
            travel_expenses: &[],
            sales_revenues: &[],
            vouchers: &[],
            penalty_tickets: &[],
        };
        let err = calculate_slip(&slip(), &context(&snapshot), &inputs).unwrap_err();
        assert!(matches!(err, EngineError::MissingPolicySection { .. }));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_same_inputs_same_figures() {
        let snapshot = sample_snapshot();
        let employee = sample_employee();
        let contracts = vec![sample_contract()];
        let mut timesheet = sample_timesheet();
        timesheet.weekend_overtime_hours = dec("4");
        let inputs = SlipInputs {
            employee: &employee,
            contracts: &contracts,
            timesheet: Some(&timesheet),
            kpi_assessment: None,
            travel_expenses: &[],
            sales_revenues: &[],
            vouchers: &[],
            penalty_tickets: &[],
        };
        let slip = slip();
        let first = calculate_slip(&slip, &context(&snapshot), &inputs).unwrap();
        let second = calculate_slip(&slip, &context(&snapshot), &inputs).unwrap();
        assert_eq!(first.figures, second.figures);
        assert_eq!(first.status_note, second.status_note);
    }
}
