//! Back pay and recovery vouchers, net salary and penalty checks.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{AuditStep, ConsumableRecord, PenaltyTicket, RecoveryVoucher, VoucherType};

use super::round_money;

/// Totals of the month's vouchers.
#[derive(Debug, Clone)]
pub struct VoucherTotals {
    /// Money owed to the employee.
    pub back_pay: Decimal,
    /// Money recovered from the employee.
    pub recovery: Decimal,
    /// Rows counted into the totals.
    pub counted: Vec<Uuid>,
    /// The audit step recording this aggregation.
    pub audit_step: AuditStep,
}

/// Sums the vouchers available to `slip_id` by type.
pub fn aggregate_vouchers(
    vouchers: &[RecoveryVoucher],
    slip_id: Uuid,
    step_number: u32,
) -> VoucherTotals {
    let mut back_pay = Decimal::ZERO;
    let mut recovery = Decimal::ZERO;
    let mut counted = Vec::new();
    for voucher in vouchers.iter().filter(|v| v.available_to(slip_id)) {
        match voucher.voucher_type {
            VoucherType::BackPay => back_pay += voucher.amount,
            VoucherType::Recovery => recovery += voucher.amount,
        }
        counted.push(voucher.id);
    }
    let back_pay = round_money(back_pay);
    let recovery = round_money(recovery);

    let audit_step = AuditStep::new(
        step_number,
        "vouchers",
        "Back Pay and Recovery",
        serde_json::json!({ "rows": vouchers.len() }),
        serde_json::json!({
            "back_pay_amount": back_pay.to_string(),
            "recovery_amount": recovery.to_string(),
            "counted": counted.len(),
        }),
        format!(
            "{} voucher(s): back pay {}, recovery {}",
            counted.len(),
            back_pay,
            recovery
        ),
    );

    VoucherTotals {
        back_pay,
        recovery,
        counted,
        audit_step,
    }
}

/// Components of net salary.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetSalaryComponents {
    /// Gross income.
    pub gross_income: Decimal,
    /// Sum of the employee insurance contributions.
    pub employee_insurance: Decimal,
    /// Back pay.
    pub back_pay_amount: Decimal,
    /// Recovery.
    pub recovery_amount: Decimal,
    /// Income tax.
    pub personal_income_tax: Decimal,
}

/// The result of the net salary stage.
#[derive(Debug, Clone)]
pub struct NetSalaryResult {
    /// Net salary.
    pub net_salary: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates net salary.
///
/// Net salary may be negative when recoveries exceed earnings.
pub fn calculate_net_salary(components: &NetSalaryComponents, step_number: u32) -> NetSalaryResult {
    let net_salary = round_money(
        components.gross_income - components.employee_insurance + components.back_pay_amount
            - components.recovery_amount
            - components.personal_income_tax,
    );

    let audit_step = AuditStep::new(
        step_number,
        "net_salary",
        "Net Salary",
        serde_json::json!({
            "gross_income": components.gross_income.to_string(),
            "employee_insurance": components.employee_insurance.to_string(),
            "back_pay_amount": components.back_pay_amount.to_string(),
            "recovery_amount": components.recovery_amount.to_string(),
            "personal_income_tax": components.personal_income_tax.to_string(),
        }),
        serde_json::json!({ "net_salary": net_salary.to_string() }),
        format!(
            "{} - {} insurance + {} back pay - {} recovery - {} tax = {}",
            components.gross_income,
            components.employee_insurance,
            components.back_pay_amount,
            components.recovery_amount,
            components.personal_income_tax,
            net_salary
        ),
    );

    NetSalaryResult {
        net_salary,
        audit_step,
    }
}

/// The result of the penalty check.
#[derive(Debug, Clone)]
pub struct PenaltyCheck {
    /// Unpaid tickets for the month.
    pub unpaid_count: u32,
    /// The audit step recording this check.
    pub audit_step: AuditStep,
}

impl PenaltyCheck {
    /// Returns true if any ticket is unpaid.
    pub fn has_unpaid(&self) -> bool {
        self.unpaid_count > 0
    }
}

/// Counts the month's unpaid penalty tickets.
pub fn check_penalties(tickets: &[PenaltyTicket], step_number: u32) -> PenaltyCheck {
    let unpaid_count = tickets.iter().filter(|t| t.is_unpaid()).count() as u32;

    let audit_step = AuditStep::new(
        step_number,
        "penalties",
        "Penalty Tickets",
        serde_json::json!({ "tickets": tickets.len() }),
        serde_json::json!({ "unpaid_penalty_count": unpaid_count }),
        if unpaid_count > 0 {
            format!("{} unpaid penalty ticket(s) block payment", unpaid_count)
        } else {
            "No unpaid penalty tickets".to_string()
        },
    );

    PenaltyCheck {
        unpaid_count,
        audit_step,
    }
}
