//! Travel expense aggregation.
//!
//! Sums the month's travel reimbursements per category. Rows already
//! counted by another slip are skipped.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{AuditStep, ConsumableRecord, TravelExpense, TravelExpenseCategory};

use super::round_money;

/// Totals per travel expense category.
#[derive(Debug, Clone)]
pub struct TravelExpenseTotals {
    /// Taxable reimbursements.
    pub taxable: Decimal,
    /// Non-taxable reimbursements.
    pub non_taxable: Decimal,
    /// Allowance pro-rated by working days.
    pub by_working_days: Decimal,
    /// Rows counted into the totals.
    pub counted: Vec<Uuid>,
    /// The audit step recording this aggregation.
    pub audit_step: AuditStep,
}

/// Aggregates the travel expenses available to `slip_id`.
pub fn aggregate_travel_expenses(
    expenses: &[TravelExpense],
    slip_id: Uuid,
    step_number: u32,
) -> TravelExpenseTotals {
    let mut taxable = Decimal::ZERO;
    let mut non_taxable = Decimal::ZERO;
    let mut by_working_days = Decimal::ZERO;
    let mut counted = Vec::new();
    let mut skipped = 0usize;

    for expense in expenses {
        if !expense.available_to(slip_id) {
            skipped += 1;
            continue;
        }
        match expense.category {
            TravelExpenseCategory::Taxable => taxable += expense.amount,
            TravelExpenseCategory::NonTaxable => non_taxable += expense.amount,
            TravelExpenseCategory::ByWorkingDays => by_working_days += expense.amount,
        }
        counted.push(expense.id);
    }

    let taxable = round_money(taxable);
    let non_taxable = round_money(non_taxable);
    let by_working_days = round_money(by_working_days);

    let reasoning = format!(
        "{} expense(s) counted, {} already used by another slip: \
         taxable {}, non-taxable {}, by working days {}",
        counted.len(),
        skipped,
        taxable,
        non_taxable,
        by_working_days
    );

    let audit_step = AuditStep::new(
        step_number,
        "travel_expense",
        "Travel Expenses",
        serde_json::json!({ "rows": expenses.len() }),
        serde_json::json!({
            "taxable": taxable.to_string(),
            "non_taxable": non_taxable.to_string(),
            "by_working_days": by_working_days.to_string(),
            "counted": counted.len(),
        }),
        reasoning,
    );

    TravelExpenseTotals {
        taxable,
        non_taxable,
        by_working_days,
        counted,
        audit_step,
    }
}
