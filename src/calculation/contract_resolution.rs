//! Contract resolution.
//!
//! Picks the single contract that drives a slip for a month.

use std::cmp::Ordering;

use crate::models::{AuditStep, Contract, ContractStatus, Employee, PayMonth};

/// The result of resolving an employee's contract for a month.
#[derive(Debug, Clone)]
pub struct ContractResolution {
    /// The contract that applies, if any.
    pub contract: Option<Contract>,
    /// The audit step recording this lookup.
    pub audit_step: AuditStep,
}

/// Orders contracts by (effective date, sign date, creation time, id).
fn recency(a: &Contract, b: &Contract) -> Ordering {
    a.effective_date
        .cmp(&b.effective_date)
        .then(a.sign_date.cmp(&b.sign_date))
        .then(a.created_at.cmp(&b.created_at))
        .then(a.id.cmp(&b.id))
}

/// Resolves the contract that applies to an employee for a month.
///
/// - Resigned employees use their latest contract of any status whose
///   effective date is on or before the last day of the month.
/// - Everyone else uses their latest ACTIVE contract.
///
/// Ties on effective date are broken by sign date, then creation time,
/// most recent first, and finally by id. Contracts of other employees are
/// ignored.
pub fn resolve_contract(
    employee: &Employee,
    contracts: &[Contract],
    month: PayMonth,
    step_number: u32,
) -> ContractResolution {
    let month_end = month.last_day();
    let candidates = contracts.iter().filter(|c| c.employee_id == employee.id);

    let contract = if employee.is_resigned() {
        candidates
            .filter(|c| c.effective_date <= month_end)
            .max_by(|a, b| recency(a, b))
    } else {
        candidates
            .filter(|c| c.status == ContractStatus::Active)
            .max_by(|a, b| recency(a, b))
    }
    .cloned();

    let rule = if employee.is_resigned() {
        "latest contract effective by month end (resigned employee)"
    } else {
        "latest active contract"
    };

    let reasoning = match &contract {
        Some(c) => format!(
            "Using {} {} effective {}",
            rule, c.id, c.effective_date
        ),
        None => format!("No contract found for {} using rule: {}", month, rule),
    };

    let audit_step = AuditStep::new(
        step_number,
        "contract_resolution",
        "Contract Resolution",
        serde_json::json!({
            "employee_id": employee.id,
            "month": month.to_string(),
            "resigned": employee.is_resigned(),
            "candidates": contracts.iter().filter(|c| c.employee_id == employee.id).count()
        }),
        serde_json::json!({
            "contract_id": contract.as_ref().map(|c| c.id.to_string()),
        }),
        reasoning,
    );

    ContractResolution {
        contract,
        audit_step,
    }
}
