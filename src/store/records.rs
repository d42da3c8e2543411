//! Month-keyed record tables and the closed-month protection rule.
//!
//! While a month's salary period is COMPLETED, its travel expenses,
//! recovery vouchers, sales revenues and penalty tickets cannot be created,
//! edited or deleted. The one exception is paying a penalty ticket.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{ConsumableRecord, MonthRecord, PayMonth, PenaltyTicket};

/// Months whose salary period is completed.
pub(crate) type ClosedMonths = BTreeSet<PayMonth>;

fn ensure_open<R: MonthRecord>(closed: &ClosedMonths, month: PayMonth) -> EngineResult<()> {
    if closed.contains(&month) {
        return Err(EngineError::PeriodLocked {
            month,
            record: R::KIND.to_string(),
        });
    }
    Ok(())
}

fn not_found<R: MonthRecord>(id: Uuid) -> EngineError {
    EngineError::RecordNotFound {
        record: R::KIND.to_string(),
        id,
    }
}

/// Inserts a record into an open month.
pub(crate) fn insert<R: MonthRecord>(
    table: &mut BTreeMap<Uuid, R>,
    closed: &ClosedMonths,
    record: R,
) -> EngineResult<()> {
    ensure_open::<R>(closed, record.month())?;
    table.insert(record.id(), record);
    Ok(())
}

/// Replaces a consumable record.
///
/// Both the old and the new month must be open. The consuming slip is kept
/// while the record stays with the same employee and month; a record moved
/// elsewhere is released so the slip that now owns it can count it. Returns
/// the previous version.
pub(crate) fn update_consumable<R: ConsumableRecord>(
    table: &mut BTreeMap<Uuid, R>,
    closed: &ClosedMonths,
    mut record: R,
) -> EngineResult<R> {
    let previous = table
        .get(&record.id())
        .cloned()
        .ok_or_else(|| not_found::<R>(record.id()))?;
    ensure_open::<R>(closed, previous.month())?;
    ensure_open::<R>(closed, record.month())?;
    let moved =
        previous.employee_id() != record.employee_id() || previous.month() != record.month();
    match previous.consumed_by() {
        Some(owner) if !moved => record.mark_consumed(owner),
        _ => record.release(),
    }
    table.insert(record.id(), record);
    Ok(previous)
}

/// Removes a record from an open month.
pub(crate) fn remove<R: MonthRecord>(
    table: &mut BTreeMap<Uuid, R>,
    closed: &ClosedMonths,
    id: Uuid,
) -> EngineResult<R> {
    let month = table
        .get(&id)
        .map(|r| r.month())
        .ok_or_else(|| not_found::<R>(id))?;
    ensure_open::<R>(closed, month)?;
    table.remove(&id).ok_or_else(|| not_found::<R>(id))
}

/// Replaces a penalty ticket.
///
/// In a closed month the only permitted change is UNPAID → PAID with every
/// other field untouched.
pub(crate) fn update_penalty_ticket(
    table: &mut BTreeMap<Uuid, PenaltyTicket>,
    closed: &ClosedMonths,
    ticket: PenaltyTicket,
) -> EngineResult<PenaltyTicket> {
    let previous = table
        .get(&ticket.id)
        .cloned()
        .ok_or_else(|| not_found::<PenaltyTicket>(ticket.id))?;
    let touches_closed = closed.contains(&previous.month) || closed.contains(&ticket.month);
    if touches_closed && !previous.is_payment_of(&ticket) {
        return Err(EngineError::PenaltyTicketLocked {
            ticket_id: ticket.id,
            month: previous.month,
        });
    }
    table.insert(ticket.id, ticket);
    Ok(previous)
}

/// Records in a table for one employee and month.
pub(crate) fn for_employee<R: MonthRecord>(
    table: &BTreeMap<Uuid, R>,
    employee_id: &str,
    month: PayMonth,
) -> Vec<R> {
    table
        .values()
        .filter(|r| r.employee_id() == employee_id && r.month() == month)
        .cloned()
        .collect()
}

/// Makes `ids` the exact set of rows counted by a slip.
///
/// Rows in `ids` are marked; rows the slip held before but no longer counts
/// are released.
pub(crate) fn assign_consumed<R: ConsumableRecord>(
    table: &mut BTreeMap<Uuid, R>,
    ids: &[Uuid],
    slip_id: Uuid,
) {
    for (id, record) in table.iter_mut() {
        if ids.contains(id) {
            record.mark_consumed(slip_id);
        } else if record.consumed_by() == Some(slip_id) {
            record.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PenaltyStatus, TravelExpense, TravelExpenseCategory};
    use crate::test_support::{dec, march_2025};

    fn expense() -> TravelExpense {
        TravelExpense {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            month: march_2025(),
            category: TravelExpenseCategory::Taxable,
            amount: dec("300000"),
            description: "Client visit".to_string(),
            consumed_by: None,
        }
    }

    fn ticket() -> PenaltyTicket {
        PenaltyTicket {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            month: march_2025(),
            amount: dec("200000"),
            reason: "Late".to_string(),
            status: PenaltyStatus::Unpaid,
        }
    }

    fn closed_march() -> ClosedMonths {
        BTreeSet::from([march_2025()])
    }

    #[test]
    fn test_insert_into_closed_month_is_rejected() {
        let mut table = BTreeMap::new();
        let result = insert(&mut table, &closed_march(), expense());
        match result {
            Err(EngineError::PeriodLocked { month, record }) => {
                assert_eq!(month, march_2025());
                assert_eq!(record, "travel expense");
            }
            other => panic!("Expected PeriodLocked, got {:?}", other),
        }
        assert!(table.is_empty());
    }

    #[test]
    fn test_update_keeps_consumer() {
        let mut table = BTreeMap::new();
        let mut row = expense();
        let slip = Uuid::new_v4();
        row.consumed_by = Some(slip);
        insert(&mut table, &ClosedMonths::new(), row.clone()).unwrap();

        let mut edited = row.clone();
        edited.amount = dec("350000");
        edited.consumed_by = None;
        let previous = update_consumable(&mut table, &ClosedMonths::new(), edited).unwrap();
        assert_eq!(previous.amount, dec("300000"));
        assert_eq!(table[&row.id].consumed_by, Some(slip));
        assert_eq!(table[&row.id].amount, dec("350000"));
    }

    #[test]
    fn test_remove_from_closed_month_is_rejected() {
        let mut table = BTreeMap::new();
        let row = expense();
        insert(&mut table, &ClosedMonths::new(), row.clone()).unwrap();
        let result = remove(&mut table, &closed_march(), row.id);
        assert!(matches!(result, Err(EngineError::PeriodLocked { .. })));
        assert!(table.contains_key(&row.id));
    }

    #[test]
    fn test_missing_record() {
        let mut table: BTreeMap<Uuid, TravelExpense> = BTreeMap::new();
        let result = remove(&mut table, &ClosedMonths::new(), Uuid::nil());
        assert!(matches!(result, Err(EngineError::RecordNotFound { .. })));
    }

    #[test]
    fn test_penalty_payment_allowed_in_closed_month() {
        let mut table = BTreeMap::new();
        let original = ticket();
        table.insert(original.id, original.clone());

        let mut paid = original.clone();
        paid.status = PenaltyStatus::Paid;
        assert!(update_penalty_ticket(&mut table, &closed_march(), paid).is_ok());
        assert_eq!(table[&original.id].status, PenaltyStatus::Paid);
    }

    #[test]
    fn test_penalty_edit_rejected_in_closed_month() {
        let mut table = BTreeMap::new();
        let original = ticket();
        table.insert(original.id, original.clone());

        let mut edited = original.clone();
        edited.status = PenaltyStatus::Paid;
        edited.amount = dec("100000");
        let result = update_penalty_ticket(&mut table, &closed_march(), edited);
        assert!(matches!(
            result,
            Err(EngineError::PenaltyTicketLocked { .. })
        ));
        assert_eq!(table[&original.id], original);
    }

    #[test]
    fn test_update_moving_record_releases_consumer() {
        let mut table = BTreeMap::new();
        let mut row = expense();
        row.consumed_by = Some(Uuid::new_v4());
        insert(&mut table, &ClosedMonths::new(), row.clone()).unwrap();

        let mut moved = row.clone();
        moved.employee_id = "emp_002".to_string();
        update_consumable(&mut table, &ClosedMonths::new(), moved).unwrap();
        assert_eq!(table[&row.id].consumed_by, None);

        let mut next_month = table[&row.id].clone();
        next_month.consumed_by = Some(Uuid::new_v4());
        table.insert(row.id, next_month.clone());
        next_month.month = march_2025().next();
        update_consumable(&mut table, &ClosedMonths::new(), next_month).unwrap();
        assert_eq!(table[&row.id].consumed_by, None);
    }

    #[test]
    fn test_assign_consumed() {
        let mut table = BTreeMap::new();
        let slip = Uuid::new_v4();
        let other_slip = Uuid::new_v4();
        let counted = expense();
        let mut dropped = expense();
        dropped.consumed_by = Some(slip);
        let mut foreign = expense();
        foreign.consumed_by = Some(other_slip);
        for row in [&counted, &dropped, &foreign] {
            table.insert(row.id, row.clone());
        }

        assign_consumed(&mut table, &[counted.id], slip);
        assert_eq!(table[&counted.id].consumed_by, Some(slip));
        assert_eq!(table[&dropped.id].consumed_by, None);
        assert_eq!(table[&foreign.id].consumed_by, Some(other_slip));
    }
}
