//! Commands on month-keyed records.
//!
//! Travel expenses, recovery vouchers, sales revenues and penalty tickets
//! can only change while their month's period is open. Every successful
//! command recalculates the slip of each employee and month it touched, then
//! refreshes the statistics of the month's period.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    MonthRecord, PayMonth, PenaltyStatus, PenaltyTicket, RecoveryVoucher, SalesRevenue,
    TravelExpense,
};
use crate::store::StoreData;

use super::PayrollService;
use super::calculation::calculate_locked;
use super::statistics::refresh_month_statistics;

/// An employee and month whose slip a record change affects.
type Target = (String, PayMonth);

fn target<R: MonthRecord>(record: &R) -> Target {
    (record.employee_id().to_string(), record.month())
}

/// Recalculates the slip of a target in its month's period, if there is one.
///
/// A failed recalculation is logged and leaves the slip as it was; the
/// record change stands.
fn recalculate_target(data: &mut StoreData, (employee_id, month): &Target) {
    let Some(slip) = data
        .period_for_month(*month)
        .and_then(|period| data.slip_for_employee(period.id, employee_id))
        .cloned()
    else {
        return;
    };
    let slip_id = slip.id;
    match calculate_locked(data, slip) {
        Ok(report) => debug!(
            slip_id = %slip_id,
            outcome = ?report.outcome,
            status = %report.slip.status,
            "Recalculated slip after record change"
        ),
        Err(err) => warn!(
            slip_id = %slip_id,
            error = %err,
            "Slip recalculation after record change failed"
        ),
    }
}

impl PayrollService {
    /// Runs a record command, recalculates the slips it affects and refreshes
    /// the statistics of every month it touched. An update that moves a
    /// record affects both its old and its new employee and month.
    fn record_command<T>(
        &self,
        kind: &'static str,
        action: &'static str,
        command: impl FnOnce(&mut StoreData) -> EngineResult<T>,
        touched: impl FnOnce(&T) -> Vec<Target>,
    ) -> EngineResult<T> {
        let result = self.store.write(|data| {
            let outcome = command(data)?;
            let mut targets = touched(&outcome);
            targets.sort();
            targets.dedup();
            for target in &targets {
                recalculate_target(data, target);
            }
            let mut months: Vec<PayMonth> = targets.iter().map(|(_, month)| *month).collect();
            months.sort();
            months.dedup();
            for month in months {
                refresh_month_statistics(data, month)?;
            }
            Ok(outcome)
        });
        match &result {
            Ok(_) => info!(record = kind, action, "Record command applied"),
            Err(err) => warn!(record = kind, action, error = %err, "Record command rejected"),
        }
        result
    }

    /// Records a travel expense.
    pub fn record_travel_expense(&self, expense: TravelExpense) -> EngineResult<()> {
        let touched = target(&expense);
        self.record_command(
            TravelExpense::KIND,
            "create",
            |data| data.insert_travel_expense(expense),
            |_| vec![touched],
        )
    }

    /// Edits a travel expense, returning the previous version.
    pub fn update_travel_expense(&self, expense: TravelExpense) -> EngineResult<TravelExpense> {
        let touched = target(&expense);
        self.record_command(
            TravelExpense::KIND,
            "update",
            |data| data.update_travel_expense(expense),
            |previous| vec![target(previous), touched],
        )
    }

    /// Deletes a travel expense.
    pub fn delete_travel_expense(&self, id: Uuid) -> EngineResult<TravelExpense> {
        self.record_command(
            TravelExpense::KIND,
            "delete",
            |data| data.remove_travel_expense(id),
            |removed| vec![target(removed)],
        )
    }

    /// Records a recovery voucher.
    pub fn record_recovery_voucher(&self, voucher: RecoveryVoucher) -> EngineResult<()> {
        let touched = target(&voucher);
        self.record_command(
            RecoveryVoucher::KIND,
            "create",
            |data| data.insert_recovery_voucher(voucher),
            |_| vec![touched],
        )
    }

    /// Edits a recovery voucher, returning the previous version.
    pub fn update_recovery_voucher(
        &self,
        voucher: RecoveryVoucher,
    ) -> EngineResult<RecoveryVoucher> {
        let touched = target(&voucher);
        self.record_command(
            RecoveryVoucher::KIND,
            "update",
            |data| data.update_recovery_voucher(voucher),
            |previous| vec![target(previous), touched],
        )
    }

    /// Deletes a recovery voucher.
    pub fn delete_recovery_voucher(&self, id: Uuid) -> EngineResult<RecoveryVoucher> {
        self.record_command(
            RecoveryVoucher::KIND,
            "delete",
            |data| data.remove_recovery_voucher(id),
            |removed| vec![target(removed)],
        )
    }

    /// Records a sales revenue row.
    pub fn record_sales_revenue(&self, revenue: SalesRevenue) -> EngineResult<()> {
        let touched = target(&revenue);
        self.record_command(
            SalesRevenue::KIND,
            "create",
            |data| data.insert_sales_revenue(revenue),
            |_| vec![touched],
        )
    }

    /// Edits a sales revenue row, returning the previous version.
    pub fn update_sales_revenue(&self, revenue: SalesRevenue) -> EngineResult<SalesRevenue> {
        let touched = target(&revenue);
        self.record_command(
            SalesRevenue::KIND,
            "update",
            |data| data.update_sales_revenue(revenue),
            |previous| vec![target(previous), touched],
        )
    }

    /// Deletes a sales revenue row.
    pub fn delete_sales_revenue(&self, id: Uuid) -> EngineResult<SalesRevenue> {
        self.record_command(
            SalesRevenue::KIND,
            "delete",
            |data| data.remove_sales_revenue(id),
            |removed| vec![target(removed)],
        )
    }

    /// Records a penalty ticket.
    pub fn record_penalty_ticket(&self, ticket: PenaltyTicket) -> EngineResult<()> {
        let touched = target(&ticket);
        self.record_command(
            PenaltyTicket::KIND,
            "create",
            |data| data.insert_penalty_ticket(ticket),
            |_| vec![touched],
        )
    }

    /// Edits a penalty ticket, returning the previous version.
    ///
    /// In a completed month only the UNPAID → PAID change is accepted.
    pub fn update_penalty_ticket(&self, ticket: PenaltyTicket) -> EngineResult<PenaltyTicket> {
        let touched = target(&ticket);
        self.record_command(
            PenaltyTicket::KIND,
            "update",
            |data| data.update_penalty_ticket(ticket),
            |previous| vec![target(previous), touched],
        )
    }

    /// Deletes a penalty ticket.
    pub fn delete_penalty_ticket(&self, id: Uuid) -> EngineResult<PenaltyTicket> {
        self.record_command(
            PenaltyTicket::KIND,
            "delete",
            |data| data.remove_penalty_ticket(id),
            |removed| vec![target(removed)],
        )
    }

    /// Marks an unpaid penalty ticket as paid.
    ///
    /// Allowed in completed months too.
    pub fn pay_penalty_ticket(&self, id: Uuid) -> EngineResult<PenaltyTicket> {
        self.record_command(
            PenaltyTicket::KIND,
            "pay",
            |data| {
                let mut ticket =
                    data.penalty_ticket(id)
                        .cloned()
                        .ok_or_else(|| EngineError::RecordNotFound {
                            record: PenaltyTicket::KIND.to_string(),
                            id,
                        })?;
                ticket.status = PenaltyStatus::Paid;
                data.update_penalty_ticket(ticket.clone())?;
                Ok(ticket)
            },
            |paid| vec![target(paid)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SlipStatus, TravelExpenseCategory, VoucherType};
    use crate::test_support::{dec, march_2025, sample_employee, service_with_slip};
    use rust_decimal::Decimal;
    use chrono::Utc;

    fn expense() -> TravelExpense {
        TravelExpense {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            month: march_2025(),
            category: TravelExpenseCategory::NonTaxable,
            amount: dec("400000"),
            description: "Site visit".to_string(),
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

    fn complete_march(service: &PayrollService, period_id: Uuid) {
        service
            .store()
            .write(|data| {
                data.period_mut(period_id)?
                    .mark_completed("payroll_manager", Utc::now())
            })
            .unwrap();
    }

    /// REC-001: creating a travel expense refreshes the month's statistics.
    #[test]
    fn test_record_travel_expense_refreshes_statistics() {
        let (service, period, _) = service_with_slip();
        service.record_travel_expense(expense()).unwrap();
        let stats = service.period(period.id).unwrap().statistics;
        assert_eq!(stats.travel_expense_count, 1);

        let row = expense();
        service.record_travel_expense(row.clone()).unwrap();
        service.delete_travel_expense(row.id).unwrap();
        let stats = service.period(period.id).unwrap().statistics;
        assert_eq!(stats.travel_expense_count, 1);
    }

    /// REC-005: paying the only unpaid ticket releases the slip without a
    /// manual recalculation.
    #[test]
    fn test_paying_penalty_recalculates_slip() {
        let (service, _, slip) = service_with_slip();
        let unpaid = ticket();
        service.record_penalty_ticket(unpaid.clone()).unwrap();
        let blocked = service.slip(slip.id).unwrap();
        assert_eq!(blocked.status, SlipStatus::Pending);
        assert!(blocked.figures.has_unpaid_penalty);

        service.pay_penalty_ticket(unpaid.id).unwrap();
        let released = service.slip(slip.id).unwrap();
        assert_eq!(released.status, SlipStatus::Ready);
        assert!(!released.figures.has_unpaid_penalty);
        assert!(
            released
                .status_note
                .is_none_or(|note| !note.contains("unpaid"))
        );
    }

    /// REC-006: moving a counted expense to another employee moves the money
    /// with it.
    #[test]
    fn test_moved_expense_is_counted_by_new_owner() {
        let (service, period, first) = service_with_slip();
        let mut colleague = sample_employee();
        colleague.id = "emp_002".to_string();
        service.upsert_employee(colleague).unwrap();
        let second = service.onboard_employee(period.id, "emp_002").unwrap();

        let mut row = expense();
        row.category = TravelExpenseCategory::Taxable;
        row.amount = dec("300000");
        service.record_travel_expense(row.clone()).unwrap();
        let counted = service.calculate(first.id).unwrap().slip;
        assert_eq!(counted.figures.taxable_travel_expense, dec("300000"));

        let mut moved = row.clone();
        moved.employee_id = "emp_002".to_string();
        service.update_travel_expense(moved).unwrap();

        let first = service.slip(first.id).unwrap();
        let second = service.slip(second.id).unwrap();
        assert_eq!(first.figures.taxable_travel_expense, Decimal::ZERO);
        assert_eq!(second.figures.taxable_travel_expense, dec("300000"));
        let owner = service
            .store()
            .read(|data| data.travel_expense(row.id).and_then(|r| r.consumed_by));
        assert_eq!(owner, Some(second.id));
    }

    /// REC-002: a completed month rejects record edits.
    #[test]
    fn test_completed_month_rejects_voucher() {
        let (service, period, _) = service_with_slip();
        complete_march(&service, period.id);
        let voucher = RecoveryVoucher {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            month: march_2025(),
            voucher_type: VoucherType::BackPay,
            amount: dec("500000"),
            reason: "Correction".to_string(),
            consumed_by: None,
        };
        let result = service.record_recovery_voucher(voucher);
        assert!(matches!(result, Err(EngineError::PeriodLocked { .. })));
    }

    /// REC-003: paying a ticket is allowed after the month is completed.
    #[test]
    fn test_pay_penalty_in_completed_month() {
        let (service, period, _) = service_with_slip();
        let unpaid = ticket();
        service.record_penalty_ticket(unpaid.clone()).unwrap();
        complete_march(&service, period.id);

        let paid = service.pay_penalty_ticket(unpaid.id).unwrap();
        assert_eq!(paid.status, PenaltyStatus::Paid);
        let stats = service.period(period.id).unwrap().statistics;
        assert_eq!(stats.paid_penalty_count, 1);
        assert_eq!(stats.unpaid_penalty_count, 0);
    }

    /// REC-004: any other ticket edit in a completed month is rejected.
    #[test]
    fn test_edit_penalty_in_completed_month_is_rejected() {
        let (service, period, _) = service_with_slip();
        let unpaid = ticket();
        service.record_penalty_ticket(unpaid.clone()).unwrap();
        complete_march(&service, period.id);

        let mut edited = unpaid.clone();
        edited.reason = "Rewritten".to_string();
        let result = service.update_penalty_ticket(edited);
        assert!(matches!(
            result,
            Err(EngineError::PenaltyTicketLocked { .. })
        ));
        assert!(matches!(
            service.delete_penalty_ticket(unpaid.id),
            Err(EngineError::PeriodLocked { .. })
        ));
    }

    #[test]
    fn test_pay_unknown_ticket() {
        let (service, _, _) = service_with_slip();
        let result = service.pay_penalty_ticket(Uuid::new_v4());
        assert!(matches!(result, Err(EngineError::RecordNotFound { .. })));
    }

    #[test]
    fn test_update_sales_revenue_returns_previous() {
        let (service, _, _) = service_with_slip();
        let row = SalesRevenue {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            month: march_2025(),
            revenue: dec("100000000"),
            transaction_count: 4,
            consumed_by: None,
        };
        service.record_sales_revenue(row.clone()).unwrap();
        let mut edited = row.clone();
        edited.transaction_count = 6;
        let previous = service.update_sales_revenue(edited).unwrap();
        assert_eq!(previous.transaction_count, 4);
        assert_eq!(service.delete_sales_revenue(row.id).unwrap().transaction_count, 6);
    }
}
