//! Month-keyed source records.
//!
//! Travel expenses, recovery vouchers, sales revenues and penalty tickets all
//! belong to exactly one month. While that month's salary period is
//! completed they are read-only (penalty tickets may still be paid).
//!
//! The first three kinds are consumed by a slip calculation: once a slip has
//! counted a row, the row records the slip in `consumed_by` and no other
//! slip will count it again.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PayMonth;

/// Common accessors for records keyed by employee and month.
pub trait MonthRecord: Clone {
    /// Human-readable record kind used in error messages.
    const KIND: &'static str;

    /// The record id.
    fn id(&self) -> Uuid;

    /// The employee the record belongs to.
    fn employee_id(&self) -> &str;

    /// The month the record belongs to.
    fn month(&self) -> PayMonth;
}

/// Records that a slip calculation consumes.
pub trait ConsumableRecord: MonthRecord {
    /// The slip that has counted this record, if any.
    fn consumed_by(&self) -> Option<Uuid>;

    /// Marks the record as counted by a slip.
    fn mark_consumed(&mut self, slip_id: Uuid);

    /// Clears the consuming slip.
    fn release(&mut self);

    /// Returns true if the record may be counted by the given slip.
    fn available_to(&self, slip_id: Uuid) -> bool {
        self.consumed_by().is_none_or(|owner| owner == slip_id)
    }
}

/// Tax treatment of a travel expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelExpenseCategory {
    /// Reimbursed and taxed as income.
    Taxable,
    /// Reimbursed without tax.
    NonTaxable,
    /// Fixed monthly allowance pro-rated by working days.
    ByWorkingDays,
}

/// A travel reimbursement for an employee in a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelExpense {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee reimbursed.
    pub employee_id: String,
    /// The month the expense is paid in.
    pub month: PayMonth,
    /// Tax treatment.
    pub category: TravelExpenseCategory,
    /// Amount.
    pub amount: Decimal,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// The slip that counted this expense.
    #[serde(default)]
    pub consumed_by: Option<Uuid>,
}

/// Direction of a wage-recovery adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherType {
    /// Money owed to the employee from a previous month.
    BackPay,
    /// Money the employee owes back.
    Recovery,
}

/// A back-pay or recovery adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryVoucher {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee adjusted.
    pub employee_id: String,
    /// The month the adjustment is applied in.
    pub month: PayMonth,
    /// Direction of the adjustment.
    pub voucher_type: VoucherType,
    /// Amount (always positive).
    pub amount: Decimal,
    /// Why the adjustment was raised.
    #[serde(default)]
    pub reason: String,
    /// The slip that counted this voucher.
    #[serde(default)]
    pub consumed_by: Option<Uuid>,
}

/// Sales performance of an employee in a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRevenue {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee credited.
    pub employee_id: String,
    /// The month the sales were closed in.
    pub month: PayMonth,
    /// Revenue.
    pub revenue: Decimal,
    /// Number of closed transactions.
    pub transaction_count: u32,
    /// The slip that counted this revenue.
    #[serde(default)]
    pub consumed_by: Option<Uuid>,
}

/// Payment status of a penalty ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PenaltyStatus {
    /// Not yet paid; blocks the slip.
    Unpaid,
    /// Paid.
    Paid,
}

/// A disciplinary penalty raised against an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyTicket {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee penalised.
    pub employee_id: String,
    /// The month the penalty belongs to.
    pub month: PayMonth,
    /// Penalty amount.
    pub amount: Decimal,
    /// Violation description.
    #[serde(default)]
    pub reason: String,
    /// Payment status.
    pub status: PenaltyStatus,
}

impl PenaltyTicket {
    /// Returns true if the ticket is still unpaid.
    pub fn is_unpaid(&self) -> bool {
        self.status == PenaltyStatus::Unpaid
    }

    /// Returns true if `updated` only moves this ticket from UNPAID to PAID.
    pub fn is_payment_of(&self, updated: &PenaltyTicket) -> bool {
        if self.status != PenaltyStatus::Unpaid || updated.status != PenaltyStatus::Paid {
            return false;
        }
        let mut expected = self.clone();
        expected.status = PenaltyStatus::Paid;
        &expected == updated
    }
}

macro_rules! month_record {
    ($ty:ty, $kind:literal) => {
        impl MonthRecord for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> Uuid {
                self.id
            }

            fn employee_id(&self) -> &str {
                &self.employee_id
            }

            fn month(&self) -> PayMonth {
                self.month
            }
        }
    };
}

macro_rules! consumable_record {
    ($ty:ty) => {
        impl ConsumableRecord for $ty {
            fn consumed_by(&self) -> Option<Uuid> {
                self.consumed_by
            }

            fn mark_consumed(&mut self, slip_id: Uuid) {
                self.consumed_by = Some(slip_id);
            }

            fn release(&mut self) {
                self.consumed_by = None;
            }
        }
    };
}

month_record!(TravelExpense, "travel expense");
month_record!(RecoveryVoucher, "recovery voucher");
month_record!(SalesRevenue, "sales revenue");
month_record!(PenaltyTicket, "penalty ticket");

consumable_record!(TravelExpense);
consumable_record!(RecoveryVoucher);
consumable_record!(SalesRevenue);
