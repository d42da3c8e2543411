//! Period statistics.
//!
//! Statistics are always recomputed from scratch from the store, never
//! adjusted incrementally, and written back under the same write guard as
//! the command that triggered them.

use tracing::debug;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{PayMonth, PeriodStatistics, SlipStatus};
use crate::store::StoreData;

/// Computes a period's statistics from the current store contents.
pub fn compute_statistics(data: &StoreData, period_id: Uuid) -> EngineResult<PeriodStatistics> {
    let period = data.period(period_id)?;
    let mut stats = PeriodStatistics::default();

    for slip in data.slips_in_period(period_id) {
        stats.total_slips += 1;
        match slip.status {
            SlipStatus::Pending => stats.pending_count += 1,
            SlipStatus::Ready => stats.ready_count += 1,
            SlipStatus::Hold => stats.hold_count += 1,
            SlipStatus::Delivered => stats.delivered_count += 1,
        }
        if slip.needs_resend_email {
            stats.resend_email_count += 1;
        }
        stats.total_gross_income += slip.figures.gross_income;
        stats.total_net_salary += slip.figures.net_salary;
    }

    stats.deferred_count = stats.pending_count + stats.hold_count;
    if period.is_completed() {
        stats.deferred_count += stats.ready_count;
    }

    let month = period.month;
    stats.recovery_voucher_count = count(data.recovery_vouchers_in(month));
    stats.travel_expense_count = count(data.travel_expenses_in(month));
    for ticket in data.penalty_tickets_in(month) {
        if ticket.is_unpaid() {
            stats.unpaid_penalty_count += 1;
        } else {
            stats.paid_penalty_count += 1;
        }
    }

    Ok(stats)
}

/// Recomputes and stores a period's statistics.
pub fn refresh_statistics(data: &mut StoreData, period_id: Uuid) -> EngineResult<()> {
    let stats = compute_statistics(data, period_id)?;
    debug!(
        period_id = %period_id,
        total_slips = stats.total_slips,
        deferred = stats.deferred_count,
        "Refreshed period statistics"
    );
    data.period_mut(period_id)?.statistics = stats;
    Ok(())
}

/// Refreshes the statistics of the month's period, if there is one.
pub fn refresh_month_statistics(data: &mut StoreData, month: PayMonth) -> EngineResult<()> {
    match data.period_for_month(month).map(|p| p.id) {
        Some(period_id) => refresh_statistics(data, period_id),
        None => Ok(()),
    }
}

fn count<T>(items: impl Iterator<Item = T>) -> u32 {
    u32::try_from(items.count()).unwrap_or(u32::MAX)
}
