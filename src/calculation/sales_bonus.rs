//! Sales (business progressive) bonus calculation.
//!
//! Only employees in the policy's sales position qualify. The month's sales
//! revenue rows are summed, the highest-paying tier whose criteria all hold
//! is selected, and the bonus tops the employee's fixed income up to the
//! tier amount.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::{SalesMetric, SalesTier};
use crate::models::{AuditStep, ConsumableRecord, SalesRevenue};

use super::round_money;

/// Fixed income the tier amount is reduced by.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalesBonusDeductions {
    /// Base salary.
    pub base_salary: Decimal,
    /// KPI salary.
    pub kpi_salary: Decimal,
    /// Lunch allowance.
    pub lunch_allowance: Decimal,
    /// Other allowances.
    pub other_allowance: Decimal,
    /// Travel allowance pro-rated by working days.
    pub travel_expense_by_working_days: Decimal,
}

impl SalesBonusDeductions {
    fn total(&self) -> Decimal {
        self.base_salary
            + self.kpi_salary
            + self.lunch_allowance
            + self.other_allowance
            + self.travel_expense_by_working_days
    }
}

/// The result of the sales bonus stage.
#[derive(Debug, Clone)]
pub struct SalesBonusResult {
    /// Revenue summed over the counted rows.
    pub revenue: Decimal,
    /// Transactions summed over the counted rows.
    pub transaction_count: u32,
    /// Tier code reached, or the default grade.
    pub grade: String,
    /// The bonus; never negative.
    pub bonus: Decimal,
    /// Rows counted into the totals.
    pub counted: Vec<Uuid>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

fn tier_qualifies(tier: &SalesTier, revenue: Decimal, transaction_count: u32) -> bool {
    tier.criteria.iter().all(|criterion| {
        let actual = match criterion.metric {
            SalesMetric::Revenue => revenue,
            SalesMetric::TransactionCount => Decimal::from(transaction_count),
        };
        actual >= criterion.min
    })
}

/// Selects the highest-paying tier whose criteria all hold.
pub fn select_tier(
    tiers: &[SalesTier],
    revenue: Decimal,
    transaction_count: u32,
) -> Option<&SalesTier> {
    let mut ordered: Vec<&SalesTier> = tiers.iter().collect();
    ordered.sort_by(|a, b| b.amount.cmp(&a.amount));
    ordered
        .into_iter()
        .find(|tier| tier_qualifies(tier, revenue, transaction_count))
}

/// Calculates the sales bonus.
///
/// `tiers` must be non-empty for eligible employees; the caller validates
/// the snapshot. Non-eligible employees still have their revenue summed for
/// reporting but always receive the default grade and no bonus.
pub fn calculate_sales_bonus(
    eligible: bool,
    sales: &[SalesRevenue],
    slip_id: Uuid,
    tiers: &[SalesTier],
    default_grade: &str,
    deductions: SalesBonusDeductions,
    step_number: u32,
) -> SalesBonusResult {
    let mut revenue = Decimal::ZERO;
    let mut transaction_count = 0u32;
    let mut counted = Vec::new();
    for row in sales.iter().filter(|row| row.available_to(slip_id)) {
        revenue += row.revenue;
        transaction_count = transaction_count.saturating_add(row.transaction_count);
        counted.push(row.id);
    }
    let revenue = round_money(revenue);

    let tier = if eligible {
        select_tier(tiers, revenue, transaction_count)
    } else {
        None
    };

    let (grade, bonus, reasoning) = match tier {
        Some(tier) => {
            let bonus = round_money((tier.amount - deductions.total()).max(Decimal::ZERO));
            (
                tier.code.clone(),
                bonus,
                format!(
                    "Revenue {} over {} transactions reaches {} ({}); \
                     bonus {} after fixed income {}",
                    revenue,
                    transaction_count,
                    tier.code,
                    tier.amount,
                    bonus,
                    deductions.total()
                ),
            )
        }
        None if eligible => (
            default_grade.to_string(),
            Decimal::ZERO,
            format!(
                "Revenue {} over {} transactions reaches no tier",
                revenue, transaction_count
            ),
        ),
        None => (
            default_grade.to_string(),
            Decimal::ZERO,
            "Position is not eligible for the sales bonus".to_string(),
        ),
    };

    let audit_step = AuditStep::new(
        step_number,
        "sales_bonus",
        "Sales Progressive Bonus",
        serde_json::json!({
            "eligible": eligible,
            "revenue": revenue.to_string(),
            "transaction_count": transaction_count,
            "fixed_income": deductions.total().to_string(),
        }),
        serde_json::json!({
            "grade": grade,
            "bonus": bonus.to_string(),
        }),
        reasoning,
    );

    SalesBonusResult {
        revenue,
        transaction_count,
        grade,
        bonus,
        counted,
        audit_step,
    }
}
