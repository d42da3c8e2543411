//! KPI bonus calculation.
//!
//! The grade comes from the month's KPI assessment: the HR grade wins over
//! the manager grade, and the policy default applies when neither exists.
//! Sales employees earn the bonus on their base salary; everyone else earns
//! it on their KPI salary.

use rust_decimal::Decimal;

use crate::config::KpiConfig;
use crate::models::{AuditStep, KpiAssessment};

use super::round_money;

/// The result of the KPI bonus stage.
#[derive(Debug, Clone)]
pub struct KpiBonusResult {
    /// The grade applied.
    pub grade: String,
    /// The percentage attached to the grade (0 for unknown grades).
    pub percentage: Decimal,
    /// The rounded bonus.
    pub bonus: Decimal,
    /// True when the policy default grade was used.
    pub defaulted: bool,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the KPI bonus.
///
/// An empty tier map must be rejected by the caller before this stage runs;
/// here an unknown grade simply earns 0%.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_kpi_bonus;
/// use payroll_engine::config::KpiConfig;
/// use rust_decimal::Decimal;
/// use std::collections::BTreeMap;
///
/// let config = KpiConfig {
///     tiers: BTreeMap::from([("A".to_string(), Decimal::new(10, 2))]),
///     default_grade: "C".to_string(),
/// };
/// let result = calculate_kpi_bonus(
///     Some("A"),
///     false,
///     Decimal::new(20_000_000, 0),
///     Decimal::new(5_000_000, 0),
///     &config,
///     3,
/// );
/// assert_eq!(result.bonus, Decimal::new(500_000, 0));
/// ```
pub fn calculate_kpi_bonus(
    assessed_grade: Option<&str>,
    is_sale_employee: bool,
    base_salary: Decimal,
    kpi_salary: Decimal,
    config: &KpiConfig,
    step_number: u32,
) -> KpiBonusResult {
    let defaulted = assessed_grade.is_none();
    let grade = assessed_grade
        .map(str::to_string)
        .unwrap_or_else(|| config.default_grade.clone());
    let percentage = config.tiers.get(&grade).copied().unwrap_or(Decimal::ZERO);

    let (bonus_base, base_name) = if is_sale_employee {
        (base_salary, "base salary")
    } else {
        (kpi_salary, "KPI salary")
    };
    let bonus = round_money(bonus_base * percentage);

    let reasoning = format!(
        "Grade {}{} at {}% of {} {} = {}",
        grade,
        if defaulted { " (default)" } else { "" },
        percentage * Decimal::ONE_HUNDRED,
        base_name,
        bonus_base,
        bonus
    );

    let audit_step = AuditStep::new(
        step_number,
        "kpi_bonus",
        "KPI Bonus",
        serde_json::json!({
            "assessed_grade": assessed_grade,
            "is_sale_employee": is_sale_employee,
            "bonus_base": bonus_base.to_string(),
        }),
        serde_json::json!({
            "grade": grade,
            "percentage": percentage.to_string(),
            "bonus": bonus.to_string(),
        }),
        reasoning,
    );

    KpiBonusResult {
        grade,
        percentage,
        bonus,
        defaulted,
        audit_step,
    }
}

/// Picks the grade from an assessment, HR first.
pub fn assessed_grade(assessment: Option<&KpiAssessment>) -> Option<&str> {
    let assessment = assessment?;
    non_blank(&assessment.hr_grade).or_else(|| non_blank(&assessment.manager_grade))
}

fn non_blank(grade: &Option<String>) -> Option<&str> {
    grade
        .as_deref()
        .map(str::trim)
        .filter(|grade| !grade.is_empty())
}
