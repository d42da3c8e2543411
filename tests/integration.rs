//! Integration tests for the payroll engine.
//!
//! These tests drive the public service API and the HTTP router against the
//! policy shipped in `config/policy`:
//! - Missing contract and timesheet
//! - Sales bonus tiers
//! - Insurance eligibility around the conversion cutoff
//! - Period completion and carry-over delivery
//! - Uncomplete ordering
//! - Hold/unhold and the frozen round-trip
//! - HTTP commands

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::error::EngineError;
use payroll_engine::models::{
    Contract, ContractStatus, DepartmentFunction, Employee, EmploymentStatus, EmploymentType,
    NetPercentage, PayMonth, PenaltyStatus, PenaltyTicket, PeriodDeadlines, PeriodStatus,
    SalesRevenue, SalaryPeriod, SlipStatus, TaxCalculationMethod, Timesheet,
};
use payroll_engine::service::{CalculationOutcome, PayrollService};
use payroll_engine::store::PayrollStore;

// =============================================================================
// Test Helpers
// =============================================================================

fn create_test_service() -> PayrollService {
    let config = ConfigLoader::load("./config/policy").expect("Failed to load config");
    PayrollService::new(Arc::new(PayrollStore::new()), Arc::new(config))
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn month(year: i32, month: u32) -> PayMonth {
    PayMonth::new(year, month).unwrap()
}

fn employee(id: &str, position_code: &str) -> Employee {
    Employee {
        id: id.to_string(),
        code: id.to_uppercase(),
        full_name: format!("Employee {}", id),
        department: "Operations".to_string(),
        department_function: if position_code == "sales_executive" {
            DepartmentFunction::Business
        } else {
            DepartmentFunction::Support
        },
        position_code: position_code.to_string(),
        position_name: position_code.to_string(),
        employment_type: EmploymentType::Official,
        status: EmploymentStatus::Active,
        start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        resignation_date: None,
        official_conversion_date: None,
        dependent_count: 0,
    }
}

fn contract(employee_id: &str) -> Contract {
    Contract {
        id: Uuid::new_v4(),
        employee_id: employee_id.to_string(),
        status: ContractStatus::Active,
        effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        sign_date: NaiveDate::from_ymd_opt(2023, 12, 20),
        created_at: Utc.with_ymd_and_hms(2023, 12, 20, 8, 0, 0).unwrap(),
        base_salary: decimal("20000000"),
        kpi_salary: decimal("5000000"),
        lunch_allowance: decimal("730000"),
        phone_allowance: decimal("500000"),
        other_allowance: decimal("0"),
        tax_calculation_method: Some(TaxCalculationMethod::Progressive),
        net_percentage: NetPercentage::Full,
        has_social_insurance: true,
    }
}

fn timesheet(employee_id: &str, month: PayMonth) -> Timesheet {
    Timesheet {
        employee_id: employee_id.to_string(),
        month,
        official_working_days: decimal("21"),
        probation_working_days: decimal("0"),
        total_working_days: decimal("21"),
        weekday_overtime_hours: decimal("0"),
        weekend_overtime_hours: decimal("0"),
        holiday_overtime_hours: decimal("0"),
    }
}

/// Registers an employee with a contract and a full timesheet for `month`.
fn onboard(service: &PayrollService, id: &str, position_code: &str, month: PayMonth) {
    service.upsert_employee(employee(id, position_code)).unwrap();
    service.upsert_contract(contract(id)).unwrap();
    service.upsert_timesheet(timesheet(id, month)).unwrap();
}

fn create_period(service: &PayrollService, month: PayMonth) -> SalaryPeriod {
    service
        .create_period(month, Some(decimal("21")), PeriodDeadlines::default())
        .unwrap()
}

fn slip_id_for(service: &PayrollService, period_id: Uuid, employee_id: &str) -> Uuid {
    service
        .store()
        .read(|data| data.slip_for_employee(period_id, employee_id).map(|s| s.id))
        .expect("slip exists")
}

async fn send(
    router: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

// =============================================================================
// Calculation Scenarios
// =============================================================================

/// INT-001: no contract and no timesheet leaves the slip PENDING with zeros
#[test]
fn test_missing_contract_and_timesheet_is_pending() {
    let service = create_test_service();
    let march = month(2025, 3);
    service.upsert_employee(employee("emp_bare", "accountant")).unwrap();
    let period = create_period(&service, march);
    let slip = service.generate_slips(period.id).unwrap().remove(0);

    let report = service.calculate(slip.id).unwrap();

    assert_eq!(report.outcome, CalculationOutcome::Calculated);
    assert_eq!(report.slip.status, SlipStatus::Pending);
    let note = report.slip.status_note.clone().unwrap().to_lowercase();
    assert!(note.contains("contract"));
    assert!(note.contains("timesheet"));
    assert_eq!(report.slip.figures.base_salary, Decimal::ZERO);
    assert_eq!(report.slip.figures.gross_income, Decimal::ZERO);
    assert_eq!(report.slip.figures.net_salary, Decimal::ZERO);
}

/// INT-002: a fully documented official is READY with the expected net
#[test]
fn test_complete_inputs_are_ready() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_001", "accountant", march);
    let period = create_period(&service, march);
    let slip = service.generate_slips(period.id).unwrap().remove(0);

    let report = service.calculate(slip.id).unwrap();
    let figures = &report.slip.figures;

    assert_eq!(report.slip.status, SlipStatus::Ready);
    assert!(report.slip.status_note.is_some(), "defaulted KPI grade is noted");
    assert_eq!(figures.kpi_grade, "C");
    assert_eq!(figures.net_salary, figures.reconstructed_net_salary());
    assert!(!report.audit_steps.is_empty());
}

/// INT-003: 250M over 10 transactions reaches M2 and the bonus is topped up
#[test]
fn test_sales_employee_reaches_m2() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_sales", "sales_executive", march);
    service
        .record_sales_revenue(SalesRevenue {
            id: Uuid::new_v4(),
            employee_id: "emp_sales".to_string(),
            month: march,
            revenue: decimal("250000000"),
            transaction_count: 10,
            consumed_by: None,
        })
        .unwrap();
    let period = create_period(&service, march);
    let slip = service.generate_slips(period.id).unwrap().remove(0);

    let report = service.calculate(slip.id).unwrap();
    let figures = &report.slip.figures;

    assert!(figures.is_sale_employee);
    assert_eq!(figures.business_grade, "M2");
    // 35,000,000 - 20,000,000 - 5,000,000 - 730,000 - 0 - 0
    assert_eq!(figures.business_progressive_salary, decimal("9270000"));
}

/// INT-004: conversion on the 15th or later means no employee insurance
#[test]
fn test_late_conversion_skips_insurance() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_new", "accountant", march);
    let mut converted = employee("emp_new", "accountant");
    converted.official_conversion_date = NaiveDate::from_ymd_opt(2025, 3, 15);
    service.upsert_employee(converted).unwrap();
    let period = create_period(&service, march);
    let slip = service.generate_slips(period.id).unwrap().remove(0);

    let figures = service.calculate(slip.id).unwrap().slip.figures;

    assert!(!figures.is_insurance_eligible);
    assert_eq!(figures.employee_social_insurance, Decimal::ZERO);
    assert_eq!(figures.employee_health_insurance, Decimal::ZERO);
    assert_eq!(figures.employee_unemployment_insurance, Decimal::ZERO);
    assert_eq!(figures.employee_union_fee, Decimal::ZERO);
}

/// INT-005: an unpaid penalty blocks READY until the ticket is paid
#[test]
fn test_unpaid_penalty_blocks_until_paid() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_001", "accountant", march);
    let ticket = PenaltyTicket {
        id: Uuid::new_v4(),
        employee_id: "emp_001".to_string(),
        month: march,
        amount: decimal("200000"),
        reason: "Late arrival".to_string(),
        status: PenaltyStatus::Unpaid,
    };
    service.record_penalty_ticket(ticket.clone()).unwrap();
    let period = create_period(&service, march);
    let slip = service.generate_slips(period.id).unwrap().remove(0);

    let blocked = service.calculate(slip.id).unwrap();
    assert_eq!(blocked.slip.status, SlipStatus::Pending);
    assert!(blocked.slip.figures.has_unpaid_penalty);

    service.pay_penalty_ticket(ticket.id).unwrap();
    let released = service.calculate(slip.id).unwrap();
    assert_eq!(released.slip.status, SlipStatus::Ready);
    assert!(!released.slip.figures.has_unpaid_penalty);
}

/// INT-006: calculating twice on unchanged inputs changes nothing
#[test]
fn test_recalculation_is_idempotent() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_001", "accountant", march);
    let period = create_period(&service, march);
    let slip = service.generate_slips(period.id).unwrap().remove(0);

    let first = service.calculate(slip.id).unwrap().slip;
    let second = service.calculate(slip.id).unwrap().slip;

    assert_eq!(first.figures, second.figures);
    assert_eq!(first.status, second.status);
    assert_eq!(first.status_note, second.status_note);
}

// =============================================================================
// Period Lifecycle Scenarios
// =============================================================================

/// INT-007: complete delivers READY slips and leaves PENDING ones alone
#[test]
fn test_complete_delivers_ready_only() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_ready", "accountant", march);
    service
        .upsert_employee(employee("emp_pending", "accountant"))
        .unwrap();
    let period = create_period(&service, march);
    service.generate_slips(period.id).unwrap();
    let ready_id = slip_id_for(&service, period.id, "emp_ready");
    let pending_id = slip_id_for(&service, period.id, "emp_pending");
    service.calculate(ready_id).unwrap();
    service.calculate(pending_id).unwrap();

    let completed = service.complete(period.id, "payroll_admin").unwrap();

    assert_eq!(completed.status, PeriodStatus::Completed);
    let ready = service.slip(ready_id).unwrap();
    assert_eq!(ready.status, SlipStatus::Delivered);
    assert_eq!(ready.payment_period_id, Some(period.id));
    let pending = service.slip(pending_id).unwrap();
    assert_eq!(pending.status, SlipStatus::Pending);
    assert_eq!(pending.payment_period_id, Some(period.id));
    assert_eq!(completed.statistics.delivered_count, 1);
    assert_eq!(completed.statistics.deferred_count, 1);
}

/// INT-008: a slip that becomes READY later is delivered by the next period
#[test]
fn test_carry_over_delivered_by_next_period() {
    let service = create_test_service();
    let march = month(2025, 3);
    let april = month(2025, 4);
    service.upsert_employee(employee("emp_late", "accountant")).unwrap();
    let march_period = create_period(&service, march);
    let slip = service.generate_slips(march_period.id).unwrap().remove(0);
    service.calculate(slip.id).unwrap();
    service.complete(march_period.id, "payroll_admin").unwrap();

    // A PENDING slip under a completed period can still be calculated.
    service.upsert_contract(contract("emp_late")).unwrap();
    service.upsert_timesheet(timesheet("emp_late", march)).unwrap();
    let recalculated = service.calculate(slip.id).unwrap();
    assert_eq!(recalculated.slip.status, SlipStatus::Ready);

    let april_period = create_period(&service, april);
    service.complete(april_period.id, "payroll_admin").unwrap();

    let delivered = service.slip(slip.id).unwrap();
    assert_eq!(delivered.status, SlipStatus::Delivered);
    assert_eq!(delivered.payment_period_id, Some(april_period.id));
    assert!(delivered.is_carried_over());
}

/// INT-009: uncomplete is refused while a newer completed period exists
#[test]
fn test_uncomplete_refused_with_newer_completed_period() {
    let service = create_test_service();
    let march = create_period(&service, month(2025, 3));
    let april = create_period(&service, month(2025, 4));
    service.complete(march.id, "payroll_admin").unwrap();
    service.complete(april.id, "payroll_admin").unwrap();

    assert!(!service.can_uncomplete(march.id).unwrap());
    let err = service.uncomplete(march.id).unwrap_err();
    assert!(matches!(err, EngineError::NewerPeriodsExist { .. }));
    assert!(err.to_string().contains("newer salary periods exist"));

    // A reopened April still blocks March.
    let reopened = service.uncomplete(april.id).unwrap();
    assert_eq!(reopened.status, PeriodStatus::Ongoing);
    assert!(matches!(
        service.uncomplete(march.id),
        Err(EngineError::NewerPeriodsExist { .. })
    ));
}

/// INT-010: a delivered slip under a completed period is frozen
#[test]
fn test_frozen_slip_round_trip() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_001", "accountant", march);
    let period = create_period(&service, march);
    let slip = service.generate_slips(period.id).unwrap().remove(0);
    service.calculate(slip.id).unwrap();
    service.complete(period.id, "payroll_admin").unwrap();
    let before = service.slip(slip.id).unwrap();

    // Changing the source data must not leak into a frozen slip.
    let mut raised = contract("emp_001");
    raised.base_salary = decimal("30000000");
    raised.effective_date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    service.upsert_contract(raised).unwrap();
    let report = service.calculate(slip.id).unwrap();

    assert_eq!(report.outcome, CalculationOutcome::Frozen);
    assert_eq!(report.slip, before);
    assert!(matches!(
        service.hold(slip.id, "Audit", "hr_admin"),
        Err(EngineError::SlipFrozen { .. })
    ));
}

/// INT-011: reopening a period reverts a delivered slip on recalculation
#[test]
fn test_reopened_period_reverts_delivered_slip() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_001", "accountant", march);
    let period = create_period(&service, march);
    let slip = service.generate_slips(period.id).unwrap().remove(0);
    let original_net = service.calculate(slip.id).unwrap().slip.figures.net_salary;
    service.complete(period.id, "payroll_admin").unwrap();
    service.uncomplete(period.id).unwrap();

    let mut raised = contract("emp_001");
    raised.base_salary = decimal("30000000");
    raised.effective_date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    service.upsert_contract(raised).unwrap();
    let report = service.calculate(slip.id).unwrap();

    assert_eq!(report.slip.status, SlipStatus::Ready);
    assert_ne!(report.slip.figures.net_salary, original_net);
    assert!(report.slip.needs_resend_email);
}

/// INT-012: held slips stay held through recalculation
#[test]
fn test_hold_is_sticky() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_001", "accountant", march);
    let period = create_period(&service, march);
    let slip = service.generate_slips(period.id).unwrap().remove(0);

    let held = service.hold(slip.id, "Bank details missing", "hr_admin").unwrap();
    assert_eq!(held.status, SlipStatus::Hold);
    let recalculated = service.calculate(slip.id).unwrap().slip;
    assert_eq!(recalculated.status, SlipStatus::Hold);
    assert_eq!(recalculated.hold_reason.as_deref(), Some("Bank details missing"));

    let released = service.unhold(slip.id, "hr_admin").unwrap().slip;
    assert_eq!(released.status, SlipStatus::Ready);
    assert_eq!(released.hold_reason, None);
}

// =============================================================================
// HTTP Scenarios
// =============================================================================

/// INT-013: full slip workflow over HTTP
#[tokio::test]
async fn test_http_slip_workflow() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_001", "accountant", march);
    let period = create_period(&service, march);
    let slip = service.generate_slips(period.id).unwrap().remove(0);
    let router = create_router(AppState::new(service));

    let (status, body) = send(
        router.clone(),
        "POST",
        &format!("/slips/{}/calculate", slip.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slip"]["status"], "READY");
    assert_eq!(body["outcome"], "calculated");

    let (status, body) = send(
        router.clone(),
        "POST",
        &format!("/slips/{}/hold", slip.id),
        Some(json!({"reason": "Bank details missing", "held_by": "hr_admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "HOLD");

    let (status, body) = send(
        router.clone(),
        "POST",
        &format!("/periods/{}/complete", period.id),
        Some(json!({"completed_by": "payroll_admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["statistics"]["hold_count"], 1);

    let (status, body) = send(router, "GET", &format!("/slips/{}", slip.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "HOLD");
}

/// INT-014: uncompleting an older period over HTTP is a conflict
#[tokio::test]
async fn test_http_uncomplete_conflict() {
    let service = create_test_service();
    let march = create_period(&service, month(2025, 3));
    let april = create_period(&service, month(2025, 4));
    service.complete(march.id, "payroll_admin").unwrap();
    service.complete(april.id, "payroll_admin").unwrap();
    let router = create_router(AppState::new(service));

    let (status, body) = send(
        router,
        "POST",
        &format!("/periods/{}/uncomplete", march.id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NEWER_PERIODS_EXIST");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("newer salary periods exist")
    );
}

/// INT-015: recalculating a period over HTTP reports every slip
#[tokio::test]
async fn test_http_recalculate_period() {
    let service = create_test_service();
    let march = month(2025, 3);
    onboard(&service, "emp_001", "accountant", march);
    onboard(&service, "emp_002", "accountant", march);
    service.upsert_employee(employee("emp_003", "accountant")).unwrap();
    let period = create_period(&service, march);
    service.generate_slips(period.id).unwrap();
    let router = create_router(AppState::new(service));

    let (status, body) = send(
        router.clone(),
        "POST",
        &format!("/periods/{}/recalculate", period.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calculated"], 3);
    assert_eq!(body["failed"], 0);

    let (status, body) = send(router, "GET", &format!("/periods/{}", period.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statistics"]["ready_count"], 2);
    assert_eq!(body["statistics"]["pending_count"], 1);
}
