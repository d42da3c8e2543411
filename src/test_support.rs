//! Shared fixtures for unit tests.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::{
    AccidentInsurance, ConfigLoader, ConfigSnapshot, InsuranceConfig, InsuranceScheme, KpiConfig,
    OvertimeMultipliers, PolicyConfig, PolicyMetadata, SalesConfig, SalesCriterion, SalesMetric,
    SalesTier, TaxBracket, TaxConfig,
};
use crate::models::{
    Contract, ContractStatus, DepartmentFunction, Employee, EmploymentStatus, EmploymentType,
    KpiAssessment, NetPercentage, PayMonth, PayrollSlip, PeriodDeadlines, SalaryPeriod,
    TaxCalculationMethod, Timesheet,
};
use crate::service::PayrollService;
use crate::store::PayrollStore;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn march_2025() -> PayMonth {
    PayMonth::new(2025, 3).unwrap()
}

fn scheme(employee: &str, employer: &str, ceiling: &str) -> InsuranceScheme {
    InsuranceScheme {
        employee_rate: dec(employee),
        employer_rate: dec(employer),
        ceiling: dec(ceiling),
    }
}

fn bracket(upper: Option<&str>, rate: &str) -> TaxBracket {
    TaxBracket {
        upper_bound: upper.map(dec),
        rate: dec(rate),
    }
}

fn tier(code: &str, amount: &str, revenue: &str, count: &str) -> SalesTier {
    SalesTier {
        code: code.to_string(),
        amount: dec(amount),
        criteria: vec![
            SalesCriterion {
                metric: SalesMetric::Revenue,
                min: dec(revenue),
            },
            SalesCriterion {
                metric: SalesMetric::TransactionCount,
                min: dec(count),
            },
        ],
    }
}

/// The policy in force from 2024-07-01, as in `config/policy/versions`.
pub fn sample_policy() -> PolicyConfig {
    PolicyConfig {
        effective_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        insurance: InsuranceConfig {
            social: scheme("0.08", "0.175", "46800000"),
            health: scheme("0.015", "0.03", "46800000"),
            unemployment: scheme("0.01", "0.01", "99200000"),
            union: scheme("0.01", "0.02", "46800000"),
            accident: AccidentInsurance {
                employer_rate: dec("0.005"),
                use_capped_base: true,
            },
        },
        tax: TaxConfig {
            personal_deduction: dec("11000000"),
            dependent_deduction: dec("4400000"),
            brackets: vec![
                bracket(Some("5000000"), "0.05"),
                bracket(Some("10000000"), "0.10"),
                bracket(Some("18000000"), "0.15"),
                bracket(Some("32000000"), "0.20"),
                bracket(Some("52000000"), "0.25"),
                bracket(Some("80000000"), "0.30"),
                bracket(None, "0.35"),
            ],
            flat_rate: dec("0.10"),
            flat_minimum: dec("2000000"),
        },
        kpi: KpiConfig {
            tiers: BTreeMap::from([
                ("A".to_string(), dec("0.10")),
                ("B".to_string(), dec("0.05")),
                ("C".to_string(), dec("0")),
                ("D".to_string(), dec("0")),
            ]),
            default_grade: "C".to_string(),
        },
        sales: SalesConfig {
            position_code: "sales_executive".to_string(),
            tiers: vec![
                tier("M1", "25000000", "100000000", "5"),
                tier("M2", "35000000", "200000000", "10"),
                tier("M3", "50000000", "350000000", "15"),
            ],
            default_grade: "M0".to_string(),
        },
        overtime: OvertimeMultipliers {
            weekday: dec("1.5"),
            weekend: dec("2.0"),
            holiday: dec("3.0"),
        },
    }
}

pub fn sample_snapshot() -> ConfigSnapshot {
    ConfigSnapshot::capture(&sample_policy())
}

/// An official support-department accountant.
pub fn sample_employee() -> Employee {
    Employee {
        id: "emp_001".to_string(),
        code: "E001".to_string(),
        full_name: "Test Employee".to_string(),
        department: "Finance".to_string(),
        department_function: DepartmentFunction::Support,
        position_code: "accountant".to_string(),
        position_name: "Accountant".to_string(),
        employment_type: EmploymentType::Official,
        status: EmploymentStatus::Active,
        start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        resignation_date: None,
        official_conversion_date: None,
        dependent_count: 0,
    }
}

/// An active contract for `emp_001` paying 20M base and 5M KPI salary.
pub fn sample_contract() -> Contract {
    Contract {
        id: Uuid::new_v4(),
        employee_id: "emp_001".to_string(),
        status: ContractStatus::Active,
        effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        sign_date: NaiveDate::from_ymd_opt(2023, 12, 20),
        created_at: Utc.with_ymd_and_hms(2023, 12, 20, 8, 0, 0).unwrap(),
        base_salary: dec("20000000"),
        kpi_salary: dec("5000000"),
        lunch_allowance: dec("730000"),
        phone_allowance: dec("500000"),
        other_allowance: dec("0"),
        tax_calculation_method: Some(TaxCalculationMethod::Progressive),
        net_percentage: NetPercentage::Full,
        has_social_insurance: true,
    }
}

/// A full March 2025 (21 working days) with no overtime.
pub fn sample_timesheet() -> Timesheet {
    Timesheet {
        employee_id: "emp_001".to_string(),
        month: march_2025(),
        official_working_days: dec("21"),
        probation_working_days: dec("0"),
        total_working_days: dec("21"),
        weekday_overtime_hours: dec("0"),
        weekend_overtime_hours: dec("0"),
        holiday_overtime_hours: dec("0"),
    }
}

/// Grade A from HR for `emp_001` in March 2025.
pub fn sample_kpi_assessment() -> KpiAssessment {
    KpiAssessment {
        employee_id: "emp_001".to_string(),
        month: march_2025(),
        manager_grade: Some("B".to_string()),
        hr_grade: Some("A".to_string()),
    }
}

/// A service over an empty store and the sample policy.
pub fn create_test_service() -> PayrollService {
    let metadata = PolicyMetadata {
        code: "TEST-POLICY".to_string(),
        name: "Test policy".to_string(),
        source: "unit tests".to_string(),
    };
    let loader = ConfigLoader::new(metadata, vec![sample_policy()]);
    PayrollService::new(Arc::new(PayrollStore::new()), Arc::new(loader))
}

/// A service with one ONGOING March 2025 period (21 standard days) and one
/// uncalculated slip for the sample employee, contract, timesheet and KPI
/// assessment. Calculated, the slip is READY with a net of 23,350,000.
pub fn service_with_slip() -> (PayrollService, SalaryPeriod, PayrollSlip) {
    let service = create_test_service();
    service.upsert_employee(sample_employee()).unwrap();
    service.upsert_contract(sample_contract()).unwrap();
    service.upsert_timesheet(sample_timesheet()).unwrap();
    service
        .upsert_kpi_assessment(sample_kpi_assessment())
        .unwrap();
    let period = service
        .create_period(march_2025(), Some(dec("21")), PeriodDeadlines::default())
        .unwrap();
    let slip = service.generate_slips(period.id).unwrap().remove(0);
    (service, period, slip)
}
