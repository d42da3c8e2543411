//! Employee model and related types.
//!
//! This module defines the [`Employee`] record as supplied by the
//! organisational directory, together with the enums the payroll pipeline
//! branches on (employment type, employment status, department function).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PayMonth;

/// Represents the type of employment arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    /// Official (post-probation) employee.
    Official,
    /// Employee still in the probation period.
    Probation,
    /// Intern.
    Intern,
    /// Collaborator on a service contract.
    Collaborator,
}

/// Whether the employee is still working for the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    /// Currently employed.
    Active,
    /// Has resigned.
    Resigned,
}

/// The function of the employee's department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentFunction {
    /// Revenue-generating business department.
    Business,
    /// Back-office support department.
    Support,
    /// Production or delivery department.
    Production,
}

/// Represents an employee subject to payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Human-facing employee code.
    pub code: String,
    /// Full name.
    pub full_name: String,
    /// Department name.
    pub department: String,
    /// Function of the department the employee belongs to.
    pub department_function: DepartmentFunction,
    /// Position code (e.g. "sales_executive").
    pub position_code: String,
    /// Position name.
    pub position_name: String,
    /// The type of employment arrangement.
    pub employment_type: EmploymentType,
    /// Employment status.
    pub status: EmploymentStatus,
    /// First working day.
    pub start_date: NaiveDate,
    /// Last working day for resigned employees.
    #[serde(default)]
    pub resignation_date: Option<NaiveDate>,
    /// Date the employee was converted from probation to official.
    #[serde(default)]
    pub official_conversion_date: Option<NaiveDate>,
    /// Number of registered tax dependents.
    #[serde(default)]
    pub dependent_count: u32,
}

impl Employee {
    /// Returns true if the employee works in a business (sales) department.
    pub fn is_sale_employee(&self) -> bool {
        self.department_function == DepartmentFunction::Business
    }

    /// Returns true if the employee has resigned.
    pub fn is_resigned(&self) -> bool {
        self.status == EmploymentStatus::Resigned
    }

    /// Returns true if the employee is official (post-probation).
    pub fn is_official(&self) -> bool {
        self.employment_type == EmploymentType::Official
    }

    /// Returns true if the employee is still on probation.
    pub fn is_probationary(&self) -> bool {
        self.employment_type == EmploymentType::Probation
    }

    /// Returns true if the employee worked for at least part of the month.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{
    ///     DepartmentFunction, Employee, EmploymentStatus, EmploymentType, PayMonth,
    /// };
    /// use chrono::NaiveDate;
    ///
    /// let employee = Employee {
    ///     id: "emp_001".to_string(),
    ///     code: "E001".to_string(),
    ///     full_name: "Test Employee".to_string(),
    ///     department: "Finance".to_string(),
    ///     department_function: DepartmentFunction::Support,
    ///     position_code: "accountant".to_string(),
    ///     position_name: "Accountant".to_string(),
    ///     employment_type: EmploymentType::Official,
    ///     status: EmploymentStatus::Active,
    ///     start_date: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
    ///     resignation_date: None,
    ///     official_conversion_date: None,
    ///     dependent_count: 0,
    /// };
    /// assert!(employee.is_active_in(PayMonth::new(2025, 3).unwrap()));
    /// assert!(!employee.is_active_in(PayMonth::new(2025, 2).unwrap()));
    /// ```
    pub fn is_active_in(&self, month: PayMonth) -> bool {
        if self.start_date > month.last_day() {
            return false;
        }
        match self.resignation_date {
            Some(last_day) => last_day >= month.first_day(),
            None => !self.is_resigned(),
        }
    }
}
