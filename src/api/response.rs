//! Response types for the payroll API.
//!
//! This module defines the error body and maps engine errors onto HTTP
//! status codes: invariant violations are 409, lookups of missing records
//! are 404, invalid requests are 400 and configuration problems are 500.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates an error for a path id that is not a UUID.
    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::with_details(
            "INVALID_ID",
            message,
            "Slip and period ids are UUIDs",
        )
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response with the given body.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

/// The stable error code of an engine error.
fn error_code(error: &EngineError) -> &'static str {
    match error {
        EngineError::ConfigNotFound { .. }
        | EngineError::ConfigParseError { .. }
        | EngineError::PolicyVersionNotFound { .. }
        | EngineError::MissingSnapshot { .. }
        | EngineError::MissingPolicySection { .. } => "CONFIG_ERROR",
        EngineError::DuplicatePeriod { .. } => "DUPLICATE_PERIOD",
        EngineError::DuplicateSlip { .. } => "DUPLICATE_SLIP",
        EngineError::SlipAlreadyHeld { .. } => "SLIP_ALREADY_HELD",
        EngineError::SlipNotHeld { .. } => "SLIP_NOT_HELD",
        EngineError::HoldReasonRequired => "VALIDATION_ERROR",
        EngineError::SlipFrozen { .. } => "SLIP_FROZEN",
        EngineError::SlipAlreadyCalculated { .. } => "SLIP_ALREADY_CALCULATED",
        EngineError::NewerPeriodsExist { .. } => "NEWER_PERIODS_EXIST",
        EngineError::PeriodNotCompleted { .. } => "PERIOD_NOT_COMPLETED",
        EngineError::PeriodAlreadyCompleted { .. } => "PERIOD_ALREADY_COMPLETED",
        EngineError::PeriodLocked { .. } => "PERIOD_LOCKED",
        EngineError::PenaltyTicketLocked { .. } => "PENALTY_TICKET_LOCKED",
        EngineError::PeriodNotFound { .. } => "PERIOD_NOT_FOUND",
        EngineError::SlipNotFound { .. } => "SLIP_NOT_FOUND",
        EngineError::EmployeeNotFound { .. } => "EMPLOYEE_NOT_FOUND",
        EngineError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
        EngineError::BatchCancelled { .. } => "BATCH_CANCELLED",
        EngineError::CalculationError { .. } => "CALCULATION_ERROR",
    }
}

fn status_for(error: &EngineError) -> StatusCode {
    match error {
        EngineError::HoldReasonRequired => StatusCode::BAD_REQUEST,
        EngineError::PeriodNotFound { .. }
        | EngineError::SlipNotFound { .. }
        | EngineError::EmployeeNotFound { .. }
        | EngineError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
        e if e.is_invariant_violation() => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let status = status_for(&error);
        let code = error_code(&error);
        let error = if error.is_configuration_error() {
            ApiError::with_details(code, "Configuration error", error.to_string())
        } else {
            ApiError::new(code, error.to_string())
        };
        ApiErrorResponse { status, error }
    }
}
