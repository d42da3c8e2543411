//! HTTP request handlers for the payroll API.
//!
//! Each handler maps one service command onto a route. Handlers carry no
//! payroll logic of their own; they parse the path and body, call the
//! service and translate the outcome.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::service::BatchRecalculation;

use super::request::{CompleteRequest, HoldRequest, UnholdRequest};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/slips/:id", get(get_slip_handler))
        .route("/slips/:id/calculate", post(calculate_slip_handler))
        .route("/slips/:id/hold", post(hold_slip_handler))
        .route("/slips/:id/unhold", post(unhold_slip_handler))
        .route("/periods/:id", get(get_period_handler))
        .route("/periods/:id/complete", post(complete_period_handler))
        .route("/periods/:id/uncomplete", post(uncomplete_period_handler))
        .route("/periods/:id/recalculate", post(recalculate_period_handler))
        .with_state(state)
}

/// Turns a command result into a JSON response.
fn respond<T: Serialize>(
    correlation_id: Uuid,
    command: &str,
    result: EngineResult<T>,
) -> Response {
    match result {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            Json(body),
        )
            .into_response(),
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                command,
                error = %err,
                "Command failed"
            );
            ApiErrorResponse::from(err).into_response()
        }
    }
}

fn parse_id(
    correlation_id: Uuid,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Uuid, Response> {
    id.map(|Path(id)| id).map_err(|rejection| {
        let message = rejection.body_text();
        warn!(correlation_id = %correlation_id, error = %message, "Invalid path id");
        ApiErrorResponse::bad_request(ApiError::invalid_id(message)).into_response()
    })
}

fn parse_body<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error).into_response())
}

/// Handler for GET /slips/:id.
async fn get_slip_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let slip_id = match parse_id(correlation_id, id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, slip_id = %slip_id, "Fetching payroll slip");
    respond(correlation_id, "get_slip", state.service().slip(slip_id))
}

/// Handler for POST /slips/:id/calculate.
///
/// Returns the stored slip together with the audit trail of the run.
async fn calculate_slip_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let slip_id = match parse_id(correlation_id, id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, slip_id = %slip_id, "Processing calculation request");

    let start_time = Instant::now();
    let result = state.service().calculate(slip_id);
    if let Ok(report) = &result {
        info!(
            correlation_id = %correlation_id,
            slip_id = %slip_id,
            status = %report.slip.status,
            net_salary = %report.slip.figures.net_salary,
            duration_us = start_time.elapsed().as_micros(),
            "Calculation completed successfully"
        );
    }
    respond(correlation_id, "calculate", result)
}

/// Handler for POST /slips/:id/hold.
async fn hold_slip_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<HoldRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let slip_id = match parse_id(correlation_id, id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, slip_id = %slip_id, "Processing hold request");
    respond(
        correlation_id,
        "hold",
        state
            .service()
            .hold(slip_id, &request.reason, &request.held_by),
    )
}

/// Handler for POST /slips/:id/unhold.
async fn unhold_slip_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UnholdRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let slip_id = match parse_id(correlation_id, id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, slip_id = %slip_id, "Processing unhold request");
    respond(
        correlation_id,
        "unhold",
        state.service().unhold(slip_id, &request.released_by),
    )
}

/// Handler for GET /periods/:id.
async fn get_period_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let period_id = match parse_id(correlation_id, id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, period_id = %period_id, "Fetching salary period");
    respond(correlation_id, "get_period", state.service().period(period_id))
}

/// Handler for POST /periods/:id/complete.
async fn complete_period_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CompleteRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let period_id = match parse_id(correlation_id, id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, period_id = %period_id, "Processing complete request");
    respond(
        correlation_id,
        "complete",
        state.service().complete(period_id, &request.completed_by),
    )
}

/// Handler for POST /periods/:id/uncomplete.
async fn uncomplete_period_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let period_id = match parse_id(correlation_id, id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        period_id = %period_id,
        "Processing uncomplete request"
    );
    respond(
        correlation_id,
        "uncomplete",
        state.service().uncomplete(period_id),
    )
}

/// Handler for POST /periods/:id/recalculate.
///
/// Runs the period's batch recalculation and waits for its report.
async fn recalculate_period_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let period_id = match parse_id(correlation_id, id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        period_id = %period_id,
        "Processing recalculation request"
    );

    let start_time = Instant::now();
    let result = BatchRecalculation::spawn(state.service().clone(), period_id)
        .join()
        .await;
    if let Ok(report) = &result {
        info!(
            correlation_id = %correlation_id,
            period_id = %period_id,
            calculated = report.calculated,
            failed = report.failed,
            duration_us = start_time.elapsed().as_micros(),
            "Recalculation completed"
        );
    }
    respond(correlation_id, "recalculate", result)
}
