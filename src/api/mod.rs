//! HTTP API module for the payroll engine.
//!
//! A thin command surface over [`PayrollService`](crate::service::PayrollService):
//! slip lookup, calculation and hold/unhold, and the period lifecycle
//! commands. Creation and editing of records is not exposed here.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CompleteRequest, HoldRequest, UnholdRequest};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
