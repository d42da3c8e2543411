//! Request bodies for the payroll API.

use serde::{Deserialize, Serialize};

/// Request body for `POST /slips/:id/hold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldRequest {
    /// Why the slip is held; must not be blank.
    pub reason: String,
    /// Who holds the slip.
    pub held_by: String,
}

/// Request body for `POST /slips/:id/unhold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnholdRequest {
    /// Who releases the slip.
    pub released_by: String,
}

/// Request body for `POST /periods/:id/complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteRequest {
    /// Who completes the period.
    pub completed_by: String,
}
