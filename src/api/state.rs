//! Application state for the payroll API.

use crate::service::PayrollService;

/// Shared application state.
///
/// Handlers reach the store and the policy through the service.
#[derive(Clone)]
pub struct AppState {
    service: PayrollService,
}

impl AppState {
    /// Creates a new application state around a service.
    pub fn new(service: PayrollService) -> Self {
        Self { service }
    }

    /// Returns the payroll service.
    pub fn service(&self) -> &PayrollService {
        &self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }
}
