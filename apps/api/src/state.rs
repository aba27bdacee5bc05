use tollgate_application::EntitlementService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub entitlement_service: EntitlementService,
}
