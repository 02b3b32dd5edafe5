//! Shared handler state.

use metrics_exporter_prometheus::PrometheusHandle;
use switchboard_cache::StateService;

/// State shared by the operator endpoints.
#[derive(Clone)]
pub struct AppState {
    pub state: StateService,
    /// Renders `/metrics`; `None` when metrics are disabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn new(state: StateService, metrics: Option<PrometheusHandle>) -> Self {
        Self { state, metrics }
    }
}
