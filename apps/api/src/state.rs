use crate::runs::runner::RunContext;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Model, tools and result sink shared by every run.
    pub runs: RunContext,
}
