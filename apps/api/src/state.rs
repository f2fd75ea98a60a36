use std::sync::Arc;

use crate::generation::documents::DocumentWriter;
use crate::generation::orchestrator::InterviewPrepOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the four content generators and, through them, the shared gateway.
    pub orchestrator: Arc<InterviewPrepOrchestrator>,
    /// Cover letters and rejection analyses, sharing the same gateway.
    pub documents: Arc<DocumentWriter>,
}
