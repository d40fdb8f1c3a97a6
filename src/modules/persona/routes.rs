use axum::{routing::any, Router};

use crate::modules::persona::controller;
use crate::AppState;

/// Every route is registered for all methods so CORS preflight reaches the
/// handler pipeline; method enforcement happens inside the handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/functions/process-persona", any(controller::process))
        .route("/functions/save-persona", any(controller::save))
        .route("/functions/get-persona", any(controller::get))
        .route("/functions/list-personas", any(controller::list))
}
