use axum::{routing::any, Router};

use crate::modules::chat::controller;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/functions/chat", any(controller::chat))
}
