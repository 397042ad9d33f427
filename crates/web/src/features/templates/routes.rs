use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::middleware::auth::require_api_key;
use crate::state::AppState;

use super::handlers::{import_templates, list_templates};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/:project_id/templates", get(list_templates))
        .route(
            "/:project_id/templates",
            post(import_templates).layer(from_fn_with_state(state.clone(), require_api_key)),
        )
}
