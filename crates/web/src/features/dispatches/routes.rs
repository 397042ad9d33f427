use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::middleware::auth::require_api_key;
use crate::state::AppState;

use super::handlers::{create_task, list_logs, list_tasks};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_task)
                .layer(from_fn_with_state(state.clone(), require_api_key))
                .get(list_tasks),
        )
        .route("/:task_id/logs", get(list_logs))
}
