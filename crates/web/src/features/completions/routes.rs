use axum::{Router, middleware::from_fn_with_state, routing::post};

use crate::middleware::auth::require_api_key;
use crate::state::AppState;

use super::handlers::{evaluate_completion, list_completions, submit_completion};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(submit_completion).get(list_completions))
        .route(
            "/:record_id/evaluation",
            post(evaluate_completion).layer(from_fn_with_state(state.clone(), require_api_key)),
        )
}
