use axum::{Router, routing::get};

use crate::state::AppState;

use super::handlers::{get_organization_ranking, get_user_progress, get_user_ranking};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(get_user_ranking))
        .route("/users/:user_id/projects/:project_id", get(get_user_progress))
        .route("/organizations", get(get_organization_ranking))
}
