use axum::{Router, routing::post};

use crate::state::AppState;

use super::handlers::receive_channel_event;

pub fn routes() -> Router<AppState> {
    Router::new().route("/channel", post(receive_channel_event))
}
