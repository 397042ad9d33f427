use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dispatcher::payload::{InboundEvent, normalize};
use serde_json::json;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/webhook/channel",
    responses(
        (status = 200, description = "Event processed"),
        (status = 201, description = "Completion submitted for review"),
        (status = 400, description = "Unrecognized payload"),
        (status = 404, description = "Channel identity is not subscribed")
    ),
    tag = "webhook"
)]
pub async fn receive_channel_event(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Response, WebError> {
    let event = normalize(&payload).map_err(|e| WebError::BadRequest(e.to_string()))?;

    match event {
        InboundEvent::Ping => Ok(Json(json!({"status": "ok"})).into_response()),

        InboundEvent::SubscriptionChange {
            channel_user_id,
            active,
        } => {
            let updated =
                services::apply_subscription_change(state.db.pool(), &channel_user_id, active)
                    .await?;

            Ok(Json(json!({"status": "ok", "updated": updated})).into_response())
        }

        InboundEvent::CompletionReport {
            channel_user_id,
            text,
            media_refs,
        } => {
            let record = services::submit_from_channel(
                state.db.pool(),
                state.policy,
                state.legacy_template_fallback,
                &channel_user_id,
                text,
                media_refs,
            )
            .await?;

            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "status": "accepted",
                    "record_id": record.record_id,
                    "day_number": record.day_number,
                })),
            )
                .into_response())
        }
    }
}
