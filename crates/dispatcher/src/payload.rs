use serde::Deserialize;
use serde_json::Value;
use storage::services::media::media_refs_from_value;

use crate::error::DispatcherError;
use crate::Result;

/// Normalized inbound channel event.
///
/// The provider's webhook format is loosely specified and has shipped in two
/// message envelopes with different identity fields. Parsing is an explicit
/// sum over the known shapes; anything else is rejected rather than guessed
/// at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    CompletionReport {
        channel_user_id: String,
        text: Option<String>,
        media_refs: Vec<String>,
    },
    SubscriptionChange {
        channel_user_id: String,
        active: bool,
    },
    Ping,
}

#[derive(Debug, Deserialize)]
struct Identity {
    id: String,
}

/// Current envelope: `{event: "message", user: {id}, content: {...}}`.
#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    user: Identity,
    content: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    text: Option<String>,
    #[serde(default)]
    attachments: Value,
}

/// Legacy envelope: `{type: "message.created", subscriber: {id}, message: {...}}`.
#[derive(Debug, Deserialize)]
struct LegacyMessageEnvelope {
    subscriber: Identity,
    message: LegacyMessageBody,
}

#[derive(Debug, Deserialize)]
struct LegacyMessageBody {
    text: Option<String>,
    #[serde(default)]
    media: Value,
}

/// Subscription envelope; current payloads carry `user`, legacy ones
/// `subscriber`.
#[derive(Debug, Deserialize)]
struct SubscriptionEnvelope {
    user: Option<Identity>,
    subscriber: Option<Identity>,
}

fn event_kind(value: &Value) -> Option<&str> {
    value
        .get("event")
        .or_else(|| value.get("type"))
        .and_then(Value::as_str)
}

/// Map a raw webhook payload onto a normalized event.
pub fn normalize(value: &Value) -> Result<InboundEvent> {
    let kind = event_kind(value)
        .ok_or_else(|| DispatcherError::PayloadError("missing event discriminator".to_string()))?;

    match kind {
        "ping" => Ok(InboundEvent::Ping),

        "message" => {
            let envelope: MessageEnvelope = serde_json::from_value(value.clone())?;
            Ok(InboundEvent::CompletionReport {
                channel_user_id: envelope.user.id,
                text: envelope.content.text,
                media_refs: media_refs_from_value(&envelope.content.attachments),
            })
        }

        "message.created" => {
            let envelope: LegacyMessageEnvelope = serde_json::from_value(value.clone())?;
            Ok(InboundEvent::CompletionReport {
                channel_user_id: envelope.subscriber.id,
                text: envelope.message.text,
                media_refs: media_refs_from_value(&envelope.message.media),
            })
        }

        "subscribe" | "unsubscribe" => {
            let envelope: SubscriptionEnvelope = serde_json::from_value(value.clone())?;
            let identity = envelope.user.or(envelope.subscriber).ok_or_else(|| {
                DispatcherError::PayloadError(
                    "subscription event carries no identity".to_string(),
                )
            })?;
            Ok(InboundEvent::SubscriptionChange {
                channel_user_id: identity.id,
                active: kind == "subscribe",
            })
        }

        other => Err(DispatcherError::PayloadError(format!(
            "unrecognized event kind: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn current_message_shape_normalizes() {
        let payload = json!({
            "event": "message",
            "user": {"id": "ext-ana"},
            "content": {
                "text": "done with today's walk",
                "attachments": ["photos/walk.jpg"]
            }
        });

        assert_eq!(
            normalize(&payload).unwrap(),
            InboundEvent::CompletionReport {
                channel_user_id: "ext-ana".to_string(),
                text: Some("done with today's walk".to_string()),
                media_refs: vec!["photos/walk.jpg".to_string()],
            }
        );
    }

    #[test]
    fn legacy_message_shape_normalizes() {
        let payload = json!({
            "type": "message.created",
            "subscriber": {"id": "ext-ben"},
            "message": {
                "text": "day 3 complete",
                "media": "photos/day3.jpg"
            }
        });

        assert_eq!(
            normalize(&payload).unwrap(),
            InboundEvent::CompletionReport {
                channel_user_id: "ext-ben".to_string(),
                text: Some("day 3 complete".to_string()),
                media_refs: vec!["photos/day3.jpg".to_string()],
            }
        );
    }

    #[test]
    fn legacy_media_serialized_as_string_is_unwrapped() {
        let payload = json!({
            "type": "message.created",
            "subscriber": {"id": "ext-ben"},
            "message": {
                "text": null,
                "media": "[\"photos/a.jpg\", \"photos/b.jpg\"]"
            }
        });

        let InboundEvent::CompletionReport { media_refs, .. } = normalize(&payload).unwrap()
        else {
            panic!("expected a completion report");
        };
        assert_eq!(media_refs, vec!["photos/a.jpg", "photos/b.jpg"]);
    }

    #[test]
    fn subscription_events_accept_either_identity_field() {
        let current = json!({"event": "subscribe", "user": {"id": "ext-ana"}});
        assert_eq!(
            normalize(&current).unwrap(),
            InboundEvent::SubscriptionChange {
                channel_user_id: "ext-ana".to_string(),
                active: true,
            }
        );

        let legacy = json!({"type": "unsubscribe", "subscriber": {"id": "ext-ben"}});
        assert_eq!(
            normalize(&legacy).unwrap(),
            InboundEvent::SubscriptionChange {
                channel_user_id: "ext-ben".to_string(),
                active: false,
            }
        );
    }

    #[test]
    fn ping_normalizes() {
        assert_eq!(normalize(&json!({"type": "ping"})).unwrap(), InboundEvent::Ping);
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        assert!(normalize(&json!({"event": "reaction.added"})).is_err());
        assert!(normalize(&json!({"hello": "world"})).is_err());
        assert!(normalize(&json!({"event": "subscribe"})).is_err());
    }
}
