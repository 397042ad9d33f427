use serde_json::Value;
use sqlx::PgPool;

use crate::error::Result;

/// Fold a loosely-encoded media reference value into an ordered list.
///
/// The historical column held either a proper JSON array, a bare path
/// string, or a JSON array serialized into a string. Anything else is
/// treated as no media.
pub fn media_refs_from_value(value: &Value) -> Vec<String> {
    fn strings(items: &[Value]) -> Vec<String> {
        items
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    match value {
        Value::Array(items) => strings(items),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
                    return strings(&items);
                }
            }
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
        _ => Vec::new(),
    }
}

/// One-time migration pass rewriting legacy `media_refs` encodings into
/// proper JSON arrays. Returns the number of rows rewritten.
pub async fn normalize_legacy_media_refs(pool: &PgPool) -> Result<u64> {
    let mut tx = pool.begin().await?;

    // Strings that hold a serialized JSON array get unwrapped in place.
    let unwrapped = sqlx::query(
        r#"
        UPDATE completion_records
        SET media_refs = (media_refs #>> '{}')::jsonb
        WHERE jsonb_typeof(media_refs) = 'string'
          AND left(btrim(media_refs #>> '{}'), 1) = '['
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Bare path strings become single-element arrays.
    let wrapped = sqlx::query(
        r#"
        UPDATE completion_records
        SET media_refs = jsonb_build_array(media_refs #>> '{}')
        WHERE jsonb_typeof(media_refs) = 'string'
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Whatever is left and still not an array carries no usable reference.
    let cleared = sqlx::query(
        r#"
        UPDATE completion_records
        SET media_refs = '[]'::jsonb
        WHERE jsonb_typeof(media_refs) <> 'array'
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(unwrapped.rows_affected() + wrapped.rows_affected() + cleared.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn proper_array_passes_through() {
        let value = json!(["photos/day1.jpg", "photos/day1b.jpg"]);
        assert_eq!(
            media_refs_from_value(&value),
            vec!["photos/day1.jpg", "photos/day1b.jpg"]
        );
    }

    #[test]
    fn bare_string_becomes_single_element() {
        let value = json!("photos/day1.jpg");
        assert_eq!(media_refs_from_value(&value), vec!["photos/day1.jpg"]);
    }

    #[test]
    fn serialized_array_is_unwrapped() {
        let value = json!("[\"photos/a.jpg\", \"photos/b.jpg\"]");
        assert_eq!(
            media_refs_from_value(&value),
            vec!["photos/a.jpg", "photos/b.jpg"]
        );
    }

    #[test]
    fn empty_and_non_string_values_yield_nothing() {
        assert!(media_refs_from_value(&json!("")).is_empty());
        assert!(media_refs_from_value(&json!(null)).is_empty());
        assert!(media_refs_from_value(&json!(42)).is_empty());
        assert!(media_refs_from_value(&json!({"path": "x"})).is_empty());
    }

    #[test]
    fn non_string_array_entries_are_skipped() {
        let value = json!(["photos/a.jpg", 7, null]);
        assert_eq!(media_refs_from_value(&value), vec!["photos/a.jpg"]);
    }
}
