use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;

use crate::error::{GalleryError, Result};

/// Identifier that clients send either as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlexibleId {
    Number(i64),
    Text(String),
}

impl FlexibleId {
    fn positive(&self) -> Option<i64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        (value > 0).then_some(value)
    }
}

/// JSON extractor result; rejections become validation errors instead of axum's default 422.
pub type JsonPayload<T> = std::result::Result<Json<T>, JsonRejection>;

pub fn json_body<T>(payload: JsonPayload<T>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| GalleryError::validation(format!("invalid JSON body: {}", rejection.body_text())))
}

pub fn required_id(value: Option<&FlexibleId>, field: &str) -> Result<i64> {
    match value {
        None => Err(GalleryError::validation(format!("{field} is required"))),
        Some(id) => id
            .positive()
            .ok_or_else(|| GalleryError::validation(format!("{field} must be a positive integer"))),
    }
}

pub fn required_text(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GalleryError::validation(format!("{field} is required")))
}

/// Blank optional strings are stored as NULL.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn path_id(raw: &str, entity: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| GalleryError::validation(format!("invalid {entity} ID")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Body {
        artwork_id: Option<FlexibleId>,
    }

    fn id_of(v: serde_json::Value) -> Result<i64> {
        let body: Body = serde_json::from_value(v).expect("deserialize");
        required_id(body.artwork_id.as_ref(), "artworkId")
    }

    #[test]
    fn test_required_id_accepts_numbers_and_numeric_strings() {
        assert_eq!(id_of(json!({"artworkId": 7})).unwrap(), 7);
        assert_eq!(id_of(json!({"artworkId": "7"})).unwrap(), 7);
        assert!(id_of(json!({})).is_err());
        assert!(id_of(json!({"artworkId": null})).is_err());
        assert!(id_of(json!({"artworkId": 0})).is_err());
        assert!(id_of(json!({"artworkId": "seven"})).is_err());
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(required_text(Some("  Ani ".into()), "name").unwrap(), "Ani");
        assert!(required_text(Some("   ".into()), "name").is_err());
        assert!(required_text(None, "name").is_err());
        assert_eq!(optional_text(Some("".into())), None);
    }

    #[test]
    fn test_path_id() {
        assert_eq!(path_id("12", "student").unwrap(), 12);
        let err = path_id("abc", "student").unwrap_err();
        assert_eq!(err.to_string(), "invalid student ID");
    }
}
