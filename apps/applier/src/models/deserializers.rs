//! Forgiving deserializers for hand-edited profile documents.
//!
//! Profiles are edited by hand, so a ZIP code written as `30602` or a GPA
//! written as `"3.8"` must not make the whole document unreadable.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a string, number or bool and keeps its text. `null` becomes empty.
pub fn de_string_forgiving<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected text or a number, got {other}"
        ))),
    }
}

/// Accepts a number or a numeric string. Blank, `null` and unparseable text
/// are treated as absent.
pub fn de_option_f64_forgiving<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            match s.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Some(v)),
                _ => {
                    tracing::warn!("Ignoring non-numeric value {s:?}");
                    Ok(None)
                }
            }
        }
        other => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Leaf {
        #[serde(default, deserialize_with = "de_string_forgiving")]
        text: String,
        #[serde(default, deserialize_with = "de_option_f64_forgiving")]
        number: Option<f64>,
    }

    fn leaf(json: &str) -> Leaf {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_string_accepts_scalars() {
        assert_eq!(leaf(r#"{"text": "N1"}"#).text, "N1");
        assert_eq!(leaf(r#"{"text": 30602}"#).text, "30602");
        assert_eq!(leaf(r#"{"text": 3.5}"#).text, "3.5");
        assert_eq!(leaf(r#"{"text": true}"#).text, "true");
        assert_eq!(leaf(r#"{"text": null}"#).text, "");
        assert_eq!(leaf("{}").text, "");
    }

    #[test]
    fn test_string_rejects_containers() {
        assert!(serde_json::from_str::<Leaf>(r#"{"text": ["a"]}"#).is_err());
    }

    #[test]
    fn test_number_accepts_numeric_text() {
        assert_eq!(leaf(r#"{"number": 3.8}"#).number, Some(3.8));
        assert_eq!(leaf(r#"{"number": 4}"#).number, Some(4.0));
        assert_eq!(leaf(r#"{"number": " 3.8 "}"#).number, Some(3.8));
        assert_eq!(leaf(r#"{"number": ""}"#).number, None);
        assert_eq!(leaf(r#"{"number": "3.8/4.0"}"#).number, None);
        assert_eq!(leaf(r#"{"number": null}"#).number, None);
    }
}
