//! Predicted-value extraction
//!
//! The service under test does not keep one response contract across
//! scenarios. Loose extraction tolerates a bare integer body, a flat object or
//! a one-level envelope. Strict validation accepts only
//! `{"success": true, "data": {"service_id": .., "service_name": ..}}`.

use crate::loader::coerce_id;
use serde_json::Value;

const ID_KEYS: [&str; 2] = ["service_id", "id"];
const ENVELOPE_KEYS: [&str; 3] = ["result", "data", "output"];

/// Outcome of loose extraction. `NotFound` is kept apart from a real id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    Found(i64),
    NotFound,
}

impl Extraction {
    /// Numeral used in reports: the id, or 0 when nothing was found.
    pub fn as_reported(&self) -> i64 {
        match self {
            Extraction::Found(id) => *id,
            Extraction::NotFound => 0,
        }
    }
}

fn integer_field(object: &serde_json::Map<String, Value>) -> Option<i64> {
    ID_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_i64))
}

/// Tiered extraction, first match wins:
/// top-level id, id one envelope down, leading digits of the body.
pub fn extract_prediction(body: &str, json: Option<&Value>) -> Extraction {
    if let Some(Value::Object(top)) = json {
        if let Some(id) = integer_field(top) {
            return Extraction::Found(id);
        }
        for key in ENVELOPE_KEYS {
            if let Some(Value::Object(inner)) = top.get(key) {
                if let Some(id) = integer_field(inner) {
                    return Extraction::Found(id);
                }
            }
        }
    }

    let text = body.trim();
    let digits: &str = {
        let end = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        &text[..end]
    };
    if digits.is_empty() {
        return Extraction::NotFound;
    }
    // Digit runs too long for i64 count as nothing found.
    digits
        .parse::<i64>()
        .map(Extraction::Found)
        .unwrap_or(Extraction::NotFound)
}

/// Render a JSON scalar the way it would appear in a CSV cell.
fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Check the strict envelope against the expected id and name.
///
/// Ids are compared after [`coerce_id`]; names are trimmed and compared
/// case-insensitively. Id and name problems are reported together.
pub fn validate_envelope(
    payload: &Value,
    expected_id: &str,
    expected_name: &str,
) -> Result<(), String> {
    let Value::Object(top) = payload else {
        return Err("payload is not a JSON object".to_string());
    };

    if top.get("success") != Some(&Value::Bool(true)) {
        let seen = top
            .get("success")
            .map(Value::to_string)
            .unwrap_or_else(|| "missing".to_string());
        return Err(format!("'success' is not true (value: {})", seen));
    }

    let Some(Value::Object(data)) = top.get("data") else {
        return Err("'data' missing or not an object".to_string());
    };

    let got_id = coerce_id(&scalar_text(data.get("service_id")));
    let got_name = scalar_text(data.get("service_name")).trim().to_string();
    let want_id = coerce_id(expected_id);
    let want_name = expected_name.trim();

    let mut problems = Vec::new();
    if got_id != want_id {
        problems.push(format!(
            "service_id expected '{}', got '{}'",
            want_id, got_id
        ));
    }
    if got_name.to_lowercase() != want_name.to_lowercase() {
        problems.push(format!(
            "service_name expected '{}', got '{}'",
            want_name, got_name
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("; "))
    }
}

/// The `data.service_id` of a strict envelope, when it reads as an integer.
pub fn envelope_service_id(payload: &Value) -> Option<i64> {
    let data = payload.get("data")?;
    let raw = scalar_text(data.get("service_id"));
    coerce_id(&raw).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loose(body: &str) -> Extraction {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        extract_prediction(body, parsed.as_ref())
    }

    #[test]
    fn top_level_fields() {
        assert_eq!(loose(r#"{"id": 7}"#), Extraction::Found(7));
        assert_eq!(loose(r#"{"service_id": 3, "id": 9}"#), Extraction::Found(3));
    }

    #[test]
    fn one_level_envelope() {
        assert_eq!(loose(r#"{"result": {"service_id": 9}}"#), Extraction::Found(9));
        assert_eq!(loose(r#"{"output": {"id": 4}}"#), Extraction::Found(4));
        assert_eq!(
            loose(r#"{"data": {"service_id": "5"}, "output": {"id": 6}}"#),
            Extraction::Found(6)
        );
        assert_eq!(loose(r#"{"a": {"b": {"id": 1}}}"#), Extraction::NotFound);
    }

    #[test]
    fn non_integer_fields_are_ignored() {
        assert_eq!(loose(r#"{"id": "7"}"#), Extraction::NotFound);
        assert_eq!(loose(r#"{"id": 7.5}"#), Extraction::NotFound);
        assert_eq!(loose(r#"{"id": true}"#), Extraction::NotFound);
    }

    #[test]
    fn leading_digits_of_plain_body() {
        assert_eq!(loose("42 units"), Extraction::Found(42));
        assert_eq!(loose("  17\n"), Extraction::Found(17));
        assert_eq!(loose("7"), Extraction::Found(7));
        assert_eq!(loose("0"), Extraction::Found(0));
        assert_eq!(loose("99999999999999999999999"), Extraction::NotFound);
    }

    #[test]
    fn nothing_to_extract() {
        assert_eq!(loose("{}"), Extraction::NotFound);
        assert_eq!(loose("service 42"), Extraction::NotFound);
        assert_eq!(loose(""), Extraction::NotFound);
        assert_eq!(loose("-3"), Extraction::NotFound);
        assert_eq!(Extraction::NotFound.as_reported(), 0);
    }

    #[test]
    fn strict_envelope_accepts_case_insensitive_name() {
        let payload = json!({"success": true, "data": {"service_id": 5, "service_name": "Billing"}});
        assert_eq!(validate_envelope(&payload, "5", "billing"), Ok(()));
        assert_eq!(envelope_service_id(&payload), Some(5));
    }

    #[test]
    fn strict_envelope_coerces_ids() {
        let payload = json!({"success": true, "data": {"service_id": "101.0", "service_name": "X"}});
        assert_eq!(validate_envelope(&payload, "101", "x"), Ok(()));
    }

    #[test]
    fn strict_envelope_failures() {
        let err = validate_envelope(&json!({"success": false}), "5", "Billing").unwrap_err();
        assert!(err.contains("success"), "{}", err);

        let err = validate_envelope(&json!({"success": true}), "5", "Billing").unwrap_err();
        assert!(err.contains("'data'"), "{}", err);

        let err = validate_envelope(&json!([1, 2]), "5", "Billing").unwrap_err();
        assert!(err.contains("not a JSON object"), "{}", err);

        let payload = json!({"success": true, "data": {"service_id": 6, "service_name": "Other"}});
        let err = validate_envelope(&payload, "5", "Billing").unwrap_err();
        assert!(err.contains("service_id expected '5', got '6'"), "{}", err);
        assert!(err.contains("; service_name expected 'Billing', got 'Other'"), "{}", err);
    }
}
