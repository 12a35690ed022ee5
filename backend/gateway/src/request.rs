//! Request body validation.
//!
//! Two encodings are accepted: form fields (`path=...&type=...`) and a JSON
//! document with the same keys. A body that parses as a JSON object is read
//! as a document only, so `&` or `=` inside its string values never leak into
//! form fields. Every other body is read as a form.

use serde_json::{Map, Value};

use ocrgate_core::{Mode, RecognitionError, RecognitionRequest};

/// Fields pulled out of a body before interpretation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct RawFields {
    path: Option<String>,
    mode: Option<String>,
}

/// Extract and validate a [`RecognitionRequest`] from a raw body.
///
/// Never panics on malformed input: anything unparseable counts as an absent
/// field, and an absent or empty `path` is [`RecognitionError::MissingPath`].
pub fn parse_request(body: &[u8]) -> Result<RecognitionRequest, RecognitionError> {
    let fields = match document_fields(body) {
        Some(document) => document,
        None => form_fields(body),
    };

    let path = fields.path.ok_or(RecognitionError::MissingPath)?;
    RecognitionRequest::new(path, parse_mode(fields.mode.as_deref()))
}

/// Absent or non-numeric values mean mode 1; unknown codes fall back to mode 1 too.
pub fn parse_mode(raw: Option<&str>) -> Mode {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map(Mode::from_code)
        .unwrap_or_default()
}

fn form_fields(body: &[u8]) -> RawFields {
    let mut fields = RawFields::default();
    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "path" if fields.path.is_none() => fields.path = Some(value.into_owned()),
            "type" if fields.mode.is_none() => fields.mode = Some(value.into_owned()),
            _ => {}
        }
    }
    fields
}

fn document_fields(body: &[u8]) -> Option<RawFields> {
    let document: Map<String, Value> = serde_json::from_slice(body).ok()?;
    Some(RawFields {
        path: document.get("path").and_then(scalar_text),
        mode: document.get("type").and_then(scalar_text),
    })
}

/// Render a JSON scalar as the text a form field would carry.
/// Integral floats (`2.0`) collapse to their integer form.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i.to_string()),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some((f as i64).to_string())
            }
            _ => Some(n.to_string()),
        },
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
