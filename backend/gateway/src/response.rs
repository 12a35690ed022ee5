use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;

use ocrgate_core::{RecognitionError, RecognitionResult, ResponsePayload};

/// Map a request outcome to its payload. Every outcome has exactly one.
pub fn format_outcome(outcome: Result<RecognitionResult, RecognitionError>) -> ResponsePayload {
    match outcome {
        Ok(result) => ResponsePayload::success(result),
        Err(err) => ResponsePayload::failure(&err),
    }
}

/// HTTP wrapper for a payload.
///
/// The transport status is always 200; clients read the outcome from the
/// payload's `status`. The connection is closed after the reply.
#[derive(Debug)]
pub struct Reply(pub ResponsePayload);

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut response = Json(self.0).into_response();
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use ocrgate_core::PayloadData;

    #[test]
    fn errors_keep_their_status() {
        let payload = format_outcome(Err(RecognitionError::Busy));
        assert_eq!(payload.status, 503);
        assert!(matches!(payload.data, PayloadData::Text(ref msg) if msg.starts_with("Error:")));
    }

    #[test]
    fn reply_is_http_200_and_closes() {
        let response = Reply(format_outcome(Err(RecognitionError::MissingPath))).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONNECTION], "close");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }
}
