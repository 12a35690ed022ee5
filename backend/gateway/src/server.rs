//! Loopback HTTP listener.
//!
//! One route, `POST /`, one message per connection. Every request is answered
//! with a payload, whatever fails along the way.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use ocrgate_core::{RecognitionError, RecognitionResult};

use crate::decode::ImageDecoder;
use crate::dispatcher::InferenceDispatcher;
use crate::request::parse_request;
use crate::response::{format_outcome, Reply};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// State shared by every request handler.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: InferenceDispatcher,
    pub decoder: ImageDecoder,
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", post(recognize))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener, refusing anything but a loopback address.
pub async fn bind_loopback(addr: SocketAddr) -> Result<TcpListener> {
    if !addr.ip().is_loopback() {
        bail!("refusing to bind non-loopback address {addr}");
    }
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    Ok(listener)
}

/// Serve until `shutdown` resolves, then stop accepting and drain in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "Recognition listener accepting connections");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("listener failed")?;
    info!(%addr, "Recognition listener closed");
    Ok(())
}

async fn recognize(
    State(state): State<GatewayState>,
    body: Result<Bytes, BytesRejection>,
) -> Reply {
    let request_id = Uuid::new_v4();
    let span = info_span!("recognize", %request_id);
    let started = Instant::now();

    let outcome = match body {
        Ok(bytes) => handle(&state, &bytes).instrument(span.clone()).await,
        Err(rejection) => {
            warn!(parent: &span, error = %rejection, "Unreadable request body");
            Err(RecognitionError::MissingPath)
        }
    };

    if let Err(err) = &outcome {
        debug!(parent: &span, error = %err, "Request failed");
    }
    let payload = format_outcome(outcome);
    info!(
        parent: &span,
        status = payload.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request finished"
    );
    Reply(payload)
}

/// Validate, decode, and recognize one request body.
///
/// Readiness is checked before decoding so a cold engine costs no file I/O.
pub async fn handle(state: &GatewayState, body: &[u8]) -> Result<RecognitionResult, RecognitionError> {
    let request = parse_request(body)?;
    debug!(path = request.path(), mode = request.mode().code(), "Request accepted");

    if state.dispatcher.is_closing() || !state.dispatcher.is_ready() {
        return Err(RecognitionError::EngineNotReady);
    }

    let image = state.decoder.decode(request.path()).await?;
    state.dispatcher.submit(image, request.mode()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::tests::RecordingEngine;
    use crate::dispatcher::DispatchSettings;
    use image::{Rgb, RgbImage};
    use ocrgate_core::{AssetSource, BufferTracker};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    struct Fixture {
        state: GatewayState,
        tracker: BufferTracker,
        calls: Arc<std::sync::Mutex<Vec<(Instant, Instant)>>>,
        dir: TempDir,
    }

    impl Fixture {
        async fn new(initialize: bool) -> Self {
            let engine = RecordingEngine::new(Duration::ZERO);
            let calls = Arc::clone(&engine.calls);
            let dispatcher = InferenceDispatcher::new(Box::new(engine), DispatchSettings::default());
            if initialize {
                assert!(dispatcher.initialize(AssetSource::new("unused")).await);
            }
            let tracker = BufferTracker::new();
            let state = GatewayState {
                dispatcher,
                decoder: ImageDecoder::new(tracker.clone()),
            };
            Self {
                state,
                tracker,
                calls,
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn png(&self, name: &str, w: u32, h: u32) -> String {
            let path = self.dir.path().join(name);
            RgbImage::from_pixel(w, h, Rgb([0, 0, 0])).save(&path).unwrap();
            path.to_string_lossy().into_owned()
        }

        fn garbage(&self, name: &str) -> String {
            let path = self.dir.path().join(name);
            std::fs::write(&path, b"GIF89a-truncated").unwrap();
            path.to_string_lossy().into_owned()
        }

        async fn payload(&self, body: &str) -> Value {
            let outcome = handle(&self.state, body.as_bytes()).await;
            serde_json::to_value(format_outcome(outcome)).unwrap()
        }
    }

    fn form(path: &str, mode: &str) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("path", path)
            .append_pair("type", mode)
            .finish()
    }

    #[tokio::test]
    async fn missing_path_is_400_in_both_encodings() {
        let fx = Fixture::new(true).await;
        for body in ["type=2", r#"{"type": 2}"#, "", "{oops"] {
            assert_eq!(fx.payload(body).await["status"], 400, "body {body:?}");
        }
    }

    #[tokio::test]
    async fn nonexistent_file_is_404() {
        let fx = Fixture::new(true).await;
        let missing = fx.dir.path().join("nope.png");
        let body = form(missing.to_str().unwrap(), "1");
        assert_eq!(fx.payload(&body).await["status"], 404);
        let body = json!({ "path": missing }).to_string();
        assert_eq!(fx.payload(&body).await["status"], 404);
    }

    #[tokio::test]
    async fn undecodable_file_is_500_and_leaks_nothing() {
        let fx = Fixture::new(true).await;
        let path = fx.garbage("broken.gif");
        let payload = fx.payload(&form(&path, "1")).await;
        assert_eq!(payload["status"], 500);
        assert_eq!(fx.tracker.live(), 0);
        assert!(fx.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn result_shape_follows_type() {
        let fx = Fixture::new(true).await;
        let path = fx.png("shot.png", 20, 10);

        assert_eq!(
            fx.payload(&form(&path, "1")).await,
            json!({ "status": 200, "data": "20x10" })
        );
        assert_eq!(
            fx.payload(&form(&path, "2")).await,
            json!({ "status": 200, "data": [{ "text": "20x10", "x": 10, "y": 5 }] })
        );
        let detailed = fx.payload(&json!({ "path": path, "type": 3 }).to_string()).await;
        assert_eq!(detailed["status"], 200);
        assert_eq!(detailed["data"][0]["text"], "20x10");
        assert_eq!(detailed["data"][0]["box"], json!([0, 0, 20, 10]));
        let confidence = detailed["data"][0]["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));

        // Absent, non-numeric, and unknown types all behave as type 1.
        for body in [
            json!({ "path": path }).to_string(),
            form(&path, "x"),
            form(&path, "42"),
        ] {
            assert_eq!(fx.payload(&body).await["data"], "20x10");
        }
        assert_eq!(fx.tracker.live(), 0);
    }

    #[tokio::test]
    async fn cold_engine_is_503_without_engine_calls() {
        let fx = Fixture::new(false).await;
        let path = fx.png("shot.png", 4, 4);
        assert_eq!(fx.payload(&form(&path, "1")).await["status"], 503);
        assert!(fx.calls.lock().unwrap().is_empty());
        assert_eq!(fx.tracker.live(), 0);
    }

    #[test]
    fn non_loopback_bind_is_refused() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = rt
            .block_on(bind_loopback("0.0.0.0:0".parse().unwrap()))
            .unwrap_err();
        assert!(err.to_string().contains("non-loopback"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn serves_payloads_over_http() {
        let fx = Fixture::new(true).await;
        let path = fx.png("shot.png", 6, 6);
        let listener = bind_loopback("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, fx.state.clone(), async move {
            let _ = stop_rx.await;
        }));

        let client = reqwest::Client::new();
        let url = format!("http://{addr}/");

        let resp = client
            .post(&url)
            .form(&[("path", path.as_str()), ("type", "1")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.headers()["connection"], "close");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "status": 200, "data": "6x6" }));

        let body: Value = client
            .post(&url)
            .json(&json!({ "path": path, "type": 2 }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["data"][0]["x"], 3);

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
