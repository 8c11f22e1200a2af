/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! HTTP request gateway.
//!
//! Turns each `GET .../sleepApi/...` request into exactly one
//! [`ControlHandle::dispatch`] call and maps the reply to a status code:
//!
//! | Outcome | Status |
//! |---|---|
//! | `status` | `200 OK` |
//! | any command that changes state | `202 Accepted` |
//! | validation / policy error (`error` in body) | `400 Bad Request` |
//! | unknown path or keyword | `404 Not Found` |
//! | control loop gone | `503 Service Unavailable` |
//!
//! Every body is JSON.

pub mod parse;

use std::future::Future;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error};

use crate::command::{Command, CommandError, Reply};
use crate::control::{ControlError, ControlHandle};
use crate::state::StatusSnapshot;

use parse::parse_request;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Every way a request can fail, each with its own status code.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("wrong address, wrong parameters or no such resource")]
    UnknownResource,

    #[error(transparent)]
    Invalid(#[from] CommandError),

    #[error(transparent)]
    Unavailable(#[from] ControlError),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::UnknownResource => StatusCode::NOT_FOUND,
            GatewayError::Invalid(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::Unavailable(e) = &self {
            error!("request failed: {e}");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Every GET goes through `dispatch`; the API root may sit anywhere in
/// the path, so there is no fixed route prefix.
pub fn build_router(control: ControlHandle) -> Router {
    Router::new().fallback(get(dispatch)).with_state(control)
}

/// Serve the gateway on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, control: ControlHandle, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(control))
        .with_graceful_shutdown(shutdown)
        .await
}

fn success_status(command: &Command) -> StatusCode {
    if command.is_query() {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    }
}

async fn dispatch(
    State(control): State<ControlHandle>,
    uri: Uri,
) -> Result<(StatusCode, Json<StatusSnapshot>), GatewayError> {
    let command = parse_request(uri.path())
        .inspect_err(|e| debug!(path = uri.path(), "request not understood: {e}"))?;
    debug!(path = uri.path(), command = command.name(), "request");

    match control.dispatch(command).await? {
        Reply::Status(snapshot) => Ok((success_status(&command), Json(snapshot))),
        Reply::Rejected(e) => Err(e.into()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{body, body::Body, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::TimerConfig;
    use crate::control::ControlLoop;
    use crate::system::MockSystemControl;

    fn test_app(volume: f64) -> (Router, Arc<MockSystemControl>) {
        let system = Arc::new(MockSystemControl::new(volume));
        // Long tick so timers do not move during a test.
        let (handle, _task) = ControlLoop::new(&TimerConfig::default(), system.clone())
            .spawn(Duration::from_secs(3600));
        (build_router(handle), system)
    }

    async fn get_json(app: &Router, path: &str) -> (StatusCode, Value) {
        let request = Request::get(path).body(Body::empty()).expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        assert_eq!(
            response.headers()["content-type"],
            "application/json",
            "path {path}"
        );
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn status_is_ok() {
        let (app, _) = test_app(55.0);
        let (status, body) = get_json(&app, "/sleepApi/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "mode": "idle", "currentVolume": 55.0 }));
    }

    #[tokio::test]
    async fn set_sleep_time_is_accepted() {
        let (app, _) = test_app(55.0);
        let (status, body) = get_json(&app, "/sleepApi/setSleepTime/1800").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["mode"], "sleepTimer");
        assert_eq!(body["timeToSleep"], 1800);
    }

    #[tokio::test]
    async fn bad_sleep_time_is_bad_request() {
        let (app, _) = test_app(55.0);
        for path in ["/sleepApi/setSleepTime/-5", "/sleepApi/setSleepTime/abc"] {
            let (status, body) = get_json(&app, path).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "path {path}");
            assert_eq!(body, json!({ "error": "bad sleep time" }));
        }
        let (_, body) = get_json(&app, "/sleepApi/status").await;
        assert_eq!(body["mode"], "idle");
    }

    #[tokio::test]
    async fn bad_sleep_time_keeps_the_running_timer() {
        let (app, _) = test_app(80.0);
        get_json(&app, "/sleepApi/setSilenceTime/600").await;
        let (_, before) = get_json(&app, "/sleepApi/status").await;
        assert_eq!(before["mode"], "silenceTimer");

        for path in ["/sleepApi/setSleepTime/abc", "/sleepApi/setSleepTime/-5"] {
            let (status, body) = get_json(&app, path).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "path {path}");
            assert_eq!(body, json!({ "error": "bad sleep time" }));
        }

        let (_, after) = get_json(&app, "/sleepApi/status").await;
        assert_eq!(after, before);
        assert_eq!(after["timeToSilence"], 600);
        assert!(after.get("timeToSleep").is_none());
    }

    #[tokio::test]
    async fn bad_good_night_time_keeps_the_sleep_timer() {
        let (app, _) = test_app(80.0);
        get_json(&app, "/sleepApi/setSleepTime/1800").await;

        let (status, _) = get_json(&app, "/sleepApi/setGoodNightTime/0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = get_json(&app, "/sleepApi/status").await;
        assert_eq!(body["mode"], "sleepTimer");
        assert_eq!(body["timeToSleep"], 1800);
    }

    #[tokio::test]
    async fn negative_volume_is_bad_request() {
        let (app, system) = test_app(80.0);
        let (status, body) = get_json(&app, "/sleepApi/setVolume/-5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "bad volume percentage" }));
        assert!(system.volume_history().is_empty());

        let (_, body) = get_json(&app, "/sleepApi/status").await;
        assert_eq!(body["currentVolume"], 80.0);
    }

    #[tokio::test]
    async fn api_root_is_found_after_a_prefix() {
        let (app, _) = test_app(55.0);
        let (status, body) = get_json(&app, "/home/sleepApi/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "idle");

        let (status, body) = get_json(&app, "/proxy/sleepApi/setSleepTime/60").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["timeToSleep"], 60);
    }

    #[tokio::test]
    async fn volume_is_auto_controlled_during_silence() {
        let (app, system) = test_app(80.0);
        let (status, body) = get_json(&app, "/sleepApi/setSilenceTime/600").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["timeToSilence"], 600);

        let (status, body) = get_json(&app, "/sleepApi/setVolume/50").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "volume is auto-controlled" }));
        assert!(system.volume_history().is_empty());
    }

    #[tokio::test]
    async fn set_volume_is_accepted_when_idle() {
        let (app, system) = test_app(80.0);
        let (status, body) = get_json(&app, "/sleepApi/setVolume/35").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["currentVolume"], 35.0);
        assert_eq!(system.volume_history(), vec![35.0]);
    }

    #[tokio::test]
    async fn reset_acknowledges_only_a_running_timer() {
        let (app, _) = test_app(80.0);
        get_json(&app, "/sleepApi/setGoodNightTime/900").await;

        let (status, body) = get_json(&app, "/sleepApi/reset").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["acknowledge"], "unsettingTimer");

        let (_, body) = get_json(&app, "/sleepApi/reset").await;
        assert!(body.get("acknowledge").is_none());
    }

    #[tokio::test]
    async fn immediate_sleep_is_accepted() {
        let (app, system) = test_app(80.0);
        let (status, body) = get_json(&app, "/sleepApi/immediateSleep").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["mode"], "immediateSleep");

        let (_, body) = get_json(&app, "/sleepApi/status").await;
        assert_eq!(body["mode"], "idle");
        assert_eq!(system.sleep_count(), 1);
    }

    #[tokio::test]
    async fn unknown_resources_are_not_found() {
        let (app, _) = test_app(80.0);
        for path in ["/", "/favicon.ico", "/sleepApi/shutdown"] {
            let (status, body) = get_json(&app, path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "path {path}");
            assert_eq!(
                body,
                json!({ "error": "wrong address, wrong parameters or no such resource" })
            );
        }
    }

    #[test]
    fn error_status_codes() {
        assert_eq!(GatewayError::UnknownResource.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            GatewayError::from(CommandError::BadVolume).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::from(ControlError::LoopClosed).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
