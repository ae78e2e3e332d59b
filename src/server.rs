//! HTTP surface of the gateway: status endpoints, the generation route, the
//! error envelope, and the CORS allow-list.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GatewayError;
use crate::credential::ApiCredential;
use crate::prompt;
use crate::providers::ImageProvider;

static REQUEST_ID_SEQ: AtomicU64 = AtomicU64::new(0);

const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn ImageProvider>,
    credential: Option<ApiCredential>,
    allowed_origins: Arc<Vec<String>>,
    debug_errors: bool,
    json_logs: bool,
}

impl AppState {
    pub fn new(provider: impl ImageProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
            credential: None,
            allowed_origins: Arc::new(vec![DEFAULT_ALLOWED_ORIGIN.to_string()]),
            debug_errors: false,
            json_logs: false,
        }
    }

    pub fn with_credential(mut self, credential: ApiCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = Arc::new(origins);
        self
    }

    /// Echo error detail in `server_error` context (non-production only).
    pub fn with_debug_errors(mut self) -> Self {
        self.debug_errors = true;
        self
    }

    pub fn with_json_logs(mut self) -> Self {
        self.json_logs = true;
        self
    }
}

#[derive(Debug, Deserialize)]
struct GenerateHttpRequest {
    #[serde(default)]
    style: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateHttpResponse {
    image_url: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    status: &'static str,
    api_key_status: &'static str,
    message: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/api/status", get(status))
        .route("/api/generate", post(handle_generate))
        .layer(middleware::from_fn_with_state(state.clone(), apply_cors))
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let api_key_status = match state.credential.as_ref() {
        Some(credential) => credential.format_status(),
        None => "invalid format",
    };
    Json(StatusResponse {
        status: "healthy",
        api_key_status,
        message: "atelier gateway is running",
    })
}

async fn handle_generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateHttpRequest>,
) -> Result<Json<GenerateHttpResponse>, (StatusCode, Json<ErrorResponse>)> {
    // The credential gate runs before input validation. No upstream call
    // is ever attempted without a well-formed credential.
    match state.credential.as_ref() {
        Some(credential) if credential.is_valid_format() => {}
        Some(_) => {
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "credential_error",
                "the configured upstream api key has an invalid format",
                None,
            ));
        }
        None => {
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "credential_error",
                "upstream api key is not configured",
                None,
            ));
        }
    }

    let style = payload
        .style
        .as_deref()
        .map(str::trim)
        .filter(|style| !style.is_empty())
        .ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                "missing_parameter",
                "style parameter is required and must be non-empty",
                None,
            )
        })?
        .to_string();

    let request_id = generate_request_id();
    emit_json_log(
        &state,
        "generate.request",
        serde_json::json!({
            "request_id": &request_id,
            "style": &style,
            "provider": state.provider.name(),
        }),
    );

    let upstream_prompt = prompt::style_prompt(&style);
    match state.provider.generate(&upstream_prompt).await {
        Ok(image) => {
            emit_json_log(
                &state,
                "generate.response",
                serde_json::json!({ "request_id": &request_id }),
            );
            Ok(Json(GenerateHttpResponse {
                image_url: image.image_url,
                prompt: prompt::echo_prompt(&style),
            }))
        }
        Err(err) => {
            emit_json_log(
                &state,
                "generate.error",
                serde_json::json!({
                    "request_id": &request_id,
                    "error": err.to_string(),
                }),
            );
            Err(map_generate_error(err, state.debug_errors))
        }
    }
}

fn map_generate_error(
    err: GatewayError,
    debug_errors: bool,
) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        GatewayError::Upstream {
            status,
            body,
            request_id,
        } => {
            // Upstream status is passed through to the caller unchanged.
            let status =
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            let message = upstream_message(&body, status);
            let mut context = serde_json::json!({
                "statusCode": status.as_u16(),
                "timestampMs": now_epoch_ms(),
            });
            if let (Some(request_id), Some(obj)) = (request_id, context.as_object_mut()) {
                obj.insert("requestId".to_string(), Value::String(request_id));
            }
            error_response(status, "upstream_error", message, Some(context))
        }
        GatewayError::InvalidUpstreamResponse { body } => {
            let response = serde_json::from_str::<Value>(&body)
                .unwrap_or_else(|_| Value::String(body.clone()));
            error_response(
                StatusCode::BAD_GATEWAY,
                "invalid_upstream_response",
                "upstream response did not contain image data",
                Some(serde_json::json!({ "response": response })),
            )
        }
        err @ GatewayError::Http(_) => {
            let context = debug_errors
                .then(|| serde_json::json!({ "detail": err.to_string() }));
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "request to the image provider failed",
                context,
            )
        }
    }
}

/// Message fallback chain: upstream `message`, then `error`, then the
/// canonical status reason.
fn upstream_message(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        if let Some(message) = parsed.get("message").and_then(Value::as_str) {
            if !message.trim().is_empty() {
                return message.to_string();
            }
        }
        match parsed.get("error") {
            Some(Value::String(message)) if !message.trim().is_empty() => {
                return message.clone();
            }
            Some(Value::Object(obj)) => {
                if let Some(message) = obj.get("message").and_then(Value::as_str) {
                    if !message.trim().is_empty() {
                        return message.to_string();
                    }
                }
            }
            _ => {}
        }
    }
    status
        .canonical_reason()
        .unwrap_or("upstream request failed")
        .to_string()
}

fn error_response(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    context: Option<Value>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: ErrorDetail {
                code,
                message: message.into(),
                context,
            },
        }),
    )
}

async fn apply_cors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());
    let allowed_origin = origin.filter(|origin| {
        state
            .allowed_origins
            .iter()
            .any(|allowed| allowed == origin)
    });

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        if let Some(origin) = allowed_origin {
            let headers = response.headers_mut();
            insert_cors_headers(headers, &origin);
            headers.insert(
                "access-control-allow-methods",
                HeaderValue::from_static("GET, POST, OPTIONS"),
            );
            headers.insert(
                "access-control-allow-headers",
                HeaderValue::from_static("content-type, authorization"),
            );
        }
        return response;
    }

    let mut response = next.run(request).await;
    if let Some(origin) = allowed_origin {
        insert_cors_headers(response.headers_mut(), &origin);
    }
    response
}

fn insert_cors_headers(headers: &mut axum::http::HeaderMap, origin: &str) {
    let Ok(origin) = HeaderValue::from_str(origin) else {
        return;
    };
    headers.insert("access-control-allow-origin", origin);
    headers.insert(
        "access-control-allow-credentials",
        HeaderValue::from_static("true"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}

fn generate_request_id() -> String {
    let seq = REQUEST_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    let ts_ms = now_epoch_ms();
    format!("atelier-{ts_ms}-{seq}")
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

fn emit_json_log(state: &AppState, event: &str, payload: Value) {
    if !state.json_logs {
        return;
    }

    let record = serde_json::json!({
        "ts_ms": now_epoch_ms(),
        "event": event,
        "payload": payload,
    });
    eprintln!("{record}");
}
