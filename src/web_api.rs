//! Web API Server
//!
//! HTTP surface for the model router.
//!
//! ## Endpoints
//!
//! - `POST /route` — Route a classified intent (JSON)
//! - `POST /api/v1/route` — Same as `/route`
//! - `POST /api/v1/route/text` — Classify raw command text, then route it
//! - `POST /api/v1/classify` — Keyword classification only
//! - `GET  /api/v1/models` — Catalog plus current performance samples
//! - `GET  /api/v1/schema` — OpenAPI 3.0 schema
//! - `GET  /health` — Health check
//! - `GET  /metrics` — Prometheus metrics
//!
//! Invalid constraints, invalid intents, and malformed JSON map to `400`.
//! An empty catalog maps to `503`.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::routing::{
    ClassificationBreakdown, Intent, IntentClassifier, ModelCandidate, ModelRouter,
    PerformanceSample, RoutingConstraints, RoutingDecision,
};
use crate::RouterError;

// ============================================================================
// Request / response bodies
// ============================================================================

/// JSON body for `POST /route` and `POST /api/v1/route`.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    /// The classified intent to route.
    pub intent: Intent,
    /// Optional caller limits.
    #[serde(default)]
    pub constraints: Option<RoutingConstraints>,
}

/// JSON body for `POST /api/v1/route/text`.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRouteRequest {
    /// Raw user command.
    pub text: String,
    /// Optional caller limits.
    #[serde(default)]
    pub constraints: Option<RoutingConstraints>,
}

/// Response for `POST /api/v1/route/text`: the derived intent and the decision.
#[derive(Debug, Clone, Serialize)]
pub struct TextRouteResponse {
    /// Intent produced by the keyword classifier.
    pub intent: Intent,
    /// Routing outcome for that intent.
    pub decision: RoutingDecision,
}

/// JSON body for `POST /api/v1/classify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    /// Raw user command.
    pub text: String,
}

/// Response for `POST /api/v1/classify`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyResponse {
    /// The classified intent, entities included.
    pub intent: Intent,
    /// Per-type keyword hits behind the classification.
    pub breakdown: ClassificationBreakdown,
}

/// One row of `GET /api/v1/models`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelEntry {
    /// Catalog entry.
    #[serde(flatten)]
    pub candidate: ModelCandidate,
    /// Current performance sample, if one has been reported.
    pub performance: Option<PerformanceSample>,
}

/// Shared application state available to all handlers.
struct AppState {
    router: Arc<ModelRouter>,
    classifier: Arc<IntentClassifier>,
}

// ============================================================================
// Server
// ============================================================================

/// Build the axum application without binding a socket.
///
/// # Panics
///
/// This function never panics.
pub fn app(
    router: Arc<ModelRouter>,
    classifier: Arc<IntentClassifier>,
    max_request_size: usize,
) -> Router {
    let state = Arc::new(AppState { router, classifier });

    Router::new()
        .route("/route", post(route_handler))
        .route("/api/v1/route", post(route_handler))
        .route("/api/v1/route/text", post(route_text_handler))
        .route("/api/v1/classify", post(classify_handler))
        .route("/api/v1/models", get(models_handler))
        .route("/api/v1/schema", get(schema_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn_with_state(
            max_request_size,
            body_size_middleware,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web API server.
///
/// Binds to `config.host:config.port` and serves until shutdown.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
///
/// # Panics
///
/// This function never panics.
pub async fn start_server(
    config: ServerConfig,
    router: Arc<ModelRouter>,
    classifier: Arc<IntentClassifier>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = format!("{}:{}", config.host, config.port);

    info!(
        models = router.catalog().len(),
        "Starting router API on http://{}", addr
    );

    let app = app(router, classifier, config.max_request_size);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Router API ready on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Middleware
// ============================================================================

/// Adds an `X-Request-ID` header to every response, preserving the client's
/// value when one is sent.
async fn request_id_middleware(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Rejects requests whose `Content-Length` exceeds `max_size` with 413.
async fn body_size_middleware(
    State(max_size): State<usize>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(content_length) = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
    {
        if content_length > max_size {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(serde_json::json!({"error": "Request body too large"})),
            )
                .into_response();
        }
    }

    next.run(req).await
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /route` — Route a classified intent.
async fn route_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<RoutingDecision>, AppError> {
    let Json(req) = payload?;
    let decision = state.router.route(&req.intent, req.constraints.as_ref())?;
    Ok(Json(decision))
}

/// `POST /api/v1/route/text` — Classify text, then route the result.
async fn route_text_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TextRouteRequest>, JsonRejection>,
) -> Result<Json<TextRouteResponse>, AppError> {
    let Json(req) = payload?;
    let intent = state.classifier.classify(&req.text);
    debug!(kind = %intent.kind, confidence = intent.confidence, "classified text");
    let decision = state.router.route(&intent, req.constraints.as_ref())?;
    Ok(Json(TextRouteResponse { intent, decision }))
}

/// `POST /api/v1/classify` — Keyword classification without routing.
async fn classify_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let Json(req) = payload?;
    Ok(Json(ClassifyResponse {
        intent: state.classifier.classify(&req.text),
        breakdown: state.classifier.breakdown(&req.text),
    }))
}

/// `GET /api/v1/models` — Catalog with the current performance sample per model.
async fn models_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ModelEntry>> {
    let snapshot = state.router.performance().snapshot();
    let entries = state
        .router
        .catalog()
        .candidates()
        .iter()
        .map(|c| ModelEntry {
            candidate: c.clone(),
            performance: snapshot.get(&c.id).cloned(),
        })
        .collect();
    Json(entries)
}

/// `GET /health` — Liveness, catalog and table sizes, and counter totals.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "models": state.router.catalog().len(),
        "performance_samples": state.router.performance().snapshot().len(),
        "metrics": crate::metrics::get_metrics_summary(),
    }))
}

/// `GET /metrics` — Prometheus text exposition.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// `GET /api/v1/schema` — OpenAPI 3.0 document.
async fn schema_handler() -> (
    StatusCode,
    [(header::HeaderName, &'static str); 1],
    &'static str,
) {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        OPENAPI_SCHEMA,
    )
}

/// Static OpenAPI 3.0 specification.
const OPENAPI_SCHEMA: &str = concat!(
    r##"{
  "openapi": "3.0.0",
  "info": {
    "title": "orchestra-router",
    "version": ""##,
    env!("CARGO_PKG_VERSION"),
    r##"",
    "description": "Scores every catalog model against a classified intent and picks the best one"
  },
  "paths": {
    "/route": {
      "post": {
        "summary": "Route a classified intent",
        "requestBody": {
          "required": true,
          "content": {
            "application/json": {
              "schema": { "$ref": "#/components/schemas/RouteRequest" }
            }
          }
        },
        "responses": {
          "200": { "description": "Routing decision" },
          "400": { "description": "Invalid intent, invalid constraint, or malformed JSON" },
          "503": { "description": "Model catalog is empty" }
        }
      }
    },
    "/api/v1/route": {
      "post": {
        "summary": "Route a classified intent (versioned alias of /route)",
        "requestBody": {
          "required": true,
          "content": {
            "application/json": {
              "schema": { "$ref": "#/components/schemas/RouteRequest" }
            }
          }
        },
        "responses": {
          "200": { "description": "Routing decision" },
          "400": { "description": "Invalid intent, invalid constraint, or malformed JSON" },
          "503": { "description": "Model catalog is empty" }
        }
      }
    },
    "/api/v1/route/text": {
      "post": {
        "summary": "Classify command text with keyword rules, then route it",
        "requestBody": {
          "required": true,
          "content": {
            "application/json": {
              "schema": {
                "type": "object",
                "required": ["text"],
                "properties": {
                  "text": { "type": "string" },
                  "constraints": { "$ref": "#/components/schemas/RoutingConstraints" }
                }
              }
            }
          }
        },
        "responses": {
          "200": { "description": "Derived intent and routing decision" },
          "400": { "description": "Invalid constraint or malformed JSON" },
          "503": { "description": "Model catalog is empty" }
        }
      }
    },
    "/api/v1/classify": {
      "post": {
        "summary": "Classify command text without routing",
        "requestBody": {
          "required": true,
          "content": {
            "application/json": {
              "schema": {
                "type": "object",
                "required": ["text"],
                "properties": { "text": { "type": "string" } }
              }
            }
          }
        },
        "responses": {
          "200": { "description": "Intent and per-type keyword hits" },
          "400": { "description": "Malformed JSON" }
        }
      }
    },
    "/api/v1/models": {
      "get": {
        "summary": "Model catalog with current performance samples",
        "responses": {
          "200": { "description": "Catalog entries" }
        }
      }
    },
    "/api/v1/schema": {
      "get": {
        "summary": "OpenAPI 3.0 schema",
        "responses": {
          "200": { "description": "This schema document" }
        }
      }
    },
    "/health": {
      "get": {
        "summary": "Health check",
        "responses": {
          "200": { "description": "Service healthy" }
        }
      }
    },
    "/metrics": {
      "get": {
        "summary": "Prometheus metrics",
        "responses": {
          "200": { "description": "Prometheus text format metrics" }
        }
      }
    }
  },
  "components": {
    "schemas": {
      "Intent": {
        "type": "object",
        "required": ["confidence"],
        "properties": {
          "type": {
            "type": "string",
            "enum": ["query", "navigation", "search", "creation", "analysis", "configuration", "action"],
            "default": "query"
          },
          "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
          "entities": { "type": "array", "items": { "type": "object" } }
        }
      },
      "RoutingConstraints": {
        "type": "object",
        "properties": {
          "max_cost": { "type": "number", "minimum": 0 },
          "max_latency": { "type": "number", "minimum": 0 },
          "required_capabilities": {
            "type": "array",
            "items": {
              "type": "string",
              "enum": ["reasoning", "coding", "creative", "fast", "long-context", "multimodal", "analysis"]
            }
          }
        }
      },
      "RouteRequest": {
        "type": "object",
        "required": ["intent"],
        "properties": {
          "intent": { "$ref": "#/components/schemas/Intent" },
          "constraints": { "$ref": "#/components/schemas/RoutingConstraints" }
        }
      }
    }
  }
}"##
);

// ============================================================================
// Error Type
// ============================================================================

/// Application-level errors returned by API handlers.
///
/// Each variant maps to an HTTP status code and a JSON error body.
#[derive(Debug)]
enum AppError {
    /// The request body was not valid JSON for the endpoint.
    BadRequest(String),
    /// The router refused the request.
    Routing(RouterError),
}

impl From<RouterError> for AppError {
    fn from(e: RouterError) -> Self {
        Self::Routing(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Routing(e) => {
                let status = match e {
                    RouterError::InvalidConstraint { .. } | RouterError::InvalidIntent { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    RouterError::EmptyCatalog => StatusCode::SERVICE_UNAVAILABLE,
                    RouterError::ConfigError(_) | RouterError::Other(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.kind(), e.to_string())
            }
        };

        (
            status,
            Json(serde_json::json!({"error": message, "kind": kind})),
        )
            .into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================
