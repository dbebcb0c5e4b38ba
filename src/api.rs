//! REST API for the van-loading service.
//!
//! Provides HTTP endpoints for communication with the frontend.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, PackerEnvConfig};
use crate::model::{CargoHold, CargoItem, Shape, ValidationError};
use crate::packer::{PackEvent, PackOutcome, pack_with_config, pack_with_progress};
use crate::types::EPSILON_GENERAL;

#[derive(Clone)]
struct ApiState {
    packer_config: PackerEnvConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>pack-my-van API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded Web Assets (HTML, CSS, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Van dimensions and payload limit in a pack request.
#[derive(Deserialize, Clone, Copy, ToSchema)]
pub struct VanRequest {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub max_weight: f64,
}

impl VanRequest {
    fn into_hold(self) -> Result<CargoHold, ValidationError> {
        CargoHold::new((self.width, self.height, self.depth), self.max_weight)
    }
}

/// Request structure for the packing endpoints.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "van": { "width": 180.0, "height": 180.0, "depth": 300.0, "max_weight": 1500.0 },
        "items": [
            {
                "id": 1,
                "label": "Umzugskarton",
                "length": 50.0,
                "width": 50.0,
                "height": 50.0,
                "weight": 10.0,
                "shape": "box"
            }
        ]
    })
)]
pub struct PackRequest {
    pub van: VanRequest,
    pub items: Vec<CargoItem>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    hold: CargoHold,
    items: Vec<CargoItem>,
}

impl ValidatedPackRequest {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn into_parts(self) -> (Vec<CargoItem>, CargoHold) {
        (self.items, self.hold)
    }
}

#[derive(Debug)]
enum PackRequestValidationError {
    InvalidVan(ValidationError),
    InvalidItem(ValidationError),
}

impl PackRequest {
    fn into_validated(self) -> Result<ValidatedPackRequest, PackRequestValidationError> {
        let hold = self
            .van
            .into_hold()
            .map_err(PackRequestValidationError::InvalidVan)?;

        // Re-validate deserialized items through the constructor so that
        // hand-written JSON cannot smuggle non-positive geometry past the
        // packer.
        let items = self
            .items
            .into_iter()
            .map(|item| {
                CargoItem::new(item.id, item.dims(), item.weight)
                    .map(|valid| valid.with_shape(item.shape).with_meta(item.label, item.color))
            })
            .collect::<Result<Vec<_>, ValidationError>>()
            .map_err(PackRequestValidationError::InvalidItem)?;

        Ok(ValidatedPackRequest { hold, items })
    }
}

/// Load summary computed by the API layer.
///
/// The packing computation itself never rejects items on weight grounds;
/// this summary is where every entry path gets its uniform weight-limit
/// messaging.
#[derive(Serialize, ToSchema)]
pub struct LoadSummary {
    pub total_weight: f64,
    pub max_weight: f64,
    pub exceeds_weight_limit: bool,
    pub placed_volume: f64,
    pub hold_volume: f64,
    pub volume_usage_percent: f64,
}

/// Response structure with the computed arrangement.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub placements: Vec<PlacementResponse>,
    pub unplaced: Vec<UnplacedResponse>,
    pub is_complete: bool,
    pub summary: LoadSummary,
}

/// Single placed item in the response.
///
/// # Fields
/// * `position` - Center of the oriented bounding box in the cargo frame
/// * `rotation` - Orientation index (0-5)
/// * `dims` - Oriented extents along (X, Y, Z), ready for rendering
#[derive(Serialize, ToSchema)]
pub struct PlacementResponse {
    pub id: usize,
    #[schema(nullable = true)]
    pub label: Option<String>,
    pub shape: Shape,
    #[schema(nullable = true)]
    pub color: Option<String>,
    #[schema(value_type = [f64; 3], example = json!([-125.0, -65.0, -65.0]))]
    pub position: (f64, f64, f64),
    pub rotation: usize,
    #[schema(value_type = [f64; 3], example = json!([50.0, 50.0, 50.0]))]
    pub dims: (f64, f64, f64),
    pub weight: f64,
}

/// Single item that could not be placed.
#[derive(Serialize, ToSchema)]
pub struct UnplacedResponse {
    pub id: usize,
    #[schema(nullable = true)]
    pub label: Option<String>,
    pub weight: f64,
    #[schema(value_type = [f64; 3], example = json!([35.0, 45.0, 25.0]))]
    pub dims: (f64, f64, f64),
    pub reason_code: String,
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn van_config_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid van configuration",
        details,
    )
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Result<ValidatedPackRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    match payload.into_validated() {
        Ok(validated) => Ok(validated),
        Err(PackRequestValidationError::InvalidVan(err)) => Err(van_config_error(err.to_string())),
        Err(PackRequestValidationError::InvalidItem(err)) => Err(validation_error(err.to_string())),
    }
}

impl PackResponse {
    /// Creates a PackResponse from a PackOutcome, adding the load summary.
    pub fn from_outcome(outcome: PackOutcome, hold: &CargoHold) -> Self {
        let total_weight = outcome.placed_weight();
        let placed_volume = outcome.placed_volume();
        let hold_volume = hold.volume();
        let summary = LoadSummary {
            total_weight,
            max_weight: hold.max_weight,
            exceeds_weight_limit: total_weight > hold.max_weight + EPSILON_GENERAL,
            placed_volume,
            hold_volume,
            volume_usage_percent: if hold_volume > 0.0 {
                (placed_volume / hold_volume) * 100.0
            } else {
                0.0
            },
        };

        let PackOutcome {
            placements,
            unplaced,
        } = outcome;
        let is_complete = unplaced.is_empty();

        Self {
            placements: placements
                .into_iter()
                .map(|p| {
                    let dims = p.dims().as_tuple();
                    PlacementResponse {
                        id: p.item.id,
                        label: p.item.label.clone(),
                        shape: p.item.shape,
                        color: p.item.color.clone(),
                        position: p.position.as_tuple(),
                        rotation: p.rotation,
                        dims,
                        weight: p.item.weight,
                    }
                })
                .collect(),
            unplaced: unplaced
                .into_iter()
                .map(|entry| UnplacedResponse {
                    id: entry.item.id,
                    label: entry.item.label.clone(),
                    weight: entry.item.weight,
                    dims: entry.item.dims(),
                    reason_code: entry.reason.code().to_string(),
                    reason: entry.reason.to_string(),
                })
                .collect(),
            is_complete,
            summary,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream),
    components(
        schemas(
            PackRequest,
            VanRequest,
            PackResponse,
            PlacementResponse,
            UnplacedResponse,
            LoadSummary,
            ErrorResponse,
            CargoItem,
            Shape,
            PackEvent
        )
    ),
    tags((name = "packing", description = "Endpoints for the loading computation"))
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from the frontend.
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, packer_config: PackerEnvConfig) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { packer_config };

    let app = Router::new()
        // API endpoints
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Web-UI (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    let display_host = config.display_host().to_string();
    println!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("🚐 API Endpoints:");
    println!("   - POST /pack");
    println!("   - POST /pack_stream");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");
    println!("🌐 Web-UI: http://{}:{}", display_host, config.port());

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /pack endpoint.
///
/// Takes the van dimensions and a list of items, computes the arrangement
/// and returns placements, leftovers and the load summary.
///
/// # Parameters
/// * `payload` - JSON payload with van configuration and items
///
/// # Returns
/// JSON response with the computed arrangement
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Successfully computed an arrangement", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or van configuration",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_pack_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let item_count = request.item_count();
    let (items, hold) = request.into_parts();

    println!("📥 New pack request: {} items", item_count);
    let config = state.packer_config.packer_config();
    let outcome = pack_with_config(items, &hold, config);
    println!(
        "🚐 Result: {} placed, {} left over",
        outcome.placed_count(),
        outcome.unplaced_count()
    );

    let response = PackResponse::from_outcome(outcome, &hold);
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /pack_stream endpoint (SSE).
///
/// Streams pack events in real-time as Server-Sent Events
/// (text/event-stream). The frontend can animate the loading step by step
/// without waiting for the complete result. Placement events carry
/// provisional positions; the settled arrangement follows from a regular
/// /pack call.
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams pack events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or van configuration",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_pack_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (items, hold) = request.into_parts();

    let (tx, rx) = mpsc::channel::<String>(32);

    let config = state.packer_config.packer_config();

    tokio::task::spawn_blocking(move || {
        let _ = pack_with_progress(items, &hold, config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // Receiver may have closed the stream; remaining events are
                // simply discarded.
                let _ = tx.blocking_send(json);
            }
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Serves the index.html main page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::PackerConfig;

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        assert!(
            paths.contains_key("/pack"),
            "OpenAPI documentation is missing the /pack path"
        );
        assert!(
            paths.contains_key("/pack_stream"),
            "OpenAPI documentation is missing the /pack_stream path"
        );
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        let schemas = &components.schemas;
        for name in ["PackRequest", "PackResponse", "ErrorResponse", "CargoItem"] {
            assert!(
                schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn pack_request_parses_with_default_shape() {
        let json = r#"{
            "van": { "width": 180.0, "height": 180.0, "depth": 300.0, "max_weight": 1500.0 },
            "items": [
                { "id": 1, "length": 50.0, "width": 50.0, "height": 50.0, "weight": 10.0 }
            ]
        }"#;
        let request: PackRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].shape, Shape::Box);

        let validated = request.into_validated().expect("Should validate");
        assert_eq!(validated.item_count(), 1);
    }

    #[test]
    fn pack_request_rejects_invalid_item() {
        let json = r#"{
            "van": { "width": 180.0, "height": 180.0, "depth": 300.0, "max_weight": 1500.0 },
            "items": [
                { "id": 1, "length": -50.0, "width": 50.0, "height": 50.0, "weight": 10.0 }
            ]
        }"#;
        let request: PackRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        assert!(matches!(
            request.into_validated(),
            Err(PackRequestValidationError::InvalidItem(_))
        ));
    }

    #[test]
    fn pack_request_rejects_invalid_van() {
        let json = r#"{
            "van": { "width": 0.0, "height": 180.0, "depth": 300.0, "max_weight": 1500.0 },
            "items": []
        }"#;
        let request: PackRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        assert!(matches!(
            request.into_validated(),
            Err(PackRequestValidationError::InvalidVan(_))
        ));
    }

    #[test]
    fn pack_request_preserves_item_metadata() {
        let json = r#"{
            "van": { "width": 180.0, "height": 180.0, "depth": 300.0, "max_weight": 1500.0 },
            "items": [
                {
                    "id": 7,
                    "label": "Regentonne",
                    "length": 60.0,
                    "width": 60.0,
                    "height": 90.0,
                    "weight": 12.0,
                    "shape": "cylinder",
                    "color": "hsl(120, 100%, 50%)"
                }
            ]
        }"#;
        let request: PackRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        let validated = request.into_validated().expect("Should validate");
        let item = &validated.items[0];
        assert_eq!(item.label.as_deref(), Some("Regentonne"));
        assert_eq!(item.shape, Shape::Cylinder);
        assert_eq!(item.color.as_deref(), Some("hsl(120, 100%, 50%)"));
    }

    #[test]
    fn response_summary_flags_overweight_load() {
        let hold = CargoHold::new((180.0, 180.0, 300.0), 100.0).unwrap();
        let items = vec![CargoItem::new(1, (50.0, 50.0, 50.0), 500.0).unwrap()];

        let outcome = pack_with_config(items, &hold, PackerConfig::default());
        let response = PackResponse::from_outcome(outcome, &hold);

        // The item is placed anyway; only the summary reports the violation.
        assert_eq!(response.placements.len(), 1);
        assert!(response.is_complete);
        assert!(response.summary.exceeds_weight_limit);
        assert!((response.summary.total_weight - 500.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn response_summary_reports_volume_usage() {
        let hold = CargoHold::new((100.0, 100.0, 100.0), 1000.0).unwrap();
        let items = vec![CargoItem::new(1, (50.0, 50.0, 50.0), 10.0).unwrap()];

        let outcome = pack_with_config(items, &hold, PackerConfig::default());
        let response = PackResponse::from_outcome(outcome, &hold);

        assert!(!response.summary.exceeds_weight_limit);
        assert!((response.summary.volume_usage_percent - 12.5).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn response_carries_unplaced_reasons() {
        let hold = CargoHold::new((100.0, 100.0, 100.0), 1000.0).unwrap();
        let items = vec![CargoItem::new(1, (150.0, 150.0, 150.0), 10.0).unwrap()];

        let outcome = pack_with_config(items, &hold, PackerConfig::default());
        let response = PackResponse::from_outcome(outcome, &hold);

        assert!(!response.is_complete);
        assert_eq!(response.unplaced.len(), 1);
        assert_eq!(response.unplaced[0].reason_code, "dimensions_exceed_hold");
    }
}
