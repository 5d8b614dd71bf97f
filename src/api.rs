//! REST API for the cubage service.
//!
//! Provides HTTP endpoints for cubage aggregation and container placement.
//! Uses Axum as the web framework and supports CORS.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::catalog::{CatalogAccessor, InMemoryCatalog, ProductKind};
use crate::config::AppConfig;
use crate::cubage::{CubageManifest, RequestLine, aggregate};
use crate::model::{Container, PackableItem, ValidationError};
use crate::packaging::{PackagingConfig, PackagingPolicy, PackagingRequirement};
use crate::placement::{
    PlacementConfig, PlacementEvent, PlacementResult, place_items_with_config,
    place_items_with_progress,
};
use crate::types::Vec3;

/// Shared, read-only state of all handlers.
#[derive(Clone)]
pub struct ApiState {
    catalog: Arc<InMemoryCatalog>,
    packaging: PackagingConfig,
    placement: PlacementConfig,
    default_container: Container,
}

impl ApiState {
    pub fn new(
        catalog: InMemoryCatalog,
        packaging: PackagingConfig,
        placement: PlacementConfig,
        default_container: Container,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            packaging,
            placement,
            default_container,
        }
    }

    /// Builds the state from the application configuration.
    pub fn from_config(catalog: InMemoryCatalog, config: &AppConfig) -> Self {
        Self::new(
            catalog,
            config.packaging.packaging_config(),
            config.placement.placement_config(),
            config.placement.default_container(),
        )
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>cubage-service API Docs</title>
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

/// One requested line of the cubage endpoint.
///
/// `code` may be a string or a number; `quantity` is read leniently and
/// defaults to 1.
#[derive(Deserialize, Clone, ToSchema)]
pub struct CubageLineRequest {
    #[serde(alias = "codigo")]
    #[schema(value_type = String, example = json!("12345"))]
    pub code: Value,
    #[serde(default, alias = "quantidade")]
    #[schema(value_type = Option<u32>, example = json!(2))]
    pub quantity: Option<Value>,
}

impl CubageLineRequest {
    fn to_request_line(&self) -> RequestLine {
        RequestLine::from_values(&self.code, self.quantity.as_ref())
    }
}

#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "items": [
            { "code": "12345", "quantity": 2 },
            { "code": 20077.0, "quantity": "3" }
        ]
    })
)]
pub struct CubageRequest {
    #[serde(alias = "lines", alias = "itens")]
    pub items: Vec<CubageLineRequest>,
}

/// One resolved line. `volume` and `weight` cover the whole quantity.
#[derive(Serialize, ToSchema)]
pub struct CubageLineResponse {
    pub code: String,
    pub name: String,
    pub kind: ProductKind,
    pub dims: Vec3,
    pub effective_dims: Vec3,
    pub volume: f64,
    pub weight: f64,
    pub quantity: u32,
}

#[derive(Serialize, ToSchema)]
pub struct CubageResponse {
    pub total_volume: f64,
    pub total_weight: f64,
    pub boxable_volume: f64,
    pub found_lines: usize,
    pub packaging_requirement: PackagingRequirement,
    pub lines: Vec<CubageLineResponse>,
    /// Codes without a catalog entry, in request order.
    pub skipped: Vec<String>,
}

impl CubageResponse {
    pub fn from_manifest(manifest: CubageManifest) -> Self {
        let found_lines = manifest.found_lines();
        let CubageManifest {
            lines,
            total_volume,
            total_weight,
            boxable_volume,
            packaging,
            skipped,
        } = manifest;

        Self {
            total_volume,
            total_weight,
            boxable_volume,
            found_lines,
            packaging_requirement: packaging,
            lines: lines
                .into_iter()
                .map(|line| CubageLineResponse {
                    code: line.product.code,
                    name: line.product.name,
                    kind: line.product.kind,
                    dims: line.product.dims,
                    effective_dims: line.effective_dims,
                    volume: line.line_volume,
                    weight: line.line_weight,
                    quantity: line.quantity,
                })
                .collect(),
            skipped,
        }
    }
}

/// Container override of a placement request.
#[derive(Deserialize, Clone, ToSchema)]
pub struct ContainerRequest {
    #[schema(value_type = [f64; 3], example = json!([5.898, 2.352, 2.393]))]
    pub dims: (f64, f64, f64),
    pub max_weight: f64,
}

impl ContainerRequest {
    fn into_container(self) -> Result<Container, ValidationError> {
        Container::new(Vec3::from(self.dims), self.max_weight)
    }
}

#[derive(Deserialize, Clone, ToSchema)]
pub struct PlacementItemRequest {
    pub label: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub weight: f64,
}

impl PlacementItemRequest {
    fn into_item(self) -> Result<PackableItem, ValidationError> {
        PackableItem::new(
            self.label,
            Vec3::new(self.length, self.width, self.height),
            self.weight,
        )
    }
}

#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "container": { "dims": [5.898, 2.352, 2.393], "max_weight": 28200.0 },
        "items": [
            { "label": "cabinet", "length": 1.2, "width": 0.6, "height": 2.0, "weight": 80.0 },
            { "label": "hinges", "length": 0.36, "width": 0.36, "height": 0.64, "weight": 4.0 }
        ],
        "distribute": false
    })
)]
pub struct PlacementRequest {
    #[serde(default)]
    pub container: Option<ContainerRequest>,
    pub items: Vec<PlacementItemRequest>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub distribute: Option<bool>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_rotations: Option<bool>,
}

#[derive(Debug)]
struct ValidatedPlacementRequest {
    container: Container,
    items: Vec<PackableItem>,
    distribute: Option<bool>,
    allow_rotations: Option<bool>,
}

impl ValidatedPlacementRequest {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Applies the request-level overrides to the configured defaults.
    fn effective_config(&self, base: PlacementConfig) -> PlacementConfig {
        let mut config = base;
        if let Some(distribute) = self.distribute {
            config.distribute = distribute;
        }
        if let Some(allow_rotations) = self.allow_rotations {
            config.allow_item_rotation = allow_rotations;
        }
        config
    }
}

#[derive(Debug)]
enum PlacementRequestValidationError {
    InvalidContainer(ValidationError),
    InvalidItem(ValidationError),
}

impl PlacementRequest {
    fn into_validated(
        self,
        default_container: Container,
    ) -> Result<ValidatedPlacementRequest, PlacementRequestValidationError> {
        let container = match self.container {
            Some(spec) => spec
                .into_container()
                .map_err(PlacementRequestValidationError::InvalidContainer)?,
            None => default_container,
        };

        let items = self
            .items
            .into_iter()
            .map(PlacementItemRequest::into_item)
            .collect::<Result<Vec<_>, ValidationError>>()
            .map_err(PlacementRequestValidationError::InvalidItem)?;

        Ok(ValidatedPlacementRequest {
            container,
            items,
            distribute: self.distribute,
            allow_rotations: self.allow_rotations,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct ContainerResponse {
    #[schema(value_type = [f64; 3], example = json!([5.898, 2.352, 2.393]))]
    pub dims: (f64, f64, f64),
    pub max_weight: f64,
}

/// A placed item. Length, width and height are the extents of the chosen
/// orientation along x, y and z.
#[derive(Serialize, ToSchema)]
pub struct FittedItem {
    pub label: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub position: Vec3,
}

#[derive(Serialize, ToSchema)]
pub struct RejectedItem {
    pub label: String,
    pub reason_code: String,
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct PlacementResponse {
    pub container: ContainerResponse,
    pub fitted: Vec<FittedItem>,
    /// Labels of unplaced items, in request order.
    pub unfitted: Vec<String>,
    pub rejections: Vec<RejectedItem>,
    pub total_weight: f64,
    pub utilization_percent: f64,
    pub is_complete: bool,
}

impl PlacementResponse {
    pub fn from_placement_result(result: PlacementResult) -> Self {
        let total_weight = result.total_weight();
        let utilization_percent = result.utilization_percent();
        let is_complete = result.is_complete();
        let unfitted = result.unfitted_labels();
        let PlacementResult {
            container,
            placed,
            unplaced,
        } = result;

        Self {
            container: ContainerResponse {
                dims: container.dims.as_tuple(),
                max_weight: container.max_weight,
            },
            fitted: placed
                .into_iter()
                .map(|p| FittedItem {
                    label: p.item.label,
                    length: p.extents.x,
                    width: p.extents.y,
                    height: p.extents.z,
                    weight: p.item.weight,
                    position: p.position,
                })
                .collect(),
            unfitted,
            rejections: unplaced
                .into_iter()
                .map(|entry| RejectedItem {
                    label: entry.item.label,
                    reason_code: entry.reason.code().to_string(),
                    reason: entry.reason.to_string(),
                })
                .collect(),
            total_weight,
            utilization_percent,
            is_complete,
        }
    }
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

fn container_config_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid container configuration",
        details,
    )
}

fn parse_placement_request(
    payload: Result<Json<PlacementRequest>, JsonRejection>,
    default_container: Container,
) -> Result<ValidatedPlacementRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    match payload.into_validated(default_container) {
        Ok(validated) => Ok(validated),
        Err(PlacementRequestValidationError::InvalidContainer(err)) => {
            Err(container_config_error(err.to_string()))
        }
        Err(PlacementRequestValidationError::InvalidItem(err)) => {
            Err(validation_error(err.to_string()))
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_cubage, handle_placement, handle_placement_stream),
    components(
        schemas(
            CubageRequest,
            CubageLineRequest,
            CubageResponse,
            CubageLineResponse,
            PackagingRequirement,
            PackagingPolicy,
            ProductKind,
            PlacementRequest,
            PlacementItemRequest,
            ContainerRequest,
            PlacementResponse,
            ContainerResponse,
            FittedItem,
            RejectedItem,
            PlacementEvent,
            ErrorResponse,
            Vec3
        )
    ),
    tags(
        (name = "cubage", description = "Volume, weight and packaging of catalog orders"),
        (name = "placement", description = "Placement of boxes inside a container")
    )
)]
struct ApiDoc;

/// Builds the router with all endpoints and the CORS layer.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cubage", post(handle_cubage))
        .route("/placement", post(handle_placement))
        .route("/placement_stream", post(handle_placement_stream))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(config: &AppConfig, state: ApiState) -> std::io::Result<()> {
    let app = build_router(state);

    let addr = config.api.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let display_host = config.api.display_host();
    tracing::info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.api.port()
    );
    if config.api.binds_to_all_interfaces() {
        tracing::info!("💡 Local access: http://localhost:{}", config.api.port());
    }
    tracing::info!("📦 API endpoints: POST /cubage, POST /placement, POST /placement_stream");
    tracing::info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /cubage endpoint.
///
/// Resolves the requested codes against the catalog and returns totals,
/// boxable volume and the packaging requirement. Unknown codes are listed
/// in `skipped` and do not count toward any total.
#[utoipa::path(
    post,
    path = "/cubage",
    request_body = CubageRequest,
    responses(
        (status = 200, description = "Cubage of the requested lines", body = CubageResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Malformed request", body = ErrorResponse)
    ),
    tag = "cubage"
)]
async fn handle_cubage(
    State(state): State<ApiState>,
    payload: Result<Json<CubageRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let lines: Vec<RequestLine> = request
        .items
        .iter()
        .map(CubageLineRequest::to_request_line)
        .collect();

    tracing::info!(
        "📥 New cubage request: {} lines, catalog holds {} products",
        lines.len(),
        state.catalog.product_count()
    );
    let manifest = aggregate(&lines, state.catalog.as_ref(), &state.packaging);
    if !manifest.skipped.is_empty() {
        tracing::info!("🔎 Unknown codes skipped: {}", manifest.skipped.join(", "));
    }
    tracing::info!(
        "📦 Result: {:.4} m³, {} packaging units",
        manifest.total_volume,
        manifest.packaging.count
    );

    (StatusCode::OK, Json(CubageResponse::from_manifest(manifest))).into_response()
}

/// Handler for POST /placement endpoint.
///
/// Places the items into one container, the configured standard container
/// unless the request supplies one.
#[utoipa::path(
    post,
    path = "/placement",
    request_body = PlacementRequest,
    responses(
        (status = 200, description = "Placement of the items", body = PlacementResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "placement"
)]
async fn handle_placement(
    State(state): State<ApiState>,
    payload: Result<Json<PlacementRequest>, JsonRejection>,
) -> Response {
    let request = match parse_placement_request(payload, state.default_container) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let config = request.effective_config(state.placement);
    tracing::info!(
        "📥 New placement request: {} items, distribute = {}",
        request.item_count(),
        config.distribute
    );
    let result = place_items_with_config(request.items, request.container, config);
    tracing::info!(
        "📦 Result: {} placed, {} unplaced",
        result.placed_count(),
        result.unplaced_count()
    );

    let response = PlacementResponse::from_placement_result(result);
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /placement_stream endpoint (SSE).
///
/// Streams placement events as Server-Sent Events (text/event-stream) so a
/// client can visualize the steps without waiting for the full result.
#[utoipa::path(
    post,
    path = "/placement_stream",
    request_body = PlacementRequest,
    responses(
        (
            status = 200,
            description = "Streams placement events in real-time",
            content_type = "text/event-stream",
            body = PlacementEvent
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "placement"
)]
async fn handle_placement_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PlacementRequest>, JsonRejection>,
) -> Response {
    let request = match parse_placement_request(payload, state.default_container) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let config = request.effective_config(state.placement);
    tracing::info!(
        "📥 New placement stream: {} items, distribute = {}",
        request.item_count(),
        config.distribute
    );
    let ValidatedPlacementRequest {
        container, items, ..
    } = request;

    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        let result = place_items_with_progress(items, container, config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver means the client left; later events are dropped.
                let _ = tx.blocking_send(json);
            }
        });
        tracing::info!(
            "📦 Streamed result: {} placed, {} unplaced",
            result.placed_count(),
            result.unplaced_count()
        );
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

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use axum::http::header;
    use serde_json::json;

    fn test_state() -> ApiState {
        let catalog = InMemoryCatalog::from_products([
            Product::new(
                "12345",
                "Cabinet",
                Vec3::new(1.0, 0.5, 0.4),
                None,
                20.0,
                ProductKind::Standard,
            ),
            Product::new(
                "777",
                "Hinge set",
                Vec3::new(0.1, 0.1, 0.05),
                None,
                0.5,
                ProductKind::Accessory,
            ),
            Product::new(
                "900",
                "Boxed table",
                Vec3::new(1.6, 0.9, 0.2),
                None,
                35.0,
                ProductKind::IndividualBox,
            ),
        ]);
        ApiState::new(
            catalog,
            PackagingConfig::default(),
            PlacementConfig::default(),
            Container::new(Vec3::new(2.0, 2.0, 2.0), 100.0).unwrap(),
        )
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Body should be readable");
        serde_json::from_slice(&bytes).expect("Body should be JSON")
    }

    fn placement_request(raw: serde_json::Value) -> PlacementRequest {
        serde_json::from_value(raw).expect("Should parse placement request")
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in ["/cubage", "/placement", "/placement_stream"] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {} path",
                path
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        let schemas = &components.schemas;
        for name in [
            "CubageRequest",
            "CubageResponse",
            "PlacementRequest",
            "PlacementResponse",
            "PlacementEvent",
            "ErrorResponse",
        ] {
            assert!(
                schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn cubage_request_accepts_lines_alias_and_loose_quantities() {
        let json = r#"{
            "lines": [
                {"code": 12345.0, "quantity": "2"},
                {"code": "777"},
                {"code": "900", "quantity": null}
            ]
        }"#;
        let request: CubageRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        let lines: Vec<RequestLine> = request
            .items
            .iter()
            .map(CubageLineRequest::to_request_line)
            .collect();
        assert_eq!(
            lines,
            vec![
                RequestLine::new("12345", 2),
                RequestLine::new("777", 1),
                RequestLine::new("900", 1),
            ]
        );
    }

    #[test]
    fn placement_request_parses_overrides_when_absent() {
        let request = placement_request(json!({
            "items": [{"label": "a", "length": 1.0, "width": 1.0, "height": 1.0, "weight": 1.0}]
        }));
        assert!(request.container.is_none());
        assert_eq!(request.distribute, None);
        assert_eq!(request.allow_rotations, None);
    }

    #[test]
    fn validated_request_uses_default_container() {
        let default_container = Container::new(Vec3::new(3.0, 2.0, 1.0), 50.0).unwrap();
        let request = placement_request(json!({
            "items": [{"label": "a", "length": 1.0, "width": 1.0, "height": 1.0}],
            "distribute": true
        }));
        let validated = request
            .into_validated(default_container)
            .expect("Should validate successfully");
        assert_eq!(validated.container, default_container);
        assert_eq!(validated.items[0].weight, 0.0);

        let config = validated.effective_config(PlacementConfig::default());
        assert!(config.distribute);
        assert!(config.allow_item_rotation);
    }

    #[test]
    fn request_level_overrides_replace_configured_defaults() {
        let request = placement_request(json!({
            "items": [],
            "distribute": false,
            "allow_rotations": false
        }));
        let validated = request
            .into_validated(Container::new(Vec3::new(1.0, 1.0, 1.0), 1.0).unwrap())
            .unwrap();
        let base = PlacementConfig::builder()
            .distribute(true)
            .allow_item_rotation(true)
            .build();
        let config = validated.effective_config(base);
        assert!(!config.distribute);
        assert!(!config.allow_item_rotation);
    }

    #[test]
    fn invalid_container_and_items_are_rejected() {
        let default_container = Container::new(Vec3::new(1.0, 1.0, 1.0), 1.0).unwrap();
        let bad_container = placement_request(json!({
            "container": {"dims": [0.0, 1.0, 1.0], "max_weight": 10.0},
            "items": []
        }));
        assert!(matches!(
            bad_container.into_validated(default_container),
            Err(PlacementRequestValidationError::InvalidContainer(_))
        ));

        let bad_item = placement_request(json!({
            "items": [{"label": "a", "length": 1.0, "width": -1.0, "height": 1.0, "weight": 1.0}]
        }));
        assert!(matches!(
            bad_item.into_validated(default_container),
            Err(PlacementRequestValidationError::InvalidItem(_))
        ));

        let negative_weight = placement_request(json!({
            "items": [{"label": "a", "length": 1.0, "width": 1.0, "height": 1.0, "weight": -3.0}]
        }));
        assert!(negative_weight.into_validated(default_container).is_err());
    }

    #[tokio::test]
    async fn cubage_handler_reports_totals_and_skipped_codes() {
        let request: CubageRequest = serde_json::from_value(json!({
            "items": [
                {"code": "12345.0", "quantity": 2},
                {"code": "777", "quantity": 3},
                {"code": "900", "quantity": 1},
                {"code": "nope", "quantity": 4}
            ]
        }))
        .unwrap();

        let response = handle_cubage(State(test_state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["found_lines"], 3);
        assert_eq!(body["skipped"], json!(["nope"]));
        assert_eq!(body["lines"][1]["kind"], "accessory");
        assert_eq!(body["lines"][1]["effective_dims"]["z"], 0.64);

        let total_volume = body["total_volume"].as_f64().unwrap();
        let boxable = body["boxable_volume"].as_f64().unwrap();
        assert!((total_volume - (0.4 + 0.0015 + 0.288)).abs() < 1e-9);
        assert!((boxable - (0.4 + 0.0015)).abs() < 1e-9);
        assert_eq!(body["total_weight"].as_f64().unwrap(), 40.0 + 1.5 + 35.0);

        let packaging = &body["packaging_requirement"];
        assert_eq!(packaging["policy"], "unit_count");
        assert_eq!(packaging["count"], 5);
        assert!(packaging["box_name"].is_null());
    }

    #[tokio::test]
    async fn placement_handler_places_items_into_default_container() {
        let request = placement_request(json!({
            "items": [
                {"label": "small", "length": 1.0, "width": 1.0, "height": 1.0, "weight": 10.0},
                {"label": "big", "length": 2.0, "width": 2.0, "height": 1.0, "weight": 20.0},
                {"label": "huge", "length": 3.0, "width": 3.0, "height": 3.0, "weight": 1.0}
            ]
        }));

        let response = handle_placement(State(test_state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["is_complete"], false);
        assert_eq!(body["fitted"][0]["label"], "big");
        assert_eq!(body["fitted"][0]["position"], json!({"x": 0.0, "y": 0.0, "z": 0.0}));
        assert_eq!(body["fitted"][1]["label"], "small");
        assert_eq!(body["fitted"][1]["position"]["z"], 1.0);
        assert_eq!(body["unfitted"], json!(["huge"]));
        assert_eq!(
            body["rejections"][0]["reason_code"],
            "dimensions_exceed_container"
        );
        assert_eq!(body["total_weight"], 30.0);
        assert_eq!(body["container"]["dims"], json!([2.0, 2.0, 2.0]));
    }

    #[tokio::test]
    async fn placement_handler_rejects_invalid_items_with_422() {
        let request = placement_request(json!({
            "items": [{"label": "  ", "length": 1.0, "width": 1.0, "height": 1.0}]
        }));
        let response = handle_placement(State(test_state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid input data");
    }

    #[tokio::test]
    async fn placement_stream_emits_events_in_order() {
        let request = placement_request(json!({
            "items": [
                {"label": "a", "length": 1.0, "width": 1.0, "height": 1.0, "weight": 1.0}
            ]
        }));
        let response = handle_placement_stream(State(test_state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let opened = text.find("ContainerOpened").expect("opening event");
        let placed = text.find("ItemPlaced").expect("placement event");
        let finished = text.find("Finished").expect("final event");
        assert!(opened < placed && placed < finished);
    }
}
