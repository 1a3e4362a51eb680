//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod analysis;
mod export;
mod session;
mod table;

use crate::config::Settings;
use crate::diagram::DiagramRenderer;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router<R>(state: SharedState<R>, settings: &Settings) -> Router
where
    R: DiagramRenderer + Send + Sync + 'static,
{
    let cors = build_cors_layer(settings);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        .route("/health", get(health_check))

        // Session
        .route("/api/session/connect", post(session::connect::<R>))
        .route("/api/session/disconnect", post(session::disconnect::<R>))
        .route("/api/session/reconnect", post(session::reconnect::<R>))
        .route("/api/session/status", get(session::status::<R>))

        // Tables
        .route("/api/tables", get(table::list_tables::<R>))

        // Analysis
        .route(
            "/api/analysis",
            post(analysis::analyze_table::<R>).get(analysis::last_analysis::<R>),
        )

        // Downloads
        .route("/api/export/diagram.mmd", get(export::diagram_source::<R>))
        .route("/api/export/diagram.png", get(export::diagram_png::<R>))
        .route("/api/export/report.xlsx", get(export::report::<R>))

        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };

    cors.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(3600))
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Analysis, DependencySet};
    use crate::config::{CorsConfig, DiagramConfig, ServerConfig};
    use crate::diagram::{KrokiRenderer, RenderError};
    use crate::session::ExplorerSession;
    use crate::state::AppState;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const SALES_DIAGRAM: &str = "erDiagram\n    PRODUCT_ ||--o{ SALES_ : \"PRODUCT_ID\"";

    /// Renderer answering every request with a fixed outcome
    struct FixedRenderer {
        outcome: Result<Vec<u8>, (u16, &'static str)>,
    }

    impl DiagramRenderer for FixedRenderer {
        async fn render(&self, _source: &str) -> Result<Vec<u8>, RenderError> {
            match &self.outcome {
                Ok(png) => Ok(png.clone()),
                Err((status, body)) => Err(RenderError::Rejected {
                    status: *status,
                    body: body.to_string(),
                }),
            }
        }
    }

    fn test_settings() -> Settings {
        Settings {
            server: ServerConfig::default(),
            cors: CorsConfig::default(),
            diagram: DiagramConfig::default(),
            startup_connection: None,
        }
    }

    fn test_router() -> Router {
        let settings = test_settings();
        let renderer = KrokiRenderer::new(&settings.diagram).unwrap();
        create_router(Arc::new(AppState::new(renderer)), &settings)
    }

    fn analyzed_router(renderer: FixedRenderer) -> Router {
        let analysis = Analysis {
            table: "SALES_".to_string(),
            dependencies: DependencySet {
                tables: vec!["PRODUCT_".to_string()],
                ..Default::default()
            },
            similar_tables: vec![],
            relationships: vec![],
            diagram: Some(SALES_DIAGRAM.to_string()),
            analyzed_at: chrono::Utc::now(),
        };
        let state = AppState {
            session: Mutex::new(ExplorerSession::with_analysis(analysis)),
            renderer,
        };
        create_router(Arc::new(state), &test_settings())
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);
    }

    #[tokio::test]
    async fn test_tables_without_connection() {
        let response = test_router()
            .oneshot(Request::get("/api/tables?search=sales").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_CONNECTED");
    }

    #[tokio::test]
    async fn test_status_without_connection() {
        let response = test_router()
            .oneshot(Request::get("/api/session/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["session"]["connected"], false);
        assert_eq!(body["session"]["tableCount"], 0);
    }

    #[tokio::test]
    async fn test_connect_validates_payload() {
        let request = Request::post("/api/session/connect")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"server":"","database":"sales"}"#))
            .unwrap();

        let response = test_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_exports_without_analysis() {
        for path in ["/api/export/diagram.mmd", "/api/export/diagram.png", "/api/export/report.xlsx"] {
            let response = test_router()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let response = test_router()
            .oneshot(Request::post("/api/session/disconnect").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "No active connection");
    }

    #[tokio::test]
    async fn test_diagram_png_download() {
        let router = analyzed_router(FixedRenderer {
            outcome: Ok(vec![0x89, b'P', b'N', b'G']),
        });

        let response = router
            .oneshot(Request::get("/api/export/diagram.png").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"er_diagram.png\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_diagram_png_rejected_by_service() {
        let router = analyzed_router(FixedRenderer {
            outcome: Err((400, "Syntax error in graph")),
        });

        let response = router
            .oneshot(Request::get("/api/export/diagram.png").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["code"], "DIAGRAM_RENDER_FAILED");
        assert_eq!(body["error"], "Syntax error in graph");
    }

    #[tokio::test]
    async fn test_diagram_source_download() {
        let router = analyzed_router(FixedRenderer { outcome: Ok(vec![]) });

        let response = router
            .oneshot(Request::get("/api/export/diagram.mmd").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ERD_SALES_.mmd\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), SALES_DIAGRAM);
    }
}
