//! mantis-api - HTTP API for the maintenance management backend.
//!
//! Every response uses the `{ success, data, message }` envelope from
//! [`envelope`]. Domain errors map to 400/404/409/500 in [`error`].

pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod services;

use std::any::Any;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::error;
use uuid::Uuid;

use mantis_core::defaults;
use mantis_db::Database;

pub use config::{Environment, ServerConfig};
pub use error::ApiError;
pub use services::CatalogService;

use handlers::{cotizaciones, dar_de_baja, dashboard, generales, health, ordenes};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub catalog: CatalogService,
}

/// Generates time-ordered request ids for `x-request-id`.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router with all routes and middleware.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Cotizaciones
        .route(
            "/api/cotizaciones",
            get(cotizaciones::list_cotizaciones).post(cotizaciones::create_cotizacion),
        )
        .route(
            "/api/cotizaciones/estadisticas",
            get(cotizaciones::cotizaciones_estadisticas),
        )
        .route("/api/cotizaciones/:id", get(cotizaciones::get_cotizacion))
        .route(
            "/api/cotizaciones/:id/estado",
            patch(cotizaciones::change_cotizacion_estado),
        )
        // Dashboard (service requests)
        .route("/api/dashboard/stats", get(dashboard::dashboard_stats))
        .route(
            "/api/dashboard/public",
            get(dashboard::list_solicitudes).post(dashboard::create_solicitud),
        )
        .route("/api/dashboard/public/:id", get(dashboard::get_solicitud))
        // Dar de baja
        .route("/api/dar-de-baja/stats", get(dar_de_baja::baja_stats))
        .route(
            "/api/dar-de-baja/public",
            get(dar_de_baja::list_bajas).post(dar_de_baja::create_baja),
        )
        .route("/api/dar-de-baja/public/:id", get(dar_de_baja::get_baja))
        .route(
            "/api/dar-de-baja/:id/estado",
            patch(dar_de_baja::change_baja_estado),
        )
        // Ordenes and visitas
        .route(
            "/api/ordenes",
            get(ordenes::list_ordenes).post(ordenes::create_orden),
        )
        .route("/api/ordenes/:id", get(ordenes::get_orden))
        .route("/api/ordenes/:id/estado", patch(ordenes::change_orden_estado))
        .route("/api/ordenes/:id/visitas", post(ordenes::schedule_visita))
        .route("/api/visitas/:id/cerrar", patch(ordenes::close_visita))
        // Generales
        .route(
            "/api/generales/clientes",
            get(generales::list_clientes).post(generales::create_cliente),
        )
        .route(
            "/api/generales/equipos",
            get(generales::list_equipos).post(generales::create_equipo),
        )
        .route(
            "/api/generales/estados/:entidad",
            get(generales::list_estados),
        )
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(&config.allowed_origins))
        .layer(RequestBodyLimitLayer::new(defaults::MAX_BODY_BYTES))
        .with_state(state)
}

/// CORS for the configured origins. `*` allows any origin without
/// credentials; an empty list allows none.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(AllowOrigin::any());
    }

    let list: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    base.allow_origin(AllowOrigin::list(list))
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Ruta no encontrada".to_string())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(subsystem = "api", panic = detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "success": false,
            "message": error::INTERNAL_ERROR_MESSAGE,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_is_uuid_v7() {
        let req = axum::http::Request::new(());
        let id = MakeRequestUuidV7.make_request_id(&req).unwrap();
        let parsed = Uuid::parse_str(id.header_value().to_str().unwrap()).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn test_panic_response_is_masked_envelope() {
        let resp = panic_response(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
