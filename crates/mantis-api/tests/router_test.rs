//! Router tests for request paths that resolve without a database.
//!
//! The pool points at a closed port and connects lazily, so any request that
//! reaches a query would fail; every case here must be answered by routing,
//! extraction or validation first.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use mantis_api::{router, AppState, CatalogService, ServerConfig};
use mantis_db::{create_lazy_pool, Database, NoopCache, PoolConfig};

fn app() -> Router {
    let pool = create_lazy_pool(
        "mysql://root@127.0.0.1:1/none",
        PoolConfig::new().connect_timeout(Duration::from_millis(500)),
    )
    .expect("lazy pool");
    let db = Database::new(pool);
    let catalog = CatalogService::new(
        Arc::new(db.catalogs.clone()),
        Arc::new(NoopCache),
        Duration::from_secs(60),
    );
    let config = ServerConfig::from_lookup(|_| None).expect("default config");
    router(AppState { db, catalog }, &config)
}

async fn send(req: Request<Body>) -> (StatusCode, Value, axum::http::HeaderMap) {
    let resp = app().oneshot(req).await.expect("infallible service");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body, headers)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn assert_error(body: &Value) -> &str {
    assert_eq!(body["success"], Value::Bool(false));
    assert!(body.get("data").is_none());
    body["message"].as_str().expect("message")
}

#[tokio::test]
async fn test_invalid_estado_filter_is_bad_request_naming_field() {
    let (status, body, _) = send(get("/api/cotizaciones?id_estado=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(assert_error(&body).contains("id_estado"));
}

#[tokio::test]
async fn test_invalid_date_filter_is_bad_request() {
    let (status, body, _) = send(get("/api/dashboard/public?fecha_desde=2024-13-40")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(assert_error(&body).contains("fecha_desde"));
}

#[tokio::test]
async fn test_patch_cotizacion_with_out_of_range_estado_is_bad_request() {
    let (status, body, _) = send(json(
        Method::PATCH,
        "/api/cotizaciones/1/estado",
        r#"{"id_estado": 9}"#,
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body);
}

#[tokio::test]
async fn test_patch_baja_without_estado_is_bad_request() {
    let (status, body, _) = send(json(Method::PATCH, "/api/dar-de-baja/1/estado", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body);
}

#[tokio::test]
async fn test_patch_orden_without_usuario_is_bad_request() {
    let (status, _, _) = send(json(
        Method::PATCH,
        "/api/ordenes/1/estado",
        r#"{"id_estado": 2, "usuario": "  "}"#,
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request_envelope() {
    let (status, body, _) = send(json(Method::POST, "/api/cotizaciones", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body);
}

#[tokio::test]
async fn test_non_numeric_path_id_is_bad_request() {
    let (status, body, _) = send(get("/api/cotizaciones/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body);
}

#[tokio::test]
async fn test_create_cotizacion_without_titulo_is_bad_request() {
    let (status, body, _) = send(json(
        Method::POST,
        "/api/cotizaciones",
        r#"{"id_cliente": 1, "titulo": ""}"#,
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(assert_error(&body).contains("titulo"));
}

#[tokio::test]
async fn test_schedule_visita_with_zero_duration_is_bad_request() {
    let (status, _, _) = send(json(
        Method::POST,
        "/api/ordenes/1/visitas",
        r#"{"inicio": "2026-01-05T09:00:00Z", "duracion_minutos": 0}"#,
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_estado_catalog_is_bad_request() {
    let (status, body, _) = send(get("/api/generales/estados/facturas")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(assert_error(&body).contains("entidad"));
}

#[tokio::test]
async fn test_equipos_with_bad_client_filter_is_bad_request() {
    let (status, _, _) = send(get("/api/generales/equipos?id_cliente=x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_uses_not_found_envelope() {
    let (status, body, _) = send(get("/api/nada")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (_, _, headers) = send(get("/api/nada")).await;
    let id = headers
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_incoming_request_id_is_propagated() {
    let req = Request::builder()
        .uri("/api/nada")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let (_, _, headers) = send(req).await;
    assert_eq!(headers.get("x-request-id").unwrap(), "abc-123");
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let (status, body, _) = send(get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["database"], "unreachable");
}
