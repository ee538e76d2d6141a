//! Status changes through the HTTP layer against a live database.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use mantis_api::{router, AppState, CatalogService, ServerConfig};
use mantis_db::test_fixtures::TestDatabase;
use mantis_db::{CotizacionRepository, NoopCache};

fn app(t: &TestDatabase) -> Router {
    let catalog = CatalogService::new(
        Arc::new(t.db.catalogs.clone()),
        Arc::new(NoopCache),
        Duration::from_secs(60),
    );
    let config = ServerConfig::from_lookup(|_| None).expect("default config");
    router(
        AppState {
            db: t.db.clone(),
            catalog,
        },
        &config,
    )
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.expect("infallible service");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

fn patch_estado(id: i64, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::PATCH)
        .uri(format!("/api/cotizaciones/{}/estado", id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: String) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn item_ids(body: &Value) -> Vec<i64> {
    body["data"]["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|c| c["id"].as_i64().expect("id"))
        .collect()
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_patch_with_invalid_estado_leaves_row_untouched() {
    dotenvy::dotenv().ok();
    let t = TestDatabase::new().await;
    let cliente = t.cliente("Patch Invalido").await;
    let id = t.cotizacion(cliente, "Cambio de filtro").await;

    let (status, body) = call(app(&t), patch_estado(id, r#"{"id_estado": 9}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], Value::Bool(false));

    let row = t.db.cotizaciones.get(id).await.unwrap().unwrap();
    assert_eq!(row.cotizacion.id_estado, 1);
    assert!(row.cotizacion.cambio_estado.is_none());
    assert!(row.cotizacion.observacion.is_none());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_patch_moves_row_between_filtered_listings() {
    dotenvy::dotenv().ok();
    let t = TestDatabase::new().await;
    let cliente = t.cliente("Patch Listado").await;
    let id = t.cotizacion(cliente, "Revisión caldera").await;
    let listing = |estado: i32| {
        format!(
            "/api/cotizaciones?id_cliente={}&id_estado={}",
            cliente, estado
        )
    };

    let (_, pendientes) = call(app(&t), get(listing(1))).await;
    assert_eq!(item_ids(&pendientes), vec![id]);

    let (status, body) = call(
        app(&t),
        patch_estado(id, r#"{"id_estado": 2, "observacion": "aprobada por cliente"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id_estado"], 2);

    let (_, pendientes) = call(app(&t), get(listing(1))).await;
    assert!(item_ids(&pendientes).is_empty());
    let (_, aprobadas) = call(app(&t), get(listing(2))).await;
    assert_eq!(item_ids(&aprobadas), vec![id]);
    assert_eq!(aprobadas["data"]["pagination"]["total"], 1);
}
