//! Work orders, their change log and visits against a live database.

use chrono::{Duration, Utc};

use mantis_db::test_fixtures::TestDatabase;
use mantis_db::{
    CreateOrdenRequest, CreateSolicitudBajaRequest, CreateVisitaRequest, Error, OrdenEstado,
    OrdenRepository, SolicitudBajaRepository, SolicitudRepository, VisitaRepository,
};

async fn open_orden(t: &TestDatabase) -> (i64, i64) {
    let cliente = t.cliente("Ordenes").await;
    let equipo = t.equipo(cliente, "Caldera").await;
    let solicitud = t.solicitud(cliente, Some(equipo)).await;
    let orden = t
        .db
        .ordenes
        .create(CreateOrdenRequest {
            id_solicitud: solicitud,
            creado_por: "supervisor".to_string(),
        })
        .await
        .expect("create orden failed");
    (solicitud, orden)
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_create_orden_logs_first_change_and_moves_request() {
    dotenvy::dotenv().ok();
    let t = TestDatabase::new().await;
    let (solicitud, orden) = open_orden(&t).await;

    let detalle = t.db.ordenes.get(orden).await.unwrap().unwrap();
    assert_eq!(detalle.orden.id_estado, i32::from(OrdenEstado::Abierta));
    assert_eq!(detalle.orden.total, 0.0);
    assert_eq!(detalle.cambios.len(), 1);
    assert_eq!(detalle.cambios[0].usuario, "supervisor");
    assert!(detalle.visitas.is_empty());

    let s = t.db.solicitudes.get(solicitud).await.unwrap().unwrap();
    assert_eq!(s.estado.as_deref(), Some("en_proceso"));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_create_orden_for_unknown_request_is_not_found() {
    dotenvy::dotenv().ok();
    let t = TestDatabase::new().await;
    let err = t
        .db
        .ordenes
        .create(CreateOrdenRequest {
            id_solicitud: i64::MAX,
            creado_por: "supervisor".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_closing_orden_sets_closer_and_rejects_further_changes() {
    dotenvy::dotenv().ok();
    let t = TestDatabase::new().await;
    let (_, orden) = open_orden(&t).await;

    t.db.ordenes
        .change_estado(orden, OrdenEstado::EnEjecucion, "tecnico", None)
        .await
        .unwrap();
    let cerrada = t
        .db
        .ordenes
        .change_estado(orden, OrdenEstado::Cerrada, "jefe", Some("Trabajo terminado"))
        .await
        .unwrap();
    assert_eq!(cerrada.cerrado_por.as_deref(), Some("jefe"));
    assert!(cerrada.cierre.is_some());

    let detalle = t.db.ordenes.get(orden).await.unwrap().unwrap();
    assert_eq!(detalle.cambios.len(), 3);
    assert_eq!(detalle.cambios[2].descripcion, "Trabajo terminado");

    let err = t
        .db
        .ordenes
        .change_estado(orden, OrdenEstado::Abierta, "jefe", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_visit_close_appends_and_second_close_conflicts() {
    dotenvy::dotenv().ok();
    let t = TestDatabase::new().await;
    let (_, orden) = open_orden(&t).await;

    let visita = t
        .db
        .visitas
        .schedule(
            orden,
            CreateVisitaRequest {
                inicio: Utc::now() + Duration::days(1),
                duracion_minutos: 90,
                actividades: Some("Inspección visual".to_string()),
            },
        )
        .await
        .unwrap();
    assert!(!visita.cerrada);

    let closed = t
        .db
        .visitas
        .close(visita.id, "Se reemplazó el sello")
        .await
        .unwrap();
    assert!(closed.cerrada);
    assert!(closed.cierre.is_some());
    let notes = closed.actividades.unwrap();
    assert!(notes.starts_with("Inspección visual\n["));
    assert!(notes.ends_with("] Se reemplazó el sello"));

    let err = t.db.visitas.close(visita.id, "otra vez").await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let detalle = t.db.ordenes.get(orden).await.unwrap().unwrap();
    assert_eq!(detalle.visitas.len(), 1);
    assert!(detalle.visitas[0].cerrada);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_baja_takes_client_from_equipment() {
    dotenvy::dotenv().ok();
    let t = TestDatabase::new().await;
    let cliente = t.cliente("Baja").await;
    let equipo = t.equipo(cliente, "Bomba").await;

    let id = t
        .db
        .solicitudes_baja
        .create(CreateSolicitudBajaRequest {
            id_equipo: equipo,
            solicitante: "operaciones".to_string(),
            justificacion: "Fin de vida útil".to_string(),
        })
        .await
        .unwrap();
    let baja = t.db.solicitudes_baja.get(id).await.unwrap().unwrap();
    assert_eq!(baja.id_cliente, cliente);
    assert_eq!(baja.estado.as_deref(), Some("pendiente"));

    let err = t
        .db
        .solicitudes_baja
        .create(CreateSolicitudBajaRequest {
            id_equipo: i64::MAX,
            solicitante: "operaciones".to_string(),
            justificacion: "No existe".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
