//! Dashboard aggregates against a live database.

use chrono::Utc;

use mantis_db::test_fixtures::TestDatabase;
use mantis_db::{CatalogRepository, CreateClienteRequest, DashboardRepository};

async fn named_cliente(t: &TestDatabase, nombre: &str) -> i64 {
    t.db.catalogs
        .create_cliente(CreateClienteRequest {
            nombre: nombre.to_string(),
            rut: None,
            contacto: None,
            email: None,
            telefono: None,
        })
        .await
        .expect("create cliente failed")
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_equipos_por_cliente_keeps_homonymous_clients_apart() {
    dotenvy::dotenv().ok();
    let t = TestDatabase::new().await;
    let nombre = format!("Homonimo-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let primero = named_cliente(&t, &nombre).await;
    let segundo = named_cliente(&t, &nombre).await;
    for i in 0..3 {
        t.equipo(primero, &format!("Bomba {}", i)).await;
    }
    for i in 0..2 {
        t.equipo(segundo, &format!("Chiller {}", i)).await;
    }

    let stats = t.db.dashboard.stats().await.unwrap();
    let counts: Vec<i64> = stats
        .equipos_por_cliente
        .iter()
        .filter(|g| g.key == nombre)
        .map(|g| g.count)
        .collect();

    assert!(!counts.contains(&5), "clients with the same name were merged");
    assert!(counts.iter().all(|c| *c == 3 || *c == 2));
}
