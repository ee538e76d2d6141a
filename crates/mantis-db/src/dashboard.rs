//! Dashboard aggregates.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use sqlx::Row;
use tracing::debug;

use mantis_core::{
    defaults, BajaEstado, CotizacionEstado, DashboardRepository, DashboardStats,
    DashboardTotales, Error, OrdenEstado, Result,
};

use crate::aggregate;
use crate::ordenes::ORDENES;
use crate::solicitudes::{self, SOLICITUDES};

/// Equipment per client, by client name.
const EQUIPOS_POR_CLIENTE_FROM: &str = "equipos q JOIN clientes cl ON cl.id = q.id_cliente";

/// MySQL implementation of DashboardRepository.
#[derive(Clone)]
pub struct MySqlDashboardRepository {
    pool: MySqlPool,
}

impl MySqlDashboardRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn totales(&self) -> Result<DashboardTotales> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM clientes) AS clientes,
                (SELECT COUNT(*) FROM equipos) AS equipos,
                (SELECT COUNT(*) FROM solicitudes) AS solicitudes,
                (SELECT COUNT(*) FROM ordenes) AS ordenes,
                (SELECT COUNT(*) FROM ordenes WHERE id_estado IN (?, ?)) AS ordenes_abiertas,
                (SELECT COUNT(*) FROM cotizaciones WHERE id_estado = ?) AS cotizaciones_pendientes,
                (SELECT COUNT(*) FROM solicitudes_baja WHERE id_estado = ?) AS bajas_pendientes
            "#,
        )
        .bind(i32::from(OrdenEstado::Abierta))
        .bind(i32::from(OrdenEstado::EnEjecucion))
        .bind(i32::from(CotizacionEstado::Pendiente))
        .bind(i32::from(BajaEstado::Pendiente))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(DashboardTotales {
            clientes: row.get("clientes"),
            equipos: row.get("equipos"),
            solicitudes: row.get("solicitudes"),
            ordenes: row.get("ordenes"),
            ordenes_abiertas: row.get("ordenes_abiertas"),
            cotizaciones_pendientes: row.get("cotizaciones_pendientes"),
            bajas_pendientes: row.get("bajas_pendientes"),
        })
    }
}

#[async_trait]
impl DashboardRepository for MySqlDashboardRepository {
    async fn stats(&self) -> Result<DashboardStats> {
        let start = Instant::now();

        let totales = self.totales().await?;
        let solicitudes_por_estado = aggregate::count_by_estado(&self.pool, &SOLICITUDES).await?;
        let ordenes_por_estado = aggregate::count_by_estado(&self.pool, &ORDENES).await?;
        let solicitudes_por_mes =
            aggregate::count_by_month(&self.pool, &SOLICITUDES, defaults::STATS_MONTHS).await?;
        let equipos_por_cliente = aggregate::count_by(
            &self.pool,
            EQUIPOS_POR_CLIENTE_FROM,
            "cl.id, cl.nombre",
            "cl.nombre",
            defaults::PAGE_LIMIT,
        )
        .await?;

        let sql = format!(
            "SELECT {} FROM {} ORDER BY s.creacion DESC, s.id DESC LIMIT ?",
            solicitudes::SELECT,
            solicitudes::FROM
        );
        let rows = sqlx::query(&sql)
            .bind(defaults::DASHBOARD_RECENT)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        let solicitudes_recientes = rows.iter().map(solicitudes::map_solicitud).collect();

        debug!(
            subsystem = "db",
            component = "dashboard",
            op = "stats",
            duration_ms = start.elapsed().as_millis() as u64,
            "Dashboard stats computed"
        );

        Ok(DashboardStats {
            totales,
            solicitudes_por_estado,
            ordenes_por_estado,
            solicitudes_por_mes,
            equipos_por_cliente,
            solicitudes_recientes,
        })
    }
}
