//! Work order repository implementation.
//!
//! Every status change of an order appends a row to `ordenes_cambios` in
//! the same transaction, so the change log and the current status never
//! disagree.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::{MySql, Row, Transaction};
use tracing::info;

use mantis_core::{
    Cambio, CotizacionEstado, CreateOrdenRequest, Error, Estado, GroupCount, ListFilter, Orden,
    OrdenDetalle, OrdenEstado, OrdenRepository, Page, Paged, Result, SolicitudEstado,
};

use crate::aggregate;
use crate::filter_clause::{FilterClauseBuilder, ResourceColumns};
use crate::listing::ListQuery;
use crate::status;
use crate::visitas;

/// Column layout of `ordenes`. The client comes from the originating request.
pub const ORDENES: ResourceColumns = ResourceColumns {
    table: "ordenes",
    alias: "o",
    estado: "o.id_estado",
    estados_table: "ordenes_estados",
    cliente: "s.id_cliente",
    fecha: "o.creacion",
    search: ["o.creado_por", "cl.nombre"],
};

const FROM: &str = "ordenes o \
     JOIN solicitudes s ON s.id = o.id_solicitud \
     LEFT JOIN clientes cl ON cl.id = s.id_cliente \
     LEFT JOIN ordenes_estados e ON e.id = o.id_estado";

const LIST_ORDER: &str = "o.creacion DESC, o.id DESC";

/// Column list; `total` is the sum of the order's approved quotations.
fn select() -> String {
    format!(
        "o.id, o.id_solicitud, s.id_cliente, cl.nombre AS cliente_nombre, o.id_estado, \
         e.nombre AS estado, o.creado_por, o.cerrado_por, \
         CAST(COALESCE((SELECT SUM(k.total) FROM cotizaciones k \
             WHERE k.id_orden = o.id AND k.id_estado = {}), 0) AS DOUBLE) AS total, \
         o.creacion, o.cambio_estado, o.cierre",
        i32::from(CotizacionEstado::Aprobada)
    )
}

/// MySQL implementation of OrdenRepository.
#[derive(Clone)]
pub struct MySqlOrdenRepository {
    pool: MySqlPool,
}

impl MySqlOrdenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_one(&self, id: i64) -> Result<Option<Orden>> {
        let sql = format!("SELECT {} FROM {} WHERE o.id = ?", select(), FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_orden))
    }

    async fn cambios(&self, id_orden: i64) -> Result<Vec<Cambio>> {
        let rows = sqlx::query(
            r#"
            SELECT id, id_orden, descripcion, usuario, creacion
            FROM ordenes_cambios
            WHERE id_orden = ?
            ORDER BY creacion, id
            "#,
        )
        .bind(id_orden)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| Cambio {
                id: r.get("id"),
                id_orden: r.get("id_orden"),
                descripcion: r.get("descripcion"),
                usuario: r.get("usuario"),
                creacion: r.get("creacion"),
            })
            .collect())
    }
}

fn map_orden(r: &MySqlRow) -> Orden {
    Orden {
        id: r.get("id"),
        id_solicitud: r.get("id_solicitud"),
        id_cliente: r.get("id_cliente"),
        cliente_nombre: r.get("cliente_nombre"),
        id_estado: r.get("id_estado"),
        estado: r.get("estado"),
        creado_por: r.get("creado_por"),
        cerrado_por: r.get("cerrado_por"),
        total: r.get("total"),
        creacion: r.get("creacion"),
        cambio_estado: r.get("cambio_estado"),
        cierre: r.get("cierre"),
    }
}

async fn insert_cambio(
    tx: &mut Transaction<'_, MySql>,
    id_orden: i64,
    descripcion: &str,
    usuario: &str,
    at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ordenes_cambios (id_orden, descripcion, usuario, creacion)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id_orden)
    .bind(descripcion)
    .bind(usuario)
    .bind(at)
    .execute(&mut **tx)
    .await
    .map_err(Error::Database)?;
    Ok(())
}

/// Terminal states accept no further transitions.
fn is_terminal(estado: OrdenEstado) -> bool {
    matches!(estado, OrdenEstado::Cerrada | OrdenEstado::Anulada)
}

#[async_trait]
impl OrdenRepository for MySqlOrdenRepository {
    async fn list(&self, filter: &ListFilter, page: Page) -> Result<Paged<Orden>> {
        let clause = FilterClauseBuilder::new(&ORDENES).build(filter);
        let select = select();
        let query = ListQuery {
            component: "ordenes",
            select: &select,
            from: FROM,
            order_by: LIST_ORDER,
        };
        query.fetch(&self.pool, &clause, page, map_orden).await
    }

    async fn get(&self, id: i64) -> Result<Option<OrdenDetalle>> {
        let Some(orden) = self.fetch_one(id).await? else {
            return Ok(None);
        };
        let cambios = self.cambios(id).await?;
        let visitas = visitas::fetch_for_orden(&self.pool, id).await?;
        Ok(Some(OrdenDetalle {
            orden,
            cambios,
            visitas,
        }))
    }

    async fn create(&self, req: CreateOrdenRequest) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let solicitud_estado: i32 =
            sqlx::query_scalar("SELECT id_estado FROM solicitudes WHERE id = ? FOR UPDATE")
                .bind(req.id_solicitud)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?
                .ok_or_else(|| Error::not_found("Solicitud", req.id_solicitud))?;
        let solicitud_estado = SolicitudEstado::try_from(solicitud_estado)?;
        if matches!(
            solicitud_estado,
            SolicitudEstado::Completada | SolicitudEstado::Cancelada
        ) {
            return Err(Error::Conflict(format!(
                "la solicitud {} está {}",
                req.id_solicitud,
                solicitud_estado.nombre()
            )));
        }

        let now = Utc::now();
        let creado_por = req.creado_por.trim();
        let result = sqlx::query(
            r#"
            INSERT INTO ordenes (id_solicitud, id_estado, creado_por, creacion)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(req.id_solicitud)
        .bind(i32::from(OrdenEstado::Abierta))
        .bind(creado_por)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let id = result.last_insert_id() as i64;

        insert_cambio(&mut tx, id, "Orden creada", creado_por, now).await?;

        if solicitud_estado == SolicitudEstado::Pendiente {
            status::update_estado(
                &mut *tx,
                "solicitudes",
                req.id_solicitud,
                solicitud_estado.into(),
                SolicitudEstado::EnProceso.into(),
                None,
            )
            .await?;
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "ordenes",
            op = "create",
            entity_id = id,
            id_solicitud = req.id_solicitud,
            "Work order created"
        );
        Ok(id)
    }

    async fn change_estado(
        &self,
        id: i64,
        estado: OrdenEstado,
        usuario: &str,
        descripcion: Option<&str>,
    ) -> Result<Orden> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let current = status::current_estado(&mut *tx, ORDENES.table, id)
            .await?
            .ok_or_else(|| Error::not_found("Orden", id))?;
        let current_estado = OrdenEstado::try_from(current)?;
        if is_terminal(current_estado) {
            return Err(Error::Conflict(format!(
                "la orden {} está {}",
                id,
                current_estado.nombre()
            )));
        }

        let now = Utc::now();
        let closing = estado == OrdenEstado::Cerrada;
        let result = sqlx::query(
            r#"
            UPDATE ordenes
            SET id_estado = ?,
                cambio_estado = ?,
                cerrado_por = CASE WHEN ? THEN ? ELSE cerrado_por END,
                cierre = CASE WHEN ? THEN ? ELSE cierre END
            WHERE id = ? AND id_estado = ?
            "#,
        )
        .bind(i32::from(estado))
        .bind(now)
        .bind(closing)
        .bind(usuario)
        .bind(closing)
        .bind(now)
        .bind(id)
        .bind(current)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::Conflict(format!(
                "el estado de ordenes {} cambió durante la actualización",
                id
            )));
        }

        let default_descripcion = format!(
            "Estado cambiado de {} a {}",
            current_estado.nombre(),
            estado.nombre()
        );
        let descripcion = descripcion.unwrap_or(&default_descripcion);
        insert_cambio(&mut tx, id, descripcion, usuario, now).await?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "ordenes",
            op = "change_estado",
            entity_id = id,
            id_estado = i32::from(estado),
            previous = current,
            "Work order status changed"
        );

        self.fetch_one(id)
            .await?
            .ok_or_else(|| Error::not_found("Orden", id))
    }

    async fn count_by_estado(&self) -> Result<Vec<GroupCount>> {
        aggregate::count_by_estado(&self.pool, &ORDENES).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_sums_approved_quotations_only() {
        let sql = select();
        assert!(sql.contains("k.id_orden = o.id AND k.id_estado = 2"));
        assert!(sql.ends_with("o.cierre"));
    }

    #[test]
    fn test_terminal_states() {
        assert!(is_terminal(OrdenEstado::Cerrada));
        assert!(is_terminal(OrdenEstado::Anulada));
        assert!(!is_terminal(OrdenEstado::Abierta));
        assert!(!is_terminal(OrdenEstado::EnEjecucion));
    }
}
