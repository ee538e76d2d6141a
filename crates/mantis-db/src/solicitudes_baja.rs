//! Decommission request repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;
use tracing::info;

use mantis_core::{
    defaults, BajaEstado, BajaStats, CreateSolicitudBajaRequest, Error, GroupCount, ListFilter,
    Page, Paged, Result, SolicitudBaja, SolicitudBajaRepository,
};

use crate::aggregate;
use crate::filter_clause::{FilterClause, FilterClauseBuilder, ResourceColumns};
use crate::listing::ListQuery;
use crate::status;

/// Column layout of `solicitudes_baja`.
pub const SOLICITUDES_BAJA: ResourceColumns = ResourceColumns {
    table: "solicitudes_baja",
    alias: "b",
    estado: "b.id_estado",
    estados_table: "solicitudes_baja_estados",
    cliente: "b.id_cliente",
    fecha: "b.creacion",
    search: ["b.justificacion", "q.nombre"],
};

const SELECT: &str = "b.id, b.id_equipo, q.nombre AS equipo_nombre, b.id_cliente, \
     cl.nombre AS cliente_nombre, b.id_estado, e.nombre AS estado, b.solicitante, \
     b.justificacion, b.observacion, b.creacion, b.cambio_estado";

const FROM: &str = "solicitudes_baja b \
     LEFT JOIN equipos q ON q.id = b.id_equipo \
     LEFT JOIN clientes cl ON cl.id = b.id_cliente \
     LEFT JOIN solicitudes_baja_estados e ON e.id = b.id_estado";

const LIST: ListQuery<'static> = ListQuery {
    component: "solicitudes_baja",
    select: SELECT,
    from: FROM,
    order_by: "b.creacion DESC, b.id DESC",
};

/// MySQL implementation of SolicitudBajaRepository.
#[derive(Clone)]
pub struct MySqlSolicitudBajaRepository {
    pool: MySqlPool,
}

impl MySqlSolicitudBajaRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn map_baja(r: &MySqlRow) -> SolicitudBaja {
    SolicitudBaja {
        id: r.get("id"),
        id_equipo: r.get("id_equipo"),
        equipo_nombre: r.get("equipo_nombre"),
        id_cliente: r.get("id_cliente"),
        cliente_nombre: r.get("cliente_nombre"),
        id_estado: r.get("id_estado"),
        estado: r.get("estado"),
        solicitante: r.get("solicitante"),
        justificacion: r.get("justificacion"),
        observacion: r.get("observacion"),
        creacion: r.get("creacion"),
        cambio_estado: r.get("cambio_estado"),
    }
}

#[async_trait]
impl SolicitudBajaRepository for MySqlSolicitudBajaRepository {
    async fn list(&self, filter: &ListFilter, page: Page) -> Result<Paged<SolicitudBaja>> {
        let clause = FilterClauseBuilder::new(&SOLICITUDES_BAJA).build(filter);
        LIST.fetch(&self.pool, &clause, page, map_baja).await
    }

    async fn get(&self, id: i64) -> Result<Option<SolicitudBaja>> {
        let sql = format!("SELECT {} FROM {} WHERE b.id = ?", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_baja))
    }

    async fn create(&self, req: CreateSolicitudBajaRequest) -> Result<i64> {
        let id_cliente: i64 = sqlx::query_scalar("SELECT id_cliente FROM equipos WHERE id = ?")
            .bind(req.id_equipo)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::not_found("Equipo", req.id_equipo))?;

        let result = sqlx::query(
            r#"
            INSERT INTO solicitudes_baja
                (id_equipo, id_cliente, id_estado, solicitante, justificacion, creacion)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.id_equipo)
        .bind(id_cliente)
        .bind(i32::from(BajaEstado::Pendiente))
        .bind(req.solicitante.trim())
        .bind(req.justificacion.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        let id = result.last_insert_id() as i64;

        info!(
            subsystem = "db",
            component = "solicitudes_baja",
            op = "create",
            entity_id = id,
            id_equipo = req.id_equipo,
            "Decommission request created"
        );
        Ok(id)
    }

    async fn change_estado(
        &self,
        id: i64,
        estado: BajaEstado,
        observacion: Option<&str>,
    ) -> Result<SolicitudBaja> {
        let current = status::current_estado(&self.pool, SOLICITUDES_BAJA.table, id)
            .await?
            .ok_or_else(|| Error::not_found("Solicitud de baja", id))?;

        status::update_estado(
            &self.pool,
            SOLICITUDES_BAJA.table,
            id,
            current,
            estado.into(),
            observacion,
        )
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| Error::not_found("Solicitud de baja", id))
    }

    async fn count_by_estado(&self) -> Result<Vec<GroupCount>> {
        aggregate::count_by_estado(&self.pool, &SOLICITUDES_BAJA).await
    }

    async fn stats(&self) -> Result<BajaStats> {
        let total =
            aggregate::count_rows(&self.pool, "solicitudes_baja b", &FilterClause::all()).await?;
        let por_estado = self.count_by_estado().await?;
        let por_mes =
            aggregate::count_by_month(&self.pool, &SOLICITUDES_BAJA, defaults::STATS_MONTHS)
                .await?;
        Ok(BajaStats {
            total,
            por_estado,
            por_mes,
        })
    }
}
