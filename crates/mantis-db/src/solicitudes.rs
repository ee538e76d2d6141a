//! Service request repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;
use tracing::info;

use mantis_core::{
    CreateSolicitudRequest, Error, GroupCount, ListFilter, Page, Paged, Result, Solicitud,
    SolicitudEstado, SolicitudRepository,
};

use crate::aggregate;
use crate::filter_clause::{FilterClauseBuilder, ResourceColumns};
use crate::listing::ListQuery;

/// Column layout of `solicitudes`.
pub const SOLICITUDES: ResourceColumns = ResourceColumns {
    table: "solicitudes",
    alias: "s",
    estado: "s.id_estado",
    estados_table: "solicitudes_estados",
    cliente: "s.id_cliente",
    fecha: "s.creacion",
    search: ["s.descripcion", "s.solicitante"],
};

pub(crate) const SELECT: &str = "s.id, s.id_cliente, cl.nombre AS cliente_nombre, s.id_equipo, \
     q.nombre AS equipo_nombre, s.id_estado, e.nombre AS estado, s.solicitante, s.descripcion, \
     s.creacion, s.cambio_estado";

pub(crate) const FROM: &str = "solicitudes s \
     LEFT JOIN clientes cl ON cl.id = s.id_cliente \
     LEFT JOIN equipos q ON q.id = s.id_equipo \
     LEFT JOIN solicitudes_estados e ON e.id = s.id_estado";

const LIST: ListQuery<'static> = ListQuery {
    component: "solicitudes",
    select: SELECT,
    from: FROM,
    order_by: "s.creacion DESC, s.id DESC",
};

/// MySQL implementation of SolicitudRepository.
#[derive(Clone)]
pub struct MySqlSolicitudRepository {
    pool: MySqlPool,
}

impl MySqlSolicitudRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn map_solicitud(r: &MySqlRow) -> Solicitud {
    Solicitud {
        id: r.get("id"),
        id_cliente: r.get("id_cliente"),
        cliente_nombre: r.get("cliente_nombre"),
        id_equipo: r.get("id_equipo"),
        equipo_nombre: r.get("equipo_nombre"),
        id_estado: r.get("id_estado"),
        estado: r.get("estado"),
        solicitante: r.get("solicitante"),
        descripcion: r.get("descripcion"),
        creacion: r.get("creacion"),
        cambio_estado: r.get("cambio_estado"),
    }
}

#[async_trait]
impl SolicitudRepository for MySqlSolicitudRepository {
    async fn list(&self, filter: &ListFilter, page: Page) -> Result<Paged<Solicitud>> {
        let clause = FilterClauseBuilder::new(&SOLICITUDES).build(filter);
        LIST.fetch(&self.pool, &clause, page, map_solicitud).await
    }

    async fn get(&self, id: i64) -> Result<Option<Solicitud>> {
        let sql = format!("SELECT {} FROM {} WHERE s.id = ?", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_solicitud))
    }

    async fn create(&self, req: CreateSolicitudRequest) -> Result<i64> {
        let cliente: Option<i64> = sqlx::query_scalar("SELECT id FROM clientes WHERE id = ?")
            .bind(req.id_cliente)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        if cliente.is_none() {
            return Err(Error::not_found("Cliente", req.id_cliente));
        }

        if let Some(id_equipo) = req.id_equipo {
            let owner: Option<i64> =
                sqlx::query_scalar("SELECT id_cliente FROM equipos WHERE id = ?")
                    .bind(id_equipo)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(Error::Database)?;
            match owner {
                None => return Err(Error::not_found("Equipo", id_equipo)),
                Some(owner) if owner != req.id_cliente => {
                    return Err(Error::InvalidInput(format!(
                        "el equipo {} no pertenece al cliente {}",
                        id_equipo, req.id_cliente
                    )))
                }
                Some(_) => {}
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO solicitudes (id_cliente, id_equipo, id_estado, solicitante, descripcion, creacion)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.id_cliente)
        .bind(req.id_equipo)
        .bind(i32::from(SolicitudEstado::Pendiente))
        .bind(req.solicitante.trim())
        .bind(req.descripcion.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        let id = result.last_insert_id() as i64;

        info!(
            subsystem = "db",
            component = "solicitudes",
            op = "create",
            entity_id = id,
            "Service request created"
        );
        Ok(id)
    }

    async fn count_by_estado(&self) -> Result<Vec<GroupCount>> {
        aggregate::count_by_estado(&self.pool, &SOLICITUDES).await
    }
}
