//! Quotation repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;
use tracing::info;

use mantis_core::{
    defaults, Cotizacion, CotizacionDetalle, CotizacionEstado, CotizacionRepository,
    CotizacionStats, CotizacionTotales, CreateCotizacionRequest, Error, GroupCount,
    ItemAdicional, ListFilter, Page, Paged, Repuesto, Result,
};

use crate::aggregate;
use crate::filter_clause::{FilterClauseBuilder, ResourceColumns};
use crate::listing::ListQuery;
use crate::status;

/// Column layout of `cotizaciones` for filters and statistics.
pub const COTIZACIONES: ResourceColumns = ResourceColumns {
    table: "cotizaciones",
    alias: "c",
    estado: "c.id_estado",
    estados_table: "cotizaciones_estados",
    cliente: "c.id_cliente",
    fecha: "c.creacion",
    search: ["c.titulo", "cl.nombre"],
};

const SELECT: &str = "c.id, c.id_cliente, cl.nombre AS cliente_nombre, c.id_orden, c.id_estado, \
     e.nombre AS estado, c.titulo, c.mensaje, c.observacion, \
     CAST(c.total AS DOUBLE) AS total, c.creacion, c.cambio_estado";

const FROM: &str = "cotizaciones c \
     LEFT JOIN clientes cl ON cl.id = c.id_cliente \
     LEFT JOIN cotizaciones_estados e ON e.id = c.id_estado";

const LIST: ListQuery<'static> = ListQuery {
    component: "cotizaciones",
    select: SELECT,
    from: FROM,
    order_by: "c.creacion DESC, c.id DESC",
};

/// MySQL implementation of CotizacionRepository.
#[derive(Clone)]
pub struct MySqlCotizacionRepository {
    pool: MySqlPool,
}

impl MySqlCotizacionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_one(&self, id: i64) -> Result<Option<Cotizacion>> {
        let sql = format!("SELECT {} FROM {} WHERE c.id = ?", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_cotizacion))
    }

    async fn repuestos(&self, id: i64) -> Result<Vec<Repuesto>> {
        let rows = sqlx::query(
            r#"
            SELECT id, descripcion, cantidad,
                   CAST(precio_unitario AS DOUBLE) AS precio_unitario,
                   CAST(cantidad * precio_unitario AS DOUBLE) AS subtotal
            FROM cotizaciones_repuestos
            WHERE id_cotizacion = ?
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| Repuesto {
                id: r.get("id"),
                descripcion: r.get("descripcion"),
                cantidad: r.get("cantidad"),
                precio_unitario: r.get("precio_unitario"),
                subtotal: r.get("subtotal"),
            })
            .collect())
    }

    async fn items_adicionales(&self, id: i64) -> Result<Vec<ItemAdicional>> {
        let rows = sqlx::query(
            r#"
            SELECT id, descripcion, CAST(monto AS DOUBLE) AS monto
            FROM cotizaciones_items_adicionales
            WHERE id_cotizacion = ?
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| ItemAdicional {
                id: r.get("id"),
                descripcion: r.get("descripcion"),
                monto: r.get("monto"),
            })
            .collect())
    }

    async fn totales(&self) -> Result<CotizacionTotales> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cantidad,
                   CAST(COALESCE(SUM(total), 0) AS DOUBLE) AS monto_total,
                   CAST(COALESCE(SUM(CASE WHEN id_estado = ? THEN total END), 0) AS DOUBLE)
                       AS monto_aprobado
            FROM cotizaciones
            "#,
        )
        .bind(i32::from(CotizacionEstado::Aprobada))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(CotizacionTotales {
            cantidad: row.get("cantidad"),
            monto_total: row.get("monto_total"),
            monto_aprobado: row.get("monto_aprobado"),
        })
    }
}

fn map_cotizacion(r: &MySqlRow) -> Cotizacion {
    Cotizacion {
        id: r.get("id"),
        id_cliente: r.get("id_cliente"),
        cliente_nombre: r.get("cliente_nombre"),
        id_orden: r.get("id_orden"),
        id_estado: r.get("id_estado"),
        estado: r.get("estado"),
        titulo: r.get("titulo"),
        mensaje: r.get("mensaje"),
        observacion: r.get("observacion"),
        total: r.get("total"),
        creacion: r.get("creacion"),
        cambio_estado: r.get("cambio_estado"),
    }
}

#[async_trait]
impl CotizacionRepository for MySqlCotizacionRepository {
    async fn list(&self, filter: &ListFilter, page: Page) -> Result<Paged<Cotizacion>> {
        let clause = FilterClauseBuilder::new(&COTIZACIONES).build(filter);
        LIST.fetch(&self.pool, &clause, page, map_cotizacion).await
    }

    async fn get(&self, id: i64) -> Result<Option<CotizacionDetalle>> {
        let Some(cotizacion) = self.fetch_one(id).await? else {
            return Ok(None);
        };
        let repuestos = self.repuestos(id).await?;
        let items_adicionales = self.items_adicionales(id).await?;
        Ok(Some(CotizacionDetalle {
            cotizacion,
            repuestos,
            items_adicionales,
        }))
    }

    async fn create(&self, req: CreateCotizacionRequest) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let cliente: Option<i64> = sqlx::query_scalar("SELECT id FROM clientes WHERE id = ?")
            .bind(req.id_cliente)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if cliente.is_none() {
            return Err(Error::not_found("Cliente", req.id_cliente));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO cotizaciones (id_cliente, id_orden, id_estado, titulo, mensaje, total, creacion)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.id_cliente)
        .bind(req.id_orden)
        .bind(i32::from(CotizacionEstado::Pendiente))
        .bind(req.titulo.trim())
        .bind(&req.mensaje)
        .bind(req.total())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let id = result.last_insert_id() as i64;

        for r in &req.repuestos {
            sqlx::query(
                r#"
                INSERT INTO cotizaciones_repuestos (id_cotizacion, descripcion, cantidad, precio_unitario)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(r.descripcion.trim())
            .bind(r.cantidad)
            .bind(r.precio_unitario)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        for item in &req.items_adicionales {
            sqlx::query(
                r#"
                INSERT INTO cotizaciones_items_adicionales (id_cotizacion, descripcion, monto)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(item.descripcion.trim())
            .bind(item.monto)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "cotizaciones",
            op = "create",
            entity_id = id,
            repuestos = req.repuestos.len(),
            items_adicionales = req.items_adicionales.len(),
            "Quotation created"
        );
        Ok(id)
    }

    async fn change_estado(
        &self,
        id: i64,
        estado: CotizacionEstado,
        observacion: Option<&str>,
    ) -> Result<Cotizacion> {
        let current = status::current_estado(&self.pool, COTIZACIONES.table, id)
            .await?
            .ok_or_else(|| Error::not_found("Cotización", id))?;

        status::update_estado(
            &self.pool,
            COTIZACIONES.table,
            id,
            current,
            estado.into(),
            observacion,
        )
        .await?;

        self.fetch_one(id)
            .await?
            .ok_or_else(|| Error::not_found("Cotización", id))
    }

    async fn count_by_estado(&self) -> Result<Vec<GroupCount>> {
        aggregate::count_by_estado(&self.pool, &COTIZACIONES).await
    }

    async fn stats(&self) -> Result<CotizacionStats> {
        let por_estado = self.count_by_estado().await?;
        let por_mes =
            aggregate::count_by_month(&self.pool, &COTIZACIONES, defaults::STATS_MONTHS).await?;
        let totales = self.totales().await?;
        Ok(CotizacionStats {
            por_estado,
            por_mes,
            totales,
        })
    }
}
