//! Reference catalogs: clients, equipment and status tables.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;
use tracing::info;

use mantis_core::{
    CatalogRepository, Cliente, CreateClienteRequest, CreateEquipoRequest, Entidad, Equipo,
    Error, EstadoCatalogo, Result,
};

/// MySQL implementation of CatalogRepository.
#[derive(Clone)]
pub struct MySqlCatalogRepository {
    pool: MySqlPool,
}

impl MySqlCatalogRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn map_cliente(r: &MySqlRow) -> Cliente {
    Cliente {
        id: r.get("id"),
        nombre: r.get("nombre"),
        rut: r.get("rut"),
        contacto: r.get("contacto"),
        email: r.get("email"),
        telefono: r.get("telefono"),
        creacion: r.get("creacion"),
    }
}

fn map_equipo(r: &MySqlRow) -> Equipo {
    Equipo {
        id: r.get("id"),
        id_cliente: r.get("id_cliente"),
        cliente_nombre: r.get("cliente_nombre"),
        nombre: r.get("nombre"),
        marca: r.get("marca"),
        modelo: r.get("modelo"),
        serie: r.get("serie"),
        ubicacion: r.get("ubicacion"),
        creacion: r.get("creacion"),
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait]
impl CatalogRepository for MySqlCatalogRepository {
    async fn list_clientes(&self) -> Result<Vec<Cliente>> {
        let rows = sqlx::query(
            "SELECT id, nombre, rut, contacto, email, telefono, creacion \
             FROM clientes ORDER BY nombre, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(map_cliente).collect())
    }

    async fn list_equipos(&self, id_cliente: Option<i64>) -> Result<Vec<Equipo>> {
        let rows = sqlx::query(
            r#"
            SELECT q.id, q.id_cliente, cl.nombre AS cliente_nombre, q.nombre, q.marca,
                   q.modelo, q.serie, q.ubicacion, q.creacion
            FROM equipos q
            LEFT JOIN clientes cl ON cl.id = q.id_cliente
            WHERE (? IS NULL OR q.id_cliente = ?)
            ORDER BY q.nombre, q.id
            "#,
        )
        .bind(id_cliente)
        .bind(id_cliente)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(map_equipo).collect())
    }

    async fn list_estados(&self, entidad: Entidad) -> Result<Vec<EstadoCatalogo>> {
        let sql = format!("SELECT id, nombre FROM {} ORDER BY id", entidad.catalog());
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows
            .iter()
            .map(|r| EstadoCatalogo {
                id: r.get("id"),
                nombre: r.get("nombre"),
            })
            .collect())
    }

    async fn create_cliente(&self, req: CreateClienteRequest) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO clientes (nombre, rut, contacto, email, telefono, creacion)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.nombre.trim())
        .bind(trimmed(&req.rut))
        .bind(trimmed(&req.contacto))
        .bind(trimmed(&req.email))
        .bind(trimmed(&req.telefono))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        let id = result.last_insert_id() as i64;

        info!(
            subsystem = "db",
            component = "catalogs",
            op = "create_cliente",
            entity_id = id,
            "Client created"
        );
        Ok(id)
    }

    async fn create_equipo(&self, req: CreateEquipoRequest) -> Result<i64> {
        let cliente: Option<i64> = sqlx::query_scalar("SELECT id FROM clientes WHERE id = ?")
            .bind(req.id_cliente)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        if cliente.is_none() {
            return Err(Error::not_found("Cliente", req.id_cliente));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO equipos (id_cliente, nombre, marca, modelo, serie, ubicacion, creacion)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.id_cliente)
        .bind(req.nombre.trim())
        .bind(trimmed(&req.marca))
        .bind(trimmed(&req.modelo))
        .bind(trimmed(&req.serie))
        .bind(trimmed(&req.ubicacion))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        let id = result.last_insert_id() as i64;

        info!(
            subsystem = "db",
            component = "catalogs",
            op = "create_equipo",
            entity_id = id,
            id_cliente = req.id_cliente,
            "Equipment created"
        );
        Ok(id)
    }
}
