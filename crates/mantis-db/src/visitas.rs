//! Visit repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;
use tracing::info;

use mantis_core::{
    CreateVisitaRequest, Error, Estado, OrdenEstado, Result, Visita, VisitaRepository,
};

const SELECT: &str = "SELECT id, id_orden, inicio, duracion_minutos, actividades, cerrada, cierre \
     FROM visitas";

/// MySQL implementation of VisitaRepository.
#[derive(Clone)]
pub struct MySqlVisitaRepository {
    pool: MySqlPool,
}

impl MySqlVisitaRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn map_visita(r: &MySqlRow) -> Visita {
    Visita {
        id: r.get("id"),
        id_orden: r.get("id_orden"),
        inicio: r.get("inicio"),
        duracion_minutos: r.get("duracion_minutos"),
        actividades: r.get("actividades"),
        cerrada: r.get("cerrada"),
        cierre: r.get("cierre"),
    }
}

/// Visits of one order, earliest first.
pub(crate) async fn fetch_for_orden(pool: &MySqlPool, id_orden: i64) -> Result<Vec<Visita>> {
    let sql = format!("{} WHERE id_orden = ? ORDER BY inicio, id", SELECT);
    let rows = sqlx::query(&sql)
        .bind(id_orden)
        .fetch_all(pool)
        .await
        .map_err(Error::Database)?;
    Ok(rows.iter().map(map_visita).collect())
}

/// Closing notes are appended under a timestamp line; earlier notes are kept.
pub fn append_notes(existing: Option<&str>, text: &str, at: DateTime<Utc>) -> String {
    let entry = format!("[{}] {}", at.format("%Y-%m-%d %H:%M"), text.trim());
    match existing.map(str::trim_end) {
        Some(prev) if !prev.is_empty() => format!("{}\n{}", prev, entry),
        _ => entry,
    }
}

#[async_trait]
impl VisitaRepository for MySqlVisitaRepository {
    async fn schedule(&self, id_orden: i64, req: CreateVisitaRequest) -> Result<Visita> {
        let estado: i32 = sqlx::query_scalar("SELECT id_estado FROM ordenes WHERE id = ?")
            .bind(id_orden)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::not_found("Orden", id_orden))?;
        let estado = OrdenEstado::try_from(estado)?;
        if matches!(estado, OrdenEstado::Cerrada | OrdenEstado::Anulada) {
            return Err(Error::Conflict(format!(
                "la orden {} está {}",
                id_orden,
                estado.nombre()
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO visitas (id_orden, inicio, duracion_minutos, actividades, cerrada)
            VALUES (?, ?, ?, ?, FALSE)
            "#,
        )
        .bind(id_orden)
        .bind(req.inicio)
        .bind(req.duracion_minutos)
        .bind(req.actividades.as_deref().map(str::trim))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        let id = result.last_insert_id() as i64;

        info!(
            subsystem = "db",
            component = "visitas",
            op = "schedule",
            entity_id = id,
            id_orden,
            "Visit scheduled"
        );

        self.get(id)
            .await?
            .ok_or_else(|| Error::not_found("Visita", id))
    }

    async fn get(&self, id: i64) -> Result<Option<Visita>> {
        let sql = format!("{} WHERE id = ?", SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_visita))
    }

    async fn close(&self, id: i64, actividades: &str) -> Result<Visita> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query("SELECT cerrada, actividades FROM visitas WHERE id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::not_found("Visita", id))?;
        let cerrada: bool = row.get("cerrada");
        if cerrada {
            return Err(Error::Conflict(format!("la visita {} ya está cerrada", id)));
        }
        let existing: Option<String> = row.get("actividades");

        let now = Utc::now();
        let notes = append_notes(existing.as_deref(), actividades, now);
        sqlx::query(
            r#"
            UPDATE visitas
            SET actividades = ?, cerrada = TRUE, cierre = ?
            WHERE id = ? AND cerrada = FALSE
            "#,
        )
        .bind(&notes)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "visitas",
            op = "close",
            entity_id = id,
            "Visit closed"
        );

        self.get(id)
            .await?
            .ok_or_else(|| Error::not_found("Visita", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_append_notes_to_empty() {
        assert_eq!(
            append_notes(None, "cambio de filtro", at()),
            "[2026-10-16 09:30] cambio de filtro"
        );
        assert_eq!(
            append_notes(Some("  "), "cambio de filtro", at()),
            "[2026-10-16 09:30] cambio de filtro"
        );
    }

    #[test]
    fn test_append_notes_keeps_previous_text() {
        let notes = append_notes(Some("revisión inicial\n"), " ajuste de correa ", at());
        assert_eq!(notes, "revisión inicial\n[2026-10-16 09:30] ajuste de correa");
        assert!(notes.starts_with("revisión inicial"));
    }
}
