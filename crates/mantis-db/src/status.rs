//! Guarded status transitions shared by the repositories.
//!
//! A status change is an existence probe followed by an `UPDATE` that only
//! matches if the status is still the one the probe saw. A missing row is
//! `NotFound`; a row whose status moved in between is `Conflict`.

use chrono::Utc;
use sqlx::{Executor, MySql};
use tracing::info;

use mantis_core::{Error, Result};

/// Current status of row `id` in `table`, or `None` if the row is absent.
pub async fn current_estado<'e, E>(executor: E, table: &str, id: i64) -> Result<Option<i32>>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("SELECT id_estado FROM {} WHERE id = ?", table);
    sqlx::query_scalar::<MySql, i32>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(Error::Database)
}

/// Move row `id` from `expected` to `estado`, stamping `cambio_estado`.
///
/// When `observacion` is `Some`, it replaces the stored observation.
pub async fn update_estado<'e, E>(
    executor: E,
    table: &str,
    id: i64,
    expected: i32,
    estado: i32,
    observacion: Option<&str>,
) -> Result<()>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!(
        "UPDATE {} SET id_estado = ?, cambio_estado = ?, observacion = COALESCE(?, observacion) \
         WHERE id = ? AND id_estado = ?",
        table
    );
    let result = sqlx::query::<MySql>(&sql)
        .bind(estado)
        .bind(Utc::now())
        .bind(observacion)
        .bind(id)
        .bind(expected)
        .execute(executor)
        .await
        .map_err(Error::Database)?;

    if result.rows_affected() == 0 {
        return Err(Error::Conflict(format!(
            "el estado de {} {} cambió durante la actualización",
            table, id
        )));
    }

    info!(
        subsystem = "db",
        component = table,
        op = "change_estado",
        entity_id = id,
        id_estado = estado,
        previous = expected,
        "Status changed"
    );
    Ok(())
}
