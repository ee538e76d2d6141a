//! Grouped statistics.
//!
//! Every breakdown is a `GROUP BY` query returning `(grupo, total)` rows,
//! mapped to [`GroupCount`]. Statistics ignore list pagination filters and
//! are recomputed on every request.

use chrono::{Datelike, Months, NaiveDate, Utc};
use sqlx::mysql::MySqlPool;
use sqlx::{MySql, Row};
use tracing::debug;

use mantis_core::{Error, GroupCount, Result};

use crate::bind_params;
use crate::filter_clause::{FilterClause, ResourceColumns};

/// Counts per status, one row per catalog entry (absent statuses count 0),
/// ordered by status id.
pub fn count_by_estado_sql(cols: &ResourceColumns) -> String {
    format!(
        "SELECT e.nombre AS grupo, COUNT({alias}.id) AS total \
         FROM {estados} e LEFT JOIN {table} {alias} ON {estado} = e.id \
         GROUP BY e.id, e.nombre ORDER BY e.id",
        alias = cols.alias,
        estados = cols.estados_table,
        table = cols.table,
        estado = cols.estado,
    )
}

/// Counts per `YYYY-MM` from a cutoff date, most recent month first.
pub fn count_by_month_sql(cols: &ResourceColumns) -> String {
    format!(
        "SELECT DATE_FORMAT({fecha}, '%Y-%m') AS grupo, COUNT(*) AS total \
         FROM {table} {alias} WHERE {fecha} >= ? \
         GROUP BY grupo ORDER BY grupo DESC",
        fecha = cols.fecha,
        table = cols.table,
        alias = cols.alias,
    )
}

/// Counts per group, largest groups first.
///
/// Rows are grouped by `group_by` and labelled with `label`, so two groups
/// that share a label (e.g. clients with the same name) stay separate.
pub fn count_by_sql(from: &str, group_by: &str, label: &str) -> String {
    format!(
        "SELECT {label} AS grupo, COUNT(*) AS total FROM {from} \
         GROUP BY {group_by} ORDER BY total DESC, grupo LIMIT ?",
        label = label,
        from = from,
        group_by = group_by,
    )
}

/// First day of the month `months - 1` months before `today`'s month, so the
/// window covers exactly `months` calendar months including the current one.
pub fn month_window_start(today: NaiveDate, months: u32) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first
        .checked_sub_months(Months::new(months.saturating_sub(1)))
        .unwrap_or(first)
}

/// Status breakdown for a resource.
pub async fn count_by_estado(pool: &MySqlPool, cols: &ResourceColumns) -> Result<Vec<GroupCount>> {
    let sql = count_by_estado_sql(cols);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .map_err(Error::Database)?;
    let groups = map_groups(&rows);

    debug!(
        subsystem = "db",
        component = "aggregate",
        op = "count_by_estado",
        db_table = cols.table,
        result_count = groups.len(),
        "Counted rows by status"
    );
    Ok(groups)
}

/// Trailing monthly counts for a resource.
pub async fn count_by_month(
    pool: &MySqlPool,
    cols: &ResourceColumns,
    months: u32,
) -> Result<Vec<GroupCount>> {
    let sql = count_by_month_sql(cols);
    let cutoff = month_window_start(Utc::now().date_naive(), months);
    let rows = sqlx::query(&sql)
        .bind(cutoff)
        .fetch_all(pool)
        .await
        .map_err(Error::Database)?;
    let groups = map_groups(&rows);

    debug!(
        subsystem = "db",
        component = "aggregate",
        op = "count_by_month",
        db_table = cols.table,
        months,
        result_count = groups.len(),
        "Counted rows by month"
    );
    Ok(groups)
}

/// Category counts (top `limit` groups).
pub async fn count_by(
    pool: &MySqlPool,
    from: &str,
    group_by: &str,
    label: &str,
    limit: i64,
) -> Result<Vec<GroupCount>> {
    let sql = count_by_sql(from, group_by, label);
    let rows = sqlx::query(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Error::Database)?;
    Ok(map_groups(&rows))
}

/// `COUNT(*)` of a table under a clause.
pub async fn count_rows(pool: &MySqlPool, from: &str, clause: &FilterClause) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", from, clause.sql);
    bind_params!(sqlx::query_scalar::<MySql, i64>(&sql), clause.params)
        .fetch_one(pool)
        .await
        .map_err(Error::Database)
}

fn map_groups(rows: &[sqlx::mysql::MySqlRow]) -> Vec<GroupCount> {
    rows.iter()
        .map(|r| GroupCount::new(r.get::<String, _>("grupo"), r.get::<i64, _>("total")))
        .collect()
}
