//! Paginated listing: one `COUNT(*)` and one page query under the same
//! filter clause.
//!
//! The two queries run back to back without a transaction, so a concurrent
//! insert can skew the total against the page by a row.

use std::time::Instant;

use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::MySql;
use tracing::debug;

use mantis_core::{Error, Page, Paged, Result};

use crate::bind_params;
use crate::filter_clause::FilterClause;

/// Shape of a list query for one resource.
#[derive(Debug, Clone, Copy)]
pub struct ListQuery<'a> {
    /// Resource name for logs.
    pub component: &'a str,
    /// Column list of the page query.
    pub select: &'a str,
    /// `FROM` clause including joins; must not filter rows (joins are LEFT).
    pub from: &'a str,
    /// `ORDER BY` expression.
    pub order_by: &'a str,
}

impl<'a> ListQuery<'a> {
    /// `SELECT COUNT(*) FROM ... WHERE <clause>`.
    pub fn count_sql(&self, clause: &FilterClause) -> String {
        format!("SELECT COUNT(*) FROM {} WHERE {}", self.from, clause.sql)
    }

    /// `SELECT ... WHERE <clause> ORDER BY ... LIMIT ? OFFSET ?`.
    pub fn page_sql(&self, clause: &FilterClause) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            self.select, self.from, clause.sql, self.order_by
        )
    }

    /// Run the count and the page query and map rows with `map`.
    pub async fn fetch<T>(
        &self,
        pool: &MySqlPool,
        clause: &FilterClause,
        page: Page,
        map: impl Fn(&MySqlRow) -> T,
    ) -> Result<Paged<T>> {
        let start = Instant::now();

        let count_sql = self.count_sql(clause);
        let total: i64 = bind_params!(sqlx::query_scalar::<MySql, i64>(&count_sql), clause.params)
            .fetch_one(pool)
            .await
            .map_err(Error::Database)?;

        let page_sql = self.page_sql(clause);
        let rows = bind_params!(sqlx::query::<MySql>(&page_sql), clause.params)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = self.component,
            op = "list",
            param_count = clause.params.len(),
            total_count = total,
            result_count = rows.len(),
            page = page.page,
            limit = page.limit,
            duration_ms = start.elapsed().as_millis() as u64,
            "Listed page"
        );

        Ok(Paged {
            items: rows.iter().map(map).collect(),
            pagination: page.meta(total),
        })
    }
}
