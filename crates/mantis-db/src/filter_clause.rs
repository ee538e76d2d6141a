//! Filter clause builder for list endpoints.
//!
//! Converts a validated [`ListFilter`] into a SQL `WHERE` fragment with `?`
//! placeholders and the matching ordered parameter list. The fragment always
//! starts with the base predicate `1=1`, so callers can splice it after
//! `WHERE` whether or not any filter is present.
//!
//! Predicates are appended in a fixed order: status, client, date-from,
//! date-to, free text. The same parameter list is bound unchanged to both
//! the `COUNT(*)` query and the page query; `LIMIT`/`OFFSET` are bound after
//! it, never before.

use chrono::NaiveDate;

use mantis_core::ListFilter;

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// 32-bit integer (status ids).
    Int(i32),
    /// 64-bit integer (row ids).
    BigInt(i64),
    /// Calendar date.
    Date(NaiveDate),
    /// Text (LIKE patterns).
    Text(String),
}

/// Binds every [`QueryParam`] in order onto a `sqlx::query` or
/// `sqlx::query_scalar` builder.
#[macro_export]
macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut q = $query;
        for param in $params.iter() {
            q = match param {
                $crate::filter_clause::QueryParam::Int(v) => q.bind(*v),
                $crate::filter_clause::QueryParam::BigInt(v) => q.bind(*v),
                $crate::filter_clause::QueryParam::Date(d) => q.bind(*d),
                $crate::filter_clause::QueryParam::Text(s) => q.bind(s.as_str()),
            };
        }
        q
    }};
}

/// Column layout of a listable resource.
///
/// Adding a resource to the list/stats machinery means declaring one of
/// these, not writing another controller.
#[derive(Debug, Clone, Copy)]
pub struct ResourceColumns {
    /// Main table.
    pub table: &'static str,
    /// Alias used for the main table in every query.
    pub alias: &'static str,
    /// Status id column.
    pub estado: &'static str,
    /// Status catalog table (`id`, `nombre`).
    pub estados_table: &'static str,
    /// Client id column.
    pub cliente: &'static str,
    /// Creation timestamp column.
    pub fecha: &'static str,
    /// Two text columns matched by `buscar`.
    pub search: [&'static str; 2],
}

/// A built `WHERE` fragment and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    /// Predicate text, always starting with `1=1`.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<QueryParam>,
}

impl FilterClause {
    /// The match-everything clause.
    pub fn all() -> Self {
        Self {
            sql: "1=1".to_string(),
            params: Vec::new(),
        }
    }

    /// Append one more predicate with its parameters.
    pub fn and(mut self, predicate: &str, params: impl IntoIterator<Item = QueryParam>) -> Self {
        self.sql.push_str(" AND ");
        self.sql.push_str(predicate);
        self.params.extend(params);
        self
    }
}

/// Generates filter clauses for one resource.
pub struct FilterClauseBuilder<'a> {
    columns: &'a ResourceColumns,
}

impl<'a> FilterClauseBuilder<'a> {
    pub fn new(columns: &'a ResourceColumns) -> Self {
        Self { columns }
    }

    /// Build the clause for `filter`.
    ///
    /// An empty filter yields `("1=1", [])`.
    pub fn build(&self, filter: &ListFilter) -> FilterClause {
        let c = self.columns;
        let mut clause = FilterClause::all();

        if let Some(estado) = filter.id_estado {
            clause = clause.and(&format!("{} = ?", c.estado), [QueryParam::Int(estado)]);
        }
        if let Some(cliente) = filter.id_cliente {
            clause = clause.and(&format!("{} = ?", c.cliente), [QueryParam::BigInt(cliente)]);
        }
        if let Some(desde) = filter.fecha_desde {
            clause = clause.and(&format!("DATE({}) >= ?", c.fecha), [QueryParam::Date(desde)]);
        }
        if let Some(hasta) = filter.fecha_hasta {
            clause = clause.and(&format!("DATE({}) <= ?", c.fecha), [QueryParam::Date(hasta)]);
        }
        if let Some(term) = filter.buscar.as_deref() {
            let pattern = format!("%{}%", escape_like(term));
            clause = clause.and(
                &format!("({} LIKE ? OR {} LIKE ?)", c.search[0], c.search[1]),
                [QueryParam::Text(pattern.clone()), QueryParam::Text(pattern)],
            );
        }

        clause
    }
}

/// Escape LIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLS: ResourceColumns = ResourceColumns {
        table: "cotizaciones",
        alias: "c",
        estado: "c.id_estado",
        estados_table: "cotizaciones_estados",
        cliente: "c.id_cliente",
        fecha: "c.creacion",
        search: ["c.titulo", "c.mensaje"],
    };

    fn build(filter: &ListFilter) -> FilterClause {
        FilterClauseBuilder::new(&COLS).build(filter)
    }

    #[test]
    fn test_empty_filter_is_base_predicate() {
        let clause = build(&ListFilter::default());
        assert_eq!(clause.sql, "1=1");
        assert!(clause.params.is_empty());
    }

    #[test]
    fn test_estado_and_search_param_order() {
        let filter = ListFilter {
            id_estado: Some(2),
            buscar: Some("foo".into()),
            ..ListFilter::default()
        };
        let clause = build(&filter);
        assert_eq!(
            clause.params,
            vec![
                QueryParam::Int(2),
                QueryParam::Text("%foo%".into()),
                QueryParam::Text("%foo%".into()),
            ]
        );
        assert_eq!(
            clause.sql,
            "1=1 AND c.id_estado = ? AND (c.titulo LIKE ? OR c.mensaje LIKE ?)"
        );
    }

    #[test]
    fn test_all_filters_keep_fixed_order() {
        let desde = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let hasta = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let filter = ListFilter {
            id_estado: Some(1),
            id_cliente: Some(7),
            fecha_desde: Some(desde),
            fecha_hasta: Some(hasta),
            buscar: Some("bomba".into()),
        };
        let clause = build(&filter);
        assert_eq!(
            clause.params,
            vec![
                QueryParam::Int(1),
                QueryParam::BigInt(7),
                QueryParam::Date(desde),
                QueryParam::Date(hasta),
                QueryParam::Text("%bomba%".into()),
                QueryParam::Text("%bomba%".into()),
            ]
        );
        assert_eq!(clause.sql.matches('?').count(), clause.params.len());
        assert!(clause.sql.starts_with("1=1 AND c.id_estado = ? AND c.id_cliente = ?"));
    }

    #[test]
    fn test_zero_client_id_is_filtered() {
        let filter = ListFilter {
            id_cliente: Some(0),
            ..ListFilter::default()
        };
        let clause = build(&filter);
        assert_eq!(clause.params, vec![QueryParam::BigInt(0)]);
    }

    #[test]
    fn test_search_term_wildcards_are_escaped() {
        let filter = ListFilter {
            buscar: Some("50%_off\\".into()),
            ..ListFilter::default()
        };
        let clause = build(&filter);
        assert_eq!(
            clause.params[0],
            QueryParam::Text("%50\\%\\_off\\\\%".into())
        );
    }

    #[test]
    fn test_and_appends_predicates() {
        let clause = FilterClause::all().and("x.a = ?", [QueryParam::Int(1)]);
        assert_eq!(clause.sql, "1=1 AND x.a = ?");
        assert_eq!(clause.params, vec![QueryParam::Int(1)]);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("a%b"), "a\\%b");
        assert_eq!(escape_like("a_b"), "a\\_b");
    }
}
