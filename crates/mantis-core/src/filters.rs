//! Typed list filters parsed from raw query strings.
//!
//! Every list endpoint accepts the same optional parameters. They arrive as
//! strings and are validated here, before any SQL is built: a malformed
//! number or date is an [`Error::InvalidInput`] naming the parameter rather
//! than a bound value that silently matches nothing.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::defaults;
use crate::error::{Error, Result};
use crate::paging::Page;

/// Raw list query as it arrives on the wire.
///
/// All fields are strings so that deserialization never rejects the request;
/// validation happens in [`ListFilter::parse`] with field-specific messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub id_estado: Option<String>,
    pub id_cliente: Option<String>,
    pub fecha_desde: Option<String>,
    pub fecha_hasta: Option<String>,
    pub buscar: Option<String>,
}

impl RawListQuery {
    /// Resolve pagination and validate filters in one step.
    pub fn into_parts(self) -> Result<(ListFilter, Page)> {
        let page = Page::resolve(self.page.as_deref(), self.limit.as_deref());
        let filter = ListFilter::parse(&self)?;
        Ok((filter, page))
    }
}

/// Validated filter set shared by all list endpoints.
///
/// `None` means "not supplied". A supplied `0` is kept: zero is a value, not
/// absence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub id_estado: Option<i32>,
    pub id_cliente: Option<i64>,
    pub fecha_desde: Option<NaiveDate>,
    pub fecha_hasta: Option<NaiveDate>,
    pub buscar: Option<String>,
}

impl ListFilter {
    /// Validate the filter fields of a raw query.
    pub fn parse(raw: &RawListQuery) -> Result<Self> {
        let filter = Self {
            id_estado: parse_opt(raw.id_estado.as_deref(), "id_estado", parse_i32)?,
            id_cliente: parse_opt(raw.id_cliente.as_deref(), "id_cliente", parse_i64)?,
            fecha_desde: parse_opt(raw.fecha_desde.as_deref(), "fecha_desde", parse_date)?,
            fecha_hasta: parse_opt(raw.fecha_hasta.as_deref(), "fecha_hasta", parse_date)?,
            buscar: parse_search(raw.buscar.as_deref())?,
        };

        if let (Some(desde), Some(hasta)) = (filter.fecha_desde, filter.fecha_hasta) {
            if desde > hasta {
                return Err(Error::InvalidInput(
                    "fecha_desde no puede ser posterior a fecha_hasta".to_string(),
                ));
            }
        }

        Ok(filter)
    }

    /// True when no filter was supplied.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Filter on status only.
    pub fn by_estado(id_estado: i32) -> Self {
        Self {
            id_estado: Some(id_estado),
            ..Self::default()
        }
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt<T>(
    raw: Option<&str>,
    field: &str,
    parse: fn(&str, &str) -> Result<T>,
) -> Result<Option<T>> {
    present(raw).map(|s| parse(s, field)).transpose()
}

fn parse_i32(s: &str, field: &str) -> Result<i32> {
    s.parse::<i32>()
        .map_err(|_| Error::InvalidInput(format!("{} debe ser un número entero", field)))
}

fn parse_i64(s: &str, field: &str) -> Result<i64> {
    s.parse::<i64>()
        .map_err(|_| Error::InvalidInput(format!("{} debe ser un número entero", field)))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part is kept).
fn parse_date(s: &str, field: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|_| {
            Error::InvalidInput(format!(
                "{} debe tener formato AAAA-MM-DD (recibido '{}')",
                field, s
            ))
        })
}

fn parse_search(raw: Option<&str>) -> Result<Option<String>> {
    match present(raw) {
        None => Ok(None),
        Some(term) if term.chars().count() > defaults::SEARCH_TERM_MAX_LEN => {
            Err(Error::InvalidInput(format!(
                "buscar no puede superar {} caracteres",
                defaults::SEARCH_TERM_MAX_LEN
            )))
        }
        Some(term) => Ok(Some(term.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawListQuery {
        RawListQuery::default()
    }

    #[test]
    fn test_empty_query_is_empty_filter() {
        let filter = ListFilter::parse(&raw()).unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn test_blank_values_are_absent() {
        let q = RawListQuery {
            id_estado: Some("".into()),
            id_cliente: Some("   ".into()),
            buscar: Some(" ".into()),
            ..raw()
        };
        assert!(ListFilter::parse(&q).unwrap().is_empty());
    }

    #[test]
    fn test_zero_is_a_present_value() {
        let q = RawListQuery {
            id_cliente: Some("0".into()),
            ..raw()
        };
        assert_eq!(ListFilter::parse(&q).unwrap().id_cliente, Some(0));
    }

    #[test]
    fn test_malformed_estado_names_the_field() {
        let q = RawListQuery {
            id_estado: Some("dos".into()),
            ..raw()
        };
        let err = ListFilter::parse(&q).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m.contains("id_estado")));
    }

    #[test]
    fn test_malformed_cliente_names_the_field() {
        let q = RawListQuery {
            id_cliente: Some("12abc".into()),
            ..raw()
        };
        let err = ListFilter::parse(&q).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m.contains("id_cliente")));
    }

    #[test]
    fn test_dates_parse_both_formats() {
        let q = RawListQuery {
            fecha_desde: Some("2026-01-15".into()),
            fecha_hasta: Some("2026-02-01T10:30:00Z".into()),
            ..raw()
        };
        let filter = ListFilter::parse(&q).unwrap();
        assert_eq!(filter.fecha_desde, NaiveDate::from_ymd_opt(2026, 1, 15));
        assert_eq!(filter.fecha_hasta, NaiveDate::from_ymd_opt(2026, 2, 1));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let q = RawListQuery {
            fecha_hasta: Some("15/01/2026".into()),
            ..raw()
        };
        let err = ListFilter::parse(&q).unwrap_err();
        assert!(err.to_string().contains("fecha_hasta"));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let q = RawListQuery {
            fecha_desde: Some("2026-03-01".into()),
            fecha_hasta: Some("2026-02-01".into()),
            ..raw()
        };
        assert!(matches!(
            ListFilter::parse(&q),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_search_is_trimmed_and_bounded() {
        let q = RawListQuery {
            buscar: Some("  bomba  ".into()),
            ..raw()
        };
        assert_eq!(ListFilter::parse(&q).unwrap().buscar.as_deref(), Some("bomba"));

        let q = RawListQuery {
            buscar: Some("x".repeat(defaults::SEARCH_TERM_MAX_LEN + 1)),
            ..raw()
        };
        assert!(ListFilter::parse(&q).is_err());
    }

    #[test]
    fn test_into_parts_resolves_page_leniently() {
        let q = RawListQuery {
            page: Some("abc".into()),
            limit: Some("500".into()),
            id_estado: Some("2".into()),
            ..raw()
        };
        let (filter, page) = q.into_parts().unwrap();
        assert_eq!(filter, ListFilter::by_estado(2));
        assert_eq!(page, Page { page: 1, limit: 100 });
    }
}
