//! Reference catalog handlers (generales).
//!
//! Reads go through [`CatalogService`](crate::services::CatalogService) and
//! may be served from cache; writes clear it.

use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use mantis_core::{
    Cliente, CreateClienteRequest, CreateEquipoRequest, Entidad, Equipo, EstadoCatalogo,
};

use crate::envelope::{ApiResponse, CreatedId};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EquiposQuery {
    pub id_cliente: Option<String>,
}

impl EquiposQuery {
    fn id_cliente(&self) -> Result<Option<i64>, ApiError> {
        match self.id_cliente.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
                ApiError::BadRequest(format!("id_cliente inválido: '{}'", raw))
            }),
        }
    }
}

pub async fn list_clientes(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Cliente>>, ApiError> {
    Ok(ApiResponse::ok(state.catalog.clientes().await?))
}

/// Equipment, optionally restricted to one client with `?id_cliente=`.
pub async fn list_equipos(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EquiposQuery>,
) -> Result<ApiResponse<Vec<Equipo>>, ApiError> {
    let id_cliente = query.id_cliente()?;
    Ok(ApiResponse::ok(state.catalog.equipos(id_cliente).await?))
}

/// Status catalog for `cotizaciones`, `solicitudes`, `baja` or `ordenes`.
pub async fn list_estados(
    State(state): State<AppState>,
    ApiPath(entidad): ApiPath<String>,
) -> Result<ApiResponse<Vec<EstadoCatalogo>>, ApiError> {
    let entidad: Entidad = entidad.parse()?;
    Ok(ApiResponse::ok(state.catalog.estados(entidad).await?))
}

pub async fn create_cliente(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateClienteRequest>,
) -> Result<(StatusCode, ApiResponse<CreatedId>), ApiError> {
    req.validate()?;
    let id = state.catalog.create_cliente(req).await?;
    Ok(ApiResponse::ok(CreatedId { id })
        .with_message("Cliente creado")
        .created())
}

/// # Returns
/// - 201 Created with `{ id }`
/// - 404 Not Found if the client doesn't exist
pub async fn create_equipo(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateEquipoRequest>,
) -> Result<(StatusCode, ApiResponse<CreatedId>), ApiError> {
    req.validate()?;
    let id = state.catalog.create_equipo(req).await?;
    Ok(ApiResponse::ok(CreatedId { id })
        .with_message("Equipo creado")
        .created())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: Option<&str>) -> EquiposQuery {
        EquiposQuery {
            id_cliente: raw.map(String::from),
        }
    }

    #[test]
    fn test_equipos_query_absent_or_blank_is_none() {
        assert_eq!(query(None).id_cliente().unwrap(), None);
        assert_eq!(query(Some("  ")).id_cliente().unwrap(), None);
    }

    #[test]
    fn test_equipos_query_parses_id() {
        assert_eq!(query(Some("7")).id_cliente().unwrap(), Some(7));
    }

    #[test]
    fn test_equipos_query_rejects_garbage() {
        let err = query(Some("abc")).id_cliente().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("id_cliente")));
    }
}
