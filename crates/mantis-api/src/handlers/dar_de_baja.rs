//! Decommission request handlers.

use axum::extract::State;
use axum::http::StatusCode;

use mantis_core::{
    BajaEstado, BajaStats, ChangeEstadoRequest, CreateSolicitudBajaRequest, Error,
    ListWithStats, RawListQuery, SolicitudBaja, SolicitudBajaRepository,
};

use crate::envelope::{ApiResponse, CreatedId};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

pub async fn baja_stats(State(state): State<AppState>) -> Result<ApiResponse<BajaStats>, ApiError> {
    let stats = state.db.solicitudes_baja.stats().await?;
    Ok(ApiResponse::ok(stats))
}

pub async fn list_bajas(
    State(state): State<AppState>,
    ApiQuery(raw): ApiQuery<RawListQuery>,
) -> Result<ApiResponse<ListWithStats<SolicitudBaja>>, ApiError> {
    let (filter, page) = raw.into_parts()?;
    let paged = state.db.solicitudes_baja.list(&filter, page).await?;
    let stats = state.db.solicitudes_baja.count_by_estado().await?;
    Ok(ApiResponse::ok(ListWithStats {
        items: paged.items,
        pagination: paged.pagination,
        stats,
    }))
}

pub async fn get_baja(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<SolicitudBaja>, ApiError> {
    let baja = state
        .db
        .solicitudes_baja
        .get(id)
        .await?
        .ok_or_else(|| Error::not_found("Solicitud de baja", id))?;
    Ok(ApiResponse::ok(baja))
}

/// Request decommissioning of a piece of equipment. The client is taken
/// from the equipment record.
pub async fn create_baja(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateSolicitudBajaRequest>,
) -> Result<(StatusCode, ApiResponse<CreatedId>), ApiError> {
    req.validate()?;
    let id = state.db.solicitudes_baja.create(req).await?;
    Ok(ApiResponse::ok(CreatedId { id })
        .with_message("Solicitud de baja registrada")
        .created())
}

/// Approve or reject a decommission request.
pub async fn change_baja_estado(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ChangeEstadoRequest>,
) -> Result<ApiResponse<SolicitudBaja>, ApiError> {
    let estado: BajaEstado = req.validate()?;
    let updated = state
        .db
        .solicitudes_baja
        .change_estado(id, estado, req.observacion.as_deref())
        .await?;
    Ok(ApiResponse::ok(updated).with_message(format!("Estado actualizado a {}", estado)))
}
