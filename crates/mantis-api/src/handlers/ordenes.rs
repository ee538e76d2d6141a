//! Work order and visit handlers.

use axum::extract::State;
use axum::http::StatusCode;

use mantis_core::{
    ChangeOrdenEstadoRequest, CloseVisitaRequest, CreateOrdenRequest, CreateVisitaRequest, Error,
    ListWithStats, Orden, OrdenDetalle, OrdenRepository, RawListQuery, Visita, VisitaRepository,
};

use crate::envelope::{ApiResponse, CreatedId};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

pub async fn list_ordenes(
    State(state): State<AppState>,
    ApiQuery(raw): ApiQuery<RawListQuery>,
) -> Result<ApiResponse<ListWithStats<Orden>>, ApiError> {
    let (filter, page) = raw.into_parts()?;
    let paged = state.db.ordenes.list(&filter, page).await?;
    let stats = state.db.ordenes.count_by_estado().await?;
    Ok(ApiResponse::ok(ListWithStats {
        items: paged.items,
        pagination: paged.pagination,
        stats,
    }))
}

/// Order with its change log and visits.
pub async fn get_orden(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<OrdenDetalle>, ApiError> {
    let orden = state
        .db
        .ordenes
        .get(id)
        .await?
        .ok_or_else(|| Error::not_found("Orden", id))?;
    Ok(ApiResponse::ok(orden))
}

/// Open a work order for a service request.
///
/// # Returns
/// - 201 Created with `{ id }`
/// - 404 Not Found if the request doesn't exist
/// - 409 Conflict if the request is already completed or cancelled
pub async fn create_orden(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateOrdenRequest>,
) -> Result<(StatusCode, ApiResponse<CreatedId>), ApiError> {
    req.validate()?;
    let id = state.db.ordenes.create(req).await?;
    Ok(ApiResponse::ok(CreatedId { id })
        .with_message("Orden creada")
        .created())
}

/// Move an order to another status and log the change.
///
/// # Returns
/// - 200 OK with the updated order
/// - 400 Bad Request if `id_estado` is not 1..=4 or `usuario` is missing
/// - 404 Not Found if the order doesn't exist
/// - 409 Conflict if the order is closed or annulled, or changed concurrently
pub async fn change_orden_estado(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ChangeOrdenEstadoRequest>,
) -> Result<ApiResponse<Orden>, ApiError> {
    let estado = req.validate()?;
    let updated = state
        .db
        .ordenes
        .change_estado(id, estado, req.usuario.trim(), req.descripcion.as_deref())
        .await?;
    Ok(ApiResponse::ok(updated).with_message(format!("Estado actualizado a {}", estado)))
}

pub async fn schedule_visita(
    State(state): State<AppState>,
    ApiPath(id_orden): ApiPath<i64>,
    ApiJson(req): ApiJson<CreateVisitaRequest>,
) -> Result<(StatusCode, ApiResponse<Visita>), ApiError> {
    req.validate()?;
    let visita = state.db.visitas.schedule(id_orden, req).await?;
    Ok(ApiResponse::ok(visita)
        .with_message("Visita programada")
        .created())
}

/// Close a visit, appending the closing notes to its activities.
///
/// # Returns
/// - 200 OK with the closed visit
/// - 404 Not Found if the visit doesn't exist
/// - 409 Conflict if it is already closed
pub async fn close_visita(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<CloseVisitaRequest>,
) -> Result<ApiResponse<Visita>, ApiError> {
    req.validate()?;
    let visita = state.db.visitas.close(id, &req.actividades).await?;
    Ok(ApiResponse::ok(visita).with_message("Visita cerrada"))
}
