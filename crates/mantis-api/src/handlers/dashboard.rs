//! Dashboard and service request handlers.

use axum::extract::State;
use axum::http::StatusCode;

use mantis_core::{
    CreateSolicitudRequest, DashboardRepository, DashboardStats, Error, ListWithStats,
    RawListQuery, Solicitud, SolicitudRepository,
};

use crate::envelope::{ApiResponse, CreatedId};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

/// Totals and breakdowns across every table.
pub async fn dashboard_stats(
    State(state): State<AppState>,
) -> Result<ApiResponse<DashboardStats>, ApiError> {
    let stats = state.db.dashboard.stats().await?;
    Ok(ApiResponse::ok(stats))
}

/// Paginated, filtered service requests.
pub async fn list_solicitudes(
    State(state): State<AppState>,
    ApiQuery(raw): ApiQuery<RawListQuery>,
) -> Result<ApiResponse<ListWithStats<Solicitud>>, ApiError> {
    let (filter, page) = raw.into_parts()?;
    let paged = state.db.solicitudes.list(&filter, page).await?;
    let stats = state.db.solicitudes.count_by_estado().await?;
    Ok(ApiResponse::ok(ListWithStats {
        items: paged.items,
        pagination: paged.pagination,
        stats,
    }))
}

pub async fn get_solicitud(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Solicitud>, ApiError> {
    let solicitud = state
        .db
        .solicitudes
        .get(id)
        .await?
        .ok_or_else(|| Error::not_found("Solicitud", id))?;
    Ok(ApiResponse::ok(solicitud))
}

/// Register a service request.
///
/// # Returns
/// - 201 Created with `{ id }`
/// - 400 Bad Request if validation fails or the equipment belongs to
///   another client
/// - 404 Not Found if the client or equipment doesn't exist
pub async fn create_solicitud(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateSolicitudRequest>,
) -> Result<(StatusCode, ApiResponse<CreatedId>), ApiError> {
    req.validate()?;
    let id = state.db.solicitudes.create(req).await?;
    Ok(ApiResponse::ok(CreatedId { id })
        .with_message("Solicitud registrada")
        .created())
}
