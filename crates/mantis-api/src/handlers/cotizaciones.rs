//! Quotation HTTP handlers.
//!
//! Filtered listing with a status breakdown, statistics, detail with line
//! items, creation and status changes.

use axum::extract::State;
use axum::http::StatusCode;

use mantis_core::{
    ChangeEstadoRequest, Cotizacion, CotizacionDetalle, CotizacionEstado, CotizacionRepository,
    CotizacionStats, CreateCotizacionRequest, Error, ListWithStats, RawListQuery,
};

use crate::envelope::{ApiResponse, CreatedId};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

/// List quotations.
///
/// # Query Parameters
/// - `page`, `limit`: pagination (lenient, see `Page::resolve`)
/// - `id_estado`, `id_cliente`: exact match
/// - `fecha_desde`, `fecha_hasta`: inclusive `YYYY-MM-DD` bounds on creation
/// - `buscar`: substring of title or client name
///
/// # Returns
/// - 200 OK with `{ items, pagination, stats }`
/// - 400 Bad Request if a filter value is malformed
pub async fn list_cotizaciones(
    State(state): State<AppState>,
    ApiQuery(raw): ApiQuery<RawListQuery>,
) -> Result<ApiResponse<ListWithStats<Cotizacion>>, ApiError> {
    let (filter, page) = raw.into_parts()?;
    let paged = state.db.cotizaciones.list(&filter, page).await?;
    let stats = state.db.cotizaciones.count_by_estado().await?;
    Ok(ApiResponse::ok(ListWithStats {
        items: paged.items,
        pagination: paged.pagination,
        stats,
    }))
}

/// Status counts, trailing monthly counts and money totals.
pub async fn cotizaciones_estadisticas(
    State(state): State<AppState>,
) -> Result<ApiResponse<CotizacionStats>, ApiError> {
    let stats = state.db.cotizaciones.stats().await?;
    Ok(ApiResponse::ok(stats))
}

/// Get one quotation with its parts and extra items.
///
/// # Returns
/// - 200 OK with the quotation
/// - 404 Not Found if it doesn't exist
pub async fn get_cotizacion(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<CotizacionDetalle>, ApiError> {
    let cotizacion = state
        .db
        .cotizaciones
        .get(id)
        .await?
        .ok_or_else(|| Error::not_found("Cotización", id))?;
    Ok(ApiResponse::ok(cotizacion))
}

/// Create a pending quotation.
///
/// # Returns
/// - 201 Created with `{ id }`
/// - 400 Bad Request if validation fails
/// - 404 Not Found if the client doesn't exist
pub async fn create_cotizacion(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateCotizacionRequest>,
) -> Result<(StatusCode, ApiResponse<CreatedId>), ApiError> {
    req.validate()?;
    let id = state.db.cotizaciones.create(req).await?;
    Ok(ApiResponse::ok(CreatedId { id })
        .with_message("Cotización creada")
        .created())
}

/// Change the status of a quotation.
///
/// The requested status is validated before any query runs, so an invalid
/// id leaves the row untouched.
///
/// # Returns
/// - 200 OK with the updated quotation
/// - 400 Bad Request if `id_estado` is missing or not 1, 2 or 3
/// - 404 Not Found if the quotation doesn't exist
/// - 409 Conflict if its status changed concurrently
pub async fn change_cotizacion_estado(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ChangeEstadoRequest>,
) -> Result<ApiResponse<Cotizacion>, ApiError> {
    let estado: CotizacionEstado = req.validate()?;
    let updated = state
        .db
        .cotizaciones
        .change_estado(id, estado, req.observacion.as_deref())
        .await?;
    Ok(ApiResponse::ok(updated).with_message(format!("Estado actualizado a {}", estado)))
}
