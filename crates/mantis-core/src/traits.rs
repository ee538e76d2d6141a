//! Repository traits implemented by the database layer.

use async_trait::async_trait;

use crate::error::Result;
use crate::filters::ListFilter;
use crate::models::*;
use crate::paging::{Page, Paged};

// =============================================================================
// COTIZACIONES
// =============================================================================

/// Repository for quotations.
#[async_trait]
pub trait CotizacionRepository: Send + Sync {
    /// Filtered page of quotations, newest first.
    async fn list(&self, filter: &ListFilter, page: Page) -> Result<Paged<Cotizacion>>;

    /// Quotation with its line items.
    async fn get(&self, id: i64) -> Result<Option<CotizacionDetalle>>;

    /// Create a pending quotation with its line items; returns the new id.
    async fn create(&self, req: CreateCotizacionRequest) -> Result<i64>;

    /// Change status, stamp `cambio_estado` and store the observation.
    async fn change_estado(
        &self,
        id: i64,
        estado: CotizacionEstado,
        observacion: Option<&str>,
    ) -> Result<Cotizacion>;

    /// Counts per status over the whole table.
    async fn count_by_estado(&self) -> Result<Vec<GroupCount>>;

    /// Status counts, trailing monthly counts and totals.
    async fn stats(&self) -> Result<CotizacionStats>;
}

// =============================================================================
// SOLICITUDES
// =============================================================================

/// Repository for service requests.
#[async_trait]
pub trait SolicitudRepository: Send + Sync {
    async fn list(&self, filter: &ListFilter, page: Page) -> Result<Paged<Solicitud>>;

    async fn get(&self, id: i64) -> Result<Option<Solicitud>>;

    /// Create a pending request; the client (and equipment, if given) must exist.
    async fn create(&self, req: CreateSolicitudRequest) -> Result<i64>;

    async fn count_by_estado(&self) -> Result<Vec<GroupCount>>;
}

/// Dashboard aggregates across every table.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn stats(&self) -> Result<DashboardStats>;
}

// =============================================================================
// SOLICITUDES DE BAJA
// =============================================================================

/// Repository for decommission requests.
#[async_trait]
pub trait SolicitudBajaRepository: Send + Sync {
    async fn list(&self, filter: &ListFilter, page: Page) -> Result<Paged<SolicitudBaja>>;

    async fn get(&self, id: i64) -> Result<Option<SolicitudBaja>>;

    /// Create a pending request for existing equipment; the client is taken
    /// from the equipment.
    async fn create(&self, req: CreateSolicitudBajaRequest) -> Result<i64>;

    async fn change_estado(
        &self,
        id: i64,
        estado: BajaEstado,
        observacion: Option<&str>,
    ) -> Result<SolicitudBaja>;

    async fn count_by_estado(&self) -> Result<Vec<GroupCount>>;

    async fn stats(&self) -> Result<BajaStats>;
}

// =============================================================================
// ORDENES / VISITAS
// =============================================================================

/// Repository for work orders and their change log.
#[async_trait]
pub trait OrdenRepository: Send + Sync {
    async fn list(&self, filter: &ListFilter, page: Page) -> Result<Paged<Orden>>;

    /// Order with its change log (oldest first) and visits.
    async fn get(&self, id: i64) -> Result<Option<OrdenDetalle>>;

    /// Open an order for an existing request, log the first change and move
    /// the request to `en_proceso`.
    async fn create(&self, req: CreateOrdenRequest) -> Result<i64>;

    /// Change status and append a change-log entry.
    async fn change_estado(
        &self,
        id: i64,
        estado: OrdenEstado,
        usuario: &str,
        descripcion: Option<&str>,
    ) -> Result<Orden>;

    async fn count_by_estado(&self) -> Result<Vec<GroupCount>>;
}

/// Repository for visits.
#[async_trait]
pub trait VisitaRepository: Send + Sync {
    /// Schedule a visit for an existing order.
    async fn schedule(&self, id_orden: i64, req: CreateVisitaRequest) -> Result<Visita>;

    async fn get(&self, id: i64) -> Result<Option<Visita>>;

    /// Append closing notes and mark the visit closed.
    async fn close(&self, id: i64, actividades: &str) -> Result<Visita>;
}

// =============================================================================
// CATALOGS
// =============================================================================

/// Read/write access to the reference catalogs (generales).
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_clientes(&self) -> Result<Vec<Cliente>>;

    async fn list_equipos(&self, id_cliente: Option<i64>) -> Result<Vec<Equipo>>;

    async fn list_estados(&self, entidad: Entidad) -> Result<Vec<EstadoCatalogo>>;

    async fn create_cliente(&self, req: CreateClienteRequest) -> Result<i64>;

    async fn create_equipo(&self, req: CreateEquipoRequest) -> Result<i64>;
}
