//! Domain models: rows, request bodies, status enums and statistics payloads.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::paging::PageMeta;

// =============================================================================
// STATUS ENUMS
// =============================================================================

/// Small-integer status enum stored in an `id_estado` column.
pub trait Estado: Copy + Into<i32> + TryFrom<i32, Error = Error> {
    /// Status catalog table (`<entity>_estados`).
    const CATALOG: &'static str;

    /// Machine name as stored in the catalog.
    fn nombre(self) -> &'static str;

    /// Validate a requested status id coming from a request body.
    fn from_request(id: Option<i32>) -> Result<Self> {
        let id = id.ok_or_else(|| Error::InvalidInput("id_estado es requerido".to_string()))?;
        Self::try_from(id)
    }
}

macro_rules! estado_enum {
    (
        $(#[$meta:meta])*
        $name:ident, catalog = $catalog:literal, valid = $valid:literal,
        { $($variant:ident = $id:literal => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i32", into = "i32")]
        pub enum $name {
            $($variant = $id),+
        }

        impl From<$name> for i32 {
            fn from(e: $name) -> i32 {
                e as i32
            }
        }

        impl TryFrom<i32> for $name {
            type Error = Error;

            fn try_from(id: i32) -> Result<Self> {
                match id {
                    $($id => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!(
                        "id_estado inválido: {} (valores permitidos: {})",
                        other, $valid
                    ))),
                }
            }
        }

        impl Estado for $name {
            const CATALOG: &'static str = $catalog;

            fn nombre(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.nombre())
            }
        }
    };
}

estado_enum! {
    /// Quotation status.
    CotizacionEstado, catalog = "cotizaciones_estados", valid = "1, 2, 3",
    { Pendiente = 1 => "pendiente", Aprobada = 2 => "aprobada", Rechazada = 3 => "rechazada" }
}

estado_enum! {
    /// Service request status.
    SolicitudEstado, catalog = "solicitudes_estados", valid = "1, 2, 3, 4",
    {
        Pendiente = 1 => "pendiente",
        EnProceso = 2 => "en_proceso",
        Completada = 3 => "completada",
        Cancelada = 4 => "cancelada",
    }
}

estado_enum! {
    /// Decommission request status.
    BajaEstado, catalog = "solicitudes_baja_estados", valid = "1, 2, 3",
    { Pendiente = 1 => "pendiente", Aprobada = 2 => "aprobada", Rechazada = 3 => "rechazada" }
}

estado_enum! {
    /// Work order status.
    OrdenEstado, catalog = "ordenes_estados", valid = "1, 2, 3, 4",
    {
        Abierta = 1 => "abierta",
        EnEjecucion = 2 => "en_ejecucion",
        Cerrada = 3 => "cerrada",
        Anulada = 4 => "anulada",
    }
}

/// Entities that own a status catalog, addressable from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entidad {
    Cotizaciones,
    Solicitudes,
    Baja,
    Ordenes,
}

impl Entidad {
    /// Status catalog table for this entity.
    pub fn catalog(self) -> &'static str {
        match self {
            Entidad::Cotizaciones => CotizacionEstado::CATALOG,
            Entidad::Solicitudes => SolicitudEstado::CATALOG,
            Entidad::Baja => BajaEstado::CATALOG,
            Entidad::Ordenes => OrdenEstado::CATALOG,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Entidad::Cotizaciones => "cotizaciones",
            Entidad::Solicitudes => "solicitudes",
            Entidad::Baja => "baja",
            Entidad::Ordenes => "ordenes",
        }
    }
}

impl FromStr for Entidad {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cotizaciones" => Ok(Entidad::Cotizaciones),
            "solicitudes" => Ok(Entidad::Solicitudes),
            "baja" | "dar-de-baja" | "solicitudes_baja" => Ok(Entidad::Baja),
            "ordenes" => Ok(Entidad::Ordenes),
            other => Err(Error::InvalidInput(format!(
                "entidad desconocida: '{}' (cotizaciones, solicitudes, baja, ordenes)",
                other
            ))),
        }
    }
}

// =============================================================================
// CATALOGS (GENERALES)
// =============================================================================

/// A client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cliente {
    pub id: i64,
    pub nombre: String,
    pub rut: Option<String>,
    pub contacto: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub creacion: DateTime<Utc>,
}

/// A piece of equipment owned by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipo {
    pub id: i64,
    pub id_cliente: i64,
    pub cliente_nombre: Option<String>,
    pub nombre: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub serie: Option<String>,
    pub ubicacion: Option<String>,
    pub creacion: DateTime<Utc>,
}

/// `{ id, nombre }` row of a status catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstadoCatalogo {
    pub id: i32,
    pub nombre: String,
}

/// Request body to create a client.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClienteRequest {
    pub nombre: String,
    pub rut: Option<String>,
    pub contacto: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
}

impl CreateClienteRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("nombre", &self.nombre, 200)?;
        optional_column("rut", self.rut.as_deref(), 20)?;
        optional_column("contacto", self.contacto.as_deref(), 200)?;
        optional_column("email", self.email.as_deref(), 200)?;
        optional_column("telefono", self.telefono.as_deref(), 50)?;
        if let Some(email) = self.email.as_deref().map(str::trim) {
            if !email.is_empty() && !email.contains('@') {
                return Err(Error::InvalidInput("email no es válido".to_string()));
            }
        }
        Ok(())
    }
}

/// Request body to register equipment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEquipoRequest {
    pub id_cliente: i64,
    pub nombre: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub serie: Option<String>,
    pub ubicacion: Option<String>,
}

impl CreateEquipoRequest {
    pub fn validate(&self) -> Result<()> {
        require_id("id_cliente", self.id_cliente)?;
        require_text("nombre", &self.nombre, 200)?;
        optional_column("marca", self.marca.as_deref(), 100)?;
        optional_column("modelo", self.modelo.as_deref(), 100)?;
        optional_column("serie", self.serie.as_deref(), 100)?;
        optional_column("ubicacion", self.ubicacion.as_deref(), 200)
    }
}

// =============================================================================
// COTIZACIONES
// =============================================================================

/// A quotation row joined with its status and client names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cotizacion {
    pub id: i64,
    pub id_cliente: i64,
    pub cliente_nombre: Option<String>,
    pub id_orden: Option<i64>,
    pub id_estado: i32,
    pub estado: Option<String>,
    pub titulo: String,
    pub mensaje: Option<String>,
    pub observacion: Option<String>,
    pub total: f64,
    pub creacion: DateTime<Utc>,
    pub cambio_estado: Option<DateTime<Utc>>,
}

/// A spare part line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repuesto {
    pub id: i64,
    pub descripcion: String,
    pub cantidad: i32,
    pub precio_unitario: f64,
    pub subtotal: f64,
}

/// An additional (non-part) charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAdicional {
    pub id: i64,
    pub descripcion: String,
    pub monto: f64,
}

/// Quotation with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CotizacionDetalle {
    #[serde(flatten)]
    pub cotizacion: Cotizacion,
    pub repuestos: Vec<Repuesto>,
    pub items_adicionales: Vec<ItemAdicional>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRepuesto {
    pub descripcion: String,
    pub cantidad: i32,
    pub precio_unitario: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewItemAdicional {
    pub descripcion: String,
    pub monto: f64,
}

/// Request body to create a quotation (always starts as pending).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCotizacionRequest {
    pub id_cliente: i64,
    pub id_orden: Option<i64>,
    pub titulo: String,
    pub mensaje: Option<String>,
    #[serde(default)]
    pub repuestos: Vec<NewRepuesto>,
    #[serde(default)]
    pub items_adicionales: Vec<NewItemAdicional>,
}

impl CreateCotizacionRequest {
    pub fn validate(&self) -> Result<()> {
        require_id("id_cliente", self.id_cliente)?;
        require_text("titulo", &self.titulo, 200)?;
        optional_text("mensaje", self.mensaje.as_deref())?;
        for (i, r) in self.repuestos.iter().enumerate() {
            require_text(&format!("repuestos[{}].descripcion", i), &r.descripcion, 500)?;
            if r.cantidad <= 0 {
                return Err(Error::InvalidInput(format!(
                    "repuestos[{}].cantidad debe ser mayor que 0",
                    i
                )));
            }
            require_amount(&format!("repuestos[{}].precio_unitario", i), r.precio_unitario)?;
        }
        for (i, item) in self.items_adicionales.iter().enumerate() {
            require_text(
                &format!("items_adicionales[{}].descripcion", i),
                &item.descripcion,
                500,
            )?;
            require_amount(&format!("items_adicionales[{}].monto", i), item.monto)?;
        }
        require_amount("total", self.total())
    }

    /// Sum of all line items, rounded to cents.
    pub fn total(&self) -> f64 {
        let repuestos: f64 = self
            .repuestos
            .iter()
            .map(|r| f64::from(r.cantidad) * r.precio_unitario)
            .sum();
        let adicionales: f64 = self.items_adicionales.iter().map(|i| i.monto).sum();
        ((repuestos + adicionales) * 100.0).round() / 100.0
    }
}

/// Request body for `PATCH .../estado`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeEstadoRequest {
    pub id_estado: Option<i32>,
    pub observacion: Option<String>,
}

impl ChangeEstadoRequest {
    /// Validate the status id against `E` and the observation length.
    pub fn validate<E: Estado>(&self) -> Result<E> {
        let estado = E::from_request(self.id_estado)?;
        optional_text("observacion", self.observacion.as_deref())?;
        Ok(estado)
    }
}

/// Quotation totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CotizacionTotales {
    pub cantidad: i64,
    pub monto_total: f64,
    pub monto_aprobado: f64,
}

/// `GET /cotizaciones/estadisticas` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CotizacionStats {
    pub por_estado: Vec<GroupCount>,
    pub por_mes: Vec<GroupCount>,
    pub totales: CotizacionTotales,
}

// =============================================================================
// SOLICITUDES (SERVICE REQUESTS)
// =============================================================================

/// A service request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solicitud {
    pub id: i64,
    pub id_cliente: i64,
    pub cliente_nombre: Option<String>,
    pub id_equipo: Option<i64>,
    pub equipo_nombre: Option<String>,
    pub id_estado: i32,
    pub estado: Option<String>,
    pub solicitante: String,
    pub descripcion: String,
    pub creacion: DateTime<Utc>,
    pub cambio_estado: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSolicitudRequest {
    pub id_cliente: i64,
    pub id_equipo: Option<i64>,
    pub solicitante: String,
    pub descripcion: String,
}

impl CreateSolicitudRequest {
    pub fn validate(&self) -> Result<()> {
        require_id("id_cliente", self.id_cliente)?;
        if let Some(id) = self.id_equipo {
            require_id("id_equipo", id)?;
        }
        require_text("solicitante", &self.solicitante, 200)?;
        require_text("descripcion", &self.descripcion, defaults::NOTE_MAX_LEN)
    }
}

/// Dashboard totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardTotales {
    pub clientes: i64,
    pub equipos: i64,
    pub solicitudes: i64,
    pub ordenes: i64,
    pub ordenes_abiertas: i64,
    pub cotizaciones_pendientes: i64,
    pub bajas_pendientes: i64,
}

/// `GET /dashboard/stats` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub totales: DashboardTotales,
    pub solicitudes_por_estado: Vec<GroupCount>,
    pub ordenes_por_estado: Vec<GroupCount>,
    pub solicitudes_por_mes: Vec<GroupCount>,
    pub equipos_por_cliente: Vec<GroupCount>,
    pub solicitudes_recientes: Vec<Solicitud>,
}

// =============================================================================
// SOLICITUDES DE BAJA (DECOMMISSION)
// =============================================================================

/// A decommission request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolicitudBaja {
    pub id: i64,
    pub id_equipo: i64,
    pub equipo_nombre: Option<String>,
    pub id_cliente: i64,
    pub cliente_nombre: Option<String>,
    pub id_estado: i32,
    pub estado: Option<String>,
    pub solicitante: String,
    pub justificacion: String,
    pub observacion: Option<String>,
    pub creacion: DateTime<Utc>,
    pub cambio_estado: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSolicitudBajaRequest {
    pub id_equipo: i64,
    pub solicitante: String,
    pub justificacion: String,
}

impl CreateSolicitudBajaRequest {
    pub fn validate(&self) -> Result<()> {
        require_id("id_equipo", self.id_equipo)?;
        require_text("solicitante", &self.solicitante, 200)?;
        require_text("justificacion", &self.justificacion, defaults::NOTE_MAX_LEN)
    }
}

/// `GET /dar-de-baja/stats` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BajaStats {
    pub total: i64,
    pub por_estado: Vec<GroupCount>,
    pub por_mes: Vec<GroupCount>,
}

// =============================================================================
// ORDENES, CAMBIOS, VISITAS
// =============================================================================

/// A work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orden {
    pub id: i64,
    pub id_solicitud: i64,
    pub id_cliente: i64,
    pub cliente_nombre: Option<String>,
    pub id_estado: i32,
    pub estado: Option<String>,
    pub creado_por: String,
    pub cerrado_por: Option<String>,
    pub total: f64,
    pub creacion: DateTime<Utc>,
    pub cambio_estado: Option<DateTime<Utc>>,
    pub cierre: Option<DateTime<Utc>>,
}

/// Append-only change log entry of a work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cambio {
    pub id: i64,
    pub id_orden: i64,
    pub descripcion: String,
    pub usuario: String,
    pub creacion: DateTime<Utc>,
}

/// A scheduled or executed on-site visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visita {
    pub id: i64,
    pub id_orden: i64,
    pub inicio: DateTime<Utc>,
    pub duracion_minutos: i32,
    pub actividades: Option<String>,
    pub cerrada: bool,
    pub cierre: Option<DateTime<Utc>>,
}

/// Work order with its change log and visits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdenDetalle {
    #[serde(flatten)]
    pub orden: Orden,
    pub cambios: Vec<Cambio>,
    pub visitas: Vec<Visita>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrdenRequest {
    pub id_solicitud: i64,
    pub creado_por: String,
}

impl CreateOrdenRequest {
    pub fn validate(&self) -> Result<()> {
        require_id("id_solicitud", self.id_solicitud)?;
        require_text("creado_por", &self.creado_por, 200)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeOrdenEstadoRequest {
    pub id_estado: Option<i32>,
    #[serde(default)]
    pub usuario: String,
    pub descripcion: Option<String>,
}

impl ChangeOrdenEstadoRequest {
    pub fn validate(&self) -> Result<OrdenEstado> {
        let estado = OrdenEstado::from_request(self.id_estado)?;
        require_text("usuario", &self.usuario, 200)?;
        optional_text("descripcion", self.descripcion.as_deref())?;
        Ok(estado)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVisitaRequest {
    pub inicio: DateTime<Utc>,
    pub duracion_minutos: i32,
    pub actividades: Option<String>,
}

impl CreateVisitaRequest {
    pub fn validate(&self) -> Result<()> {
        if self.duracion_minutos <= 0 {
            return Err(Error::InvalidInput(
                "duracion_minutos debe ser mayor que 0".to_string(),
            ));
        }
        optional_text("actividades", self.actividades.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseVisitaRequest {
    #[serde(default)]
    pub actividades: String,
}

impl CloseVisitaRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("actividades", &self.actividades, defaults::NOTE_MAX_LEN)
    }
}

// =============================================================================
// AGGREGATES
// =============================================================================

/// One `GROUP BY` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

impl GroupCount {
    pub fn new(key: impl Into<String>, count: i64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// A page of rows with its metadata and a status breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListWithStats<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
    pub stats: Vec<GroupCount>,
}

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

fn require_text(field: &str, value: &str, max: usize) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} es requerido", field)));
    }
    if trimmed.chars().count() > max {
        return Err(Error::InvalidInput(format!(
            "{} no puede superar {} caracteres",
            field, max
        )));
    }
    Ok(())
}

fn optional_text(field: &str, value: Option<&str>) -> Result<()> {
    optional_column(field, value, defaults::NOTE_MAX_LEN)
}

/// Length check for a nullable column; `None` always passes.
fn optional_column(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(v) if v.trim().chars().count() > max => Err(Error::InvalidInput(format!(
            "{} no puede superar {} caracteres",
            field, max
        ))),
        _ => Ok(()),
    }
}

fn require_id(field: &str, id: i64) -> Result<()> {
    if id <= 0 {
        return Err(Error::InvalidInput(format!(
            "{} debe ser un identificador positivo",
            field
        )));
    }
    Ok(())
}

fn require_amount(field: &str, amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidInput(format!(
            "{} debe ser un monto no negativo",
            field
        )));
    }
    if amount > defaults::MAX_AMOUNT {
        return Err(Error::InvalidInput(format!(
            "{} no puede superar {:.2}",
            field,
            defaults::MAX_AMOUNT
        )));
    }
    Ok(())
}
