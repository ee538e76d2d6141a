//! HTTP handlers, one module per resource.

pub mod cotizaciones;
pub mod dar_de_baja;
pub mod dashboard;
pub mod generales;
pub mod health;
pub mod ordenes;
