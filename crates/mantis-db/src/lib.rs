//! # mantis-db
//!
//! MySQL database layer for the mantis maintenance backend.
//!
//! This crate provides:
//! - Connection pool management
//! - The filter clause builder shared by every list endpoint
//! - Grouped statistics (by status, by month, by category)
//! - Repository implementations for quotations, service requests,
//!   decommission requests, work orders, visits and catalogs
//!
//! ## Example
//!
//! ```rust,ignore
//! use mantis_db::{CotizacionRepository, Database, ListFilter, Page};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("mysql://root@localhost:3306/mantenimiento").await?;
//!     let page = db
//!         .cotizaciones
//!         .list(&ListFilter::by_estado(1), Page::default())
//!         .await?;
//!     println!("{} pending quotations", page.pagination.total);
//!     Ok(())
//! }
//! ```
pub mod aggregate;
pub mod catalogs;
pub mod cotizaciones;
pub mod dashboard;
pub mod filter_clause;
pub mod listing;
pub mod ordenes;
pub mod pool;
pub mod solicitudes;
pub mod solicitudes_baja;
pub mod status;
pub mod visitas;

// Always compiled so integration tests (in tests/) can use the fixtures.
pub mod test_fixtures;

pub use mantis_core::*;

pub use catalogs::MySqlCatalogRepository;
pub use cotizaciones::MySqlCotizacionRepository;
pub use dashboard::MySqlDashboardRepository;
pub use filter_clause::{escape_like, FilterClause, FilterClauseBuilder, QueryParam, ResourceColumns};
pub use listing::ListQuery;
pub use ordenes::MySqlOrdenRepository;
pub use pool::{
    create_lazy_pool, create_pool, create_pool_with_config, log_pool_metrics, ConnectParams,
    PoolConfig,
};
pub use solicitudes::MySqlSolicitudRepository;
pub use solicitudes_baja::MySqlSolicitudBajaRepository;
pub use visitas::MySqlVisitaRepository;

use sqlx::mysql::MySqlPool;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: MySqlPool,
    pub cotizaciones: MySqlCotizacionRepository,
    pub solicitudes: MySqlSolicitudRepository,
    pub dashboard: MySqlDashboardRepository,
    pub solicitudes_baja: MySqlSolicitudBajaRepository,
    pub ordenes: MySqlOrdenRepository,
    pub visitas: MySqlVisitaRepository,
    /// Clients, equipment and status catalogs.
    pub catalogs: MySqlCatalogRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            cotizaciones: MySqlCotizacionRepository::new(pool.clone()),
            solicitudes: MySqlSolicitudRepository::new(pool.clone()),
            dashboard: MySqlDashboardRepository::new(pool.clone()),
            solicitudes_baja: MySqlSolicitudBajaRepository::new(pool.clone()),
            ordenes: MySqlOrdenRepository::new(pool.clone()),
            visitas: MySqlVisitaRepository::new(pool.clone()),
            catalogs: MySqlCatalogRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;
        Ok(())
    }

    /// Round-trip a trivial query; used by the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}
