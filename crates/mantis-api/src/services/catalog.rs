//! Read-through cache over the reference catalogs (clients, equipment,
//! status tables).
//!
//! Catalog reads are served from the injected [`Cache`] while fresh. On a
//! miss the repository is queried and the result stored for the configured
//! TTL. If the repository fails and an expired entry is still held, the
//! stale entry is served instead of the error. Any catalog write clears the
//! whole cache.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use mantis_core::{
    Cache, CatalogRepository, Cliente, CreateClienteRequest, CreateEquipoRequest, Entidad,
    Equipo, EstadoCatalogo, Result,
};

/// Catalog reads and writes with caching.
#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { repo, cache, ttl }
    }

    pub async fn clientes(&self) -> Result<Vec<Cliente>> {
        self.cached("clientes", self.repo.list_clientes()).await
    }

    pub async fn equipos(&self, id_cliente: Option<i64>) -> Result<Vec<Equipo>> {
        let key = match id_cliente {
            Some(id) => format!("equipos:{}", id),
            None => "equipos".to_string(),
        };
        self.cached(&key, self.repo.list_equipos(id_cliente)).await
    }

    pub async fn estados(&self, entidad: Entidad) -> Result<Vec<EstadoCatalogo>> {
        let key = format!("estados:{}", entidad.as_str());
        self.cached(&key, self.repo.list_estados(entidad)).await
    }

    pub async fn create_cliente(&self, req: CreateClienteRequest) -> Result<i64> {
        let id = self.repo.create_cliente(req).await?;
        self.cache.clear().await;
        Ok(id)
    }

    pub async fn create_equipo(&self, req: CreateEquipoRequest) -> Result<i64> {
        let id = self.repo.create_equipo(req).await?;
        self.cache.clear().await;
        Ok(id)
    }

    async fn cached<T, F>(&self, key: &str, load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T>>,
    {
        if let Some(value) = self.cache.get(key).await {
            match serde_json::from_value(value) {
                Ok(hit) => return Ok(hit),
                Err(e) => warn!(
                    subsystem = "cache",
                    cache_key = key,
                    error = %e,
                    "Discarding unreadable cache entry"
                ),
            }
        }

        match load.await {
            Ok(fresh) => {
                let value = serde_json::to_value(&fresh)?;
                self.cache.set(key, value, self.ttl).await;
                debug!(
                    subsystem = "api",
                    component = "catalog",
                    cache_key = key,
                    ttl_secs = self.ttl.as_secs(),
                    "Catalog loaded"
                );
                Ok(fresh)
            }
            Err(err) => {
                if let Some(stale) = self.cache.get_stale(key).await {
                    if let Ok(value) = serde_json::from_value(stale) {
                        warn!(
                            subsystem = "api",
                            component = "catalog",
                            cache_key = key,
                            error = %err,
                            "Catalog load failed, serving stale entry"
                        );
                        return Ok(value);
                    }
                }
                Err(err)
            }
        }
    }
}
