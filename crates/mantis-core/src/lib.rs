//! # mantis-core
//!
//! Core types, traits, and abstractions for the mantis maintenance backend.
//!
//! This crate provides the data structures and trait definitions that the
//! database and API crates depend on: domain models and status enums, the
//! error taxonomy, the pager, typed list filters and the catalog cache
//! interface.
//!
//! ## Structured logging fields
//!
//! Every crate logs with the same field names so logs can be queried across
//! subsystems:
//!
//! | field | meaning |
//! |-------|---------|
//! | `subsystem` | `"api"`, `"db"`, `"cache"` |
//! | `component` | e.g. `"pool"`, `"cotizaciones"`, `"aggregate"`, `"catalog"` |
//! | `op` | logical operation (`"list"`, `"change_estado"`, ...) |
//! | `db_table` | table touched |
//! | `entity_id` | numeric id of the row operated on |
//! | `id_estado` | status requested or applied |
//! | `result_count` / `total_count` | rows returned / rows matching |
//! | `duration_ms` | wall-clock duration |
//! | `pool_size` / `pool_idle` | connection pool gauges |
//! | `cache_key` | catalog cache key |

pub mod cache;
pub mod defaults;
pub mod error;
pub mod filters;
pub mod models;
pub mod paging;
pub mod traits;

// Re-export commonly used types at crate root
pub use cache::{Cache, MemoryCache, NoopCache};
pub use error::{Error, Result};
pub use filters::{ListFilter, RawListQuery};
pub use models::*;
pub use paging::{total_pages, Page, PageMeta, Paged};
pub use traits::*;
