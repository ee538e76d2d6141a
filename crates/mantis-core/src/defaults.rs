//! Centralized default constants for mantis.
//!
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by area.

// =============================================================================
// PAGINATION
// =============================================================================

/// Page used when the request omits `page` or sends garbage.
pub const PAGE: i64 = 1;

/// Page size used when the request omits `limit`, sends garbage, or `< 1`.
pub const PAGE_LIMIT: i64 = 10;

/// Hard upper bound for `limit`.
pub const PAGE_LIMIT_MAX: i64 = 100;

// =============================================================================
// STATISTICS
// =============================================================================

/// Trailing window for month-bucketed statistics.
pub const STATS_MONTHS: u32 = 12;

/// Number of recent rows shown on the dashboard.
pub const DASHBOARD_RECENT: i64 = 5;

// =============================================================================
// DATABASE
// =============================================================================

/// Default MySQL host.
pub const DB_HOST: &str = "localhost";

/// Default MySQL port.
pub const DB_PORT: u16 = 3306;

/// Default MySQL user.
pub const DB_USER: &str = "root";

/// Default database (schema) name.
pub const DB_NAME: &str = "mantenimiento";

// =============================================================================
// SERVER
// =============================================================================

/// Default bind address.
pub const HOST: &str = "0.0.0.0";

/// Default HTTP port.
pub const PORT: u16 = 3000;

/// Maximum accepted request body (bytes).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

// =============================================================================
// CACHE
// =============================================================================

/// Time-to-live for catalog (generales) cache entries, in seconds.
pub const CATALOG_CACHE_TTL_SECS: u64 = 300;

// =============================================================================
// TEXT LIMITS
// =============================================================================

/// Longest accepted free-text search term.
pub const SEARCH_TERM_MAX_LEN: usize = 200;

/// Longest accepted observation / justification text.
pub const NOTE_MAX_LEN: usize = 5000;

// =============================================================================
// MONEY
// =============================================================================

/// Largest amount a `DECIMAL(12,2)` column holds.
pub const MAX_AMOUNT: f64 = 9_999_999_999.99;
