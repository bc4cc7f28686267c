//! Cache location and opening.
//!
//! The SQLite quote cache lives in a platform-specific directory unless
//! `HSVAR_CACHE_DIR` points elsewhere.

use hsvar_data::{DataError, SqliteCache};
use std::path::PathBuf;

/// Environment variable overriding the cache directory.
pub(crate) const CACHE_DIR_ENV: &str = "HSVAR_CACHE_DIR";

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/hsvar/`
/// - macOS: `~/Library/Caches/hsvar/`
/// - Windows: `%LOCALAPPDATA%\hsvar\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hsvar")
}

/// Cache directory, honouring `HSVAR_CACHE_DIR`.
pub(crate) fn cache_dir() -> PathBuf {
    resolve_cache_dir(std::env::var_os(CACHE_DIR_ENV).map(PathBuf::from))
}

fn resolve_cache_dir(override_dir: Option<PathBuf>) -> PathBuf {
    override_dir
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(default_cache_dir)
}

/// Get the configured cache database path.
pub(crate) fn get_cache_path() -> PathBuf {
    cache_dir().join("hsvar.db")
}

/// Open the cache, creating the directory if needed.
pub(crate) fn open_cache() -> Result<SqliteCache, DataError> {
    let cache_path = get_cache_path();

    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::debug!(path = %cache_path.display(), "opening quote cache");
    SqliteCache::new(&cache_path)
}
