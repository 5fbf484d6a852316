//! On-disk cache of the race winner
//!
//! The file holds the stylesheet, script bundle and ReDoc URLs on three
//! lines. The favicon is never cached. Deleting the file invalidates it.

use crate::asset::AssetUrls;
use crate::config::RaceConfig;
use crate::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the cache inside the product cache directory
pub const CACHE_FILE_NAME: &str = "urls.txt";

/// Get the default cache file path
///
/// Returns a path like:
/// - Linux: `~/.cache/docs-cdn-host/urls.txt`
/// - macOS: `~/Library/Caches/docs-cdn-host/urls.txt`
/// - Windows: `C:\Users\{user}\AppData\Local\docs-cdn-host\urls.txt`
pub fn default_cache_file(product_name: &str) -> Result<PathBuf> {
    dirs::cache_dir()
        .ok_or(Error::CacheDirectoryNotFound)
        .map(|dir| dir.join(product_name).join(CACHE_FILE_NAME))
}

/// Cache file path under the temporary directory
///
/// Used when the default location cannot even be checked for existence.
pub fn fallback_cache_file(product_name: &str) -> Result<PathBuf> {
    temp_root().map(|dir| {
        dir.join(".cache")
            .join(product_name)
            .join(CACHE_FILE_NAME)
    })
}

#[cfg(windows)]
fn temp_root() -> Result<PathBuf> {
    std::env::var_os("TEMP")
        .map(PathBuf::from)
        .ok_or(Error::CacheDirectoryNotFound)
}

#[cfg(not(windows))]
#[allow(clippy::unnecessary_wraps)]
fn temp_root() -> Result<PathBuf> {
    Ok(PathBuf::from("/tmp"))
}

/// Three-line file remembering the race winner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCache {
    path: PathBuf,
}

impl UrlCache {
    /// Cache stored at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the cache file for `config`
    ///
    /// An explicit `cache_file` wins. Otherwise the platform cache directory
    /// is used, falling back to the temporary directory when checking the
    /// default path fails with a permission error. A permission error at the
    /// fallback is returned.
    pub fn locate(config: &RaceConfig) -> Result<Self> {
        if let Some(path) = &config.cache_file {
            return Ok(Self::new(path));
        }
        let fallback = || fallback_cache_file(&config.product_name);
        let primary = match default_cache_file(&config.product_name) {
            Ok(path) => path,
            Err(Error::CacheDirectoryNotFound) => fallback()?,
            Err(e) => return Err(e),
        };
        Self::locate_in(primary, fallback, Path::try_exists)
    }

    /// Pick `primary` unless `exists` reports a permission error for it
    ///
    /// Other errors keep `primary`: reading and writing it will fail later
    /// and the caller logs that instead of losing the race result.
    pub fn locate_in<F, E>(primary: PathBuf, fallback: F, exists: E) -> Result<Self>
    where
        F: FnOnce() -> Result<PathBuf>,
        E: Fn(&Path) -> std::io::Result<bool>,
    {
        match exists(&primary) {
            Ok(_) => Ok(Self::new(primary)),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!(
                    "No permission to check {}, using the temporary directory",
                    primary.display()
                );
                let path = fallback()?;
                exists(&path).map_err(|source| Error::CacheInaccessible {
                    path: path.clone(),
                    source,
                })?;
                Ok(Self::new(path))
            }
            Err(e) => {
                warn!("Cannot check {}: {e}", primary.display());
                Ok(Self::new(primary))
            }
        }
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached URLs
    ///
    /// Returns `None` when the file is missing or does not hold exactly three
    /// lines.
    pub fn load(&self) -> Result<Option<AssetUrls>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let lines: Vec<&str> = content.lines().collect();
        let [css, js, redoc] = lines.as_slice() else {
            debug!(
                "Ignoring {} with {} lines",
                self.path.display(),
                lines.len()
            );
            return Ok(None);
        };
        Ok(Some(AssetUrls::new(*css, *js, *redoc)))
    }

    /// Write the cacheable URLs, creating parent directories
    pub fn store(&self, urls: &AssetUrls) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = urls.cacheable().join("\n");
        content.push('\n');
        fs::write(&self.path, content)?;
        info!("Cache written to {}", self.path.display());
        Ok(())
    }

    /// Delete the cache file, returning whether it existed
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn urls() -> AssetUrls {
        AssetUrls::new(
            "https://unpkg.com/swagger-ui-dist@5/swagger-ui.css",
            "https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js",
            "https://unpkg.com/redoc@next/bundles/redoc.standalone.js",
        )
    }

    #[test]
    fn test_store_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = UrlCache::new(dir.path().join("nested/dir/urls.txt"));
        cache.store(&urls().with_favicon(Some("/favicon.ico"))).unwrap();

        let content = fs::read_to_string(cache.path()).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(!content.contains("favicon"));
        assert_eq!(cache.load().unwrap(), Some(urls()));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = UrlCache::new(dir.path().join("urls.txt"));
        assert_eq!(cache.load().unwrap(), None);
        assert!(!cache.clear().unwrap());
    }

    #[test]
    fn test_wrong_line_count_is_ignored() {
        let dir = TempDir::new().unwrap();
        let cache = UrlCache::new(dir.path().join("urls.txt"));
        fs::write(cache.path(), "https://a/b.css\nhttps://a/b.js\n").unwrap();
        assert_eq!(cache.load().unwrap(), None);
    }

    #[test]
    fn test_file_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let cache = UrlCache::new(dir.path().join("urls.txt"));
        fs::write(cache.path(), "/a.css\n/a.js\n/r.js").unwrap();
        assert_eq!(
            cache.load().unwrap(),
            Some(AssetUrls::new("/a.css", "/a.js", "/r.js"))
        );
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let cache = UrlCache::new(dir.path().join("urls.txt"));
        cache.store(&urls()).unwrap();
        assert!(cache.clear().unwrap());
        assert!(!cache.path().exists());
    }

    #[test]
    fn test_explicit_cache_file_wins() {
        let config = RaceConfig::default().with_cache_file("/srv/cache/urls.txt");
        let cache = UrlCache::locate(&config).unwrap();
        assert_eq!(cache.path(), Path::new("/srv/cache/urls.txt"));
    }

    fn denied(path: &Path) -> std::io::Result<bool> {
        if path.starts_with("/denied") {
            Err(std::io::Error::from(ErrorKind::PermissionDenied))
        } else {
            Ok(false)
        }
    }

    #[test]
    fn test_permission_error_uses_fallback() {
        let cache = UrlCache::locate_in(
            PathBuf::from("/denied/docs-cdn-host/urls.txt"),
            || Ok(PathBuf::from("/tmp/.cache/docs-cdn-host/urls.txt")),
            denied,
        )
        .unwrap();
        assert_eq!(cache.path(), Path::new("/tmp/.cache/docs-cdn-host/urls.txt"));
    }

    #[test]
    fn test_permission_error_at_fallback_is_returned() {
        let result = UrlCache::locate_in(
            PathBuf::from("/denied/home/urls.txt"),
            || Ok(PathBuf::from("/denied/tmp/urls.txt")),
            denied,
        );
        match result {
            Err(Error::CacheInaccessible { path, source }) => {
                assert_eq!(path, PathBuf::from("/denied/tmp/urls.txt"));
                assert_eq!(source.kind(), ErrorKind::PermissionDenied);
            }
            other => panic!("expected CacheInaccessible, got {other:?}"),
        }
    }

    #[test]
    fn test_other_errors_keep_primary_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cachefile");
        fs::write(&file, "not a directory").unwrap();
        let primary = file.join("docs-cdn-host").join(CACHE_FILE_NAME);

        let cache = UrlCache::locate_in(
            primary.clone(),
            || panic!("fallback must not be used"),
            Path::try_exists,
        )
        .unwrap();
        assert_eq!(cache.path(), primary.as_path());
        assert!(cache.store(&urls()).is_err());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_fallback_path_is_under_tmp() {
        assert_eq!(
            fallback_cache_file("docs-cdn-host").unwrap(),
            PathBuf::from("/tmp/.cache/docs-cdn-host/urls.txt")
        );
    }
}
