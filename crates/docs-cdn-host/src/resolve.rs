//! Decide where the documentation assets are served from
//!
//! A [`Resolver`] turns a [`CdnSource`] into [`AssetUrls`]:
//!
//! | Source | Strategy |
//! |--------|----------|
//! | `Auto` | local files, else the cached race over the built-in catalog |
//! | `Local(dir)` | local files below `dir` only |
//! | `Host(host)` | URLs built on `host`, no probing |
//! | `Candidates(hosts)` | cached race over `hosts` |
//! | `Resolved(urls)` | `urls` as given |
//!
//! The race result is remembered in a [`UrlCache`] file. Local discovery and
//! explicit hosts never touch that file.

use crate::app::DocsApp;
use crate::asset::AssetUrls;
use crate::cache::UrlCache;
use crate::candidate::{CdnCatalog, CdnHost};
use crate::config::RaceConfig;
use crate::local::{StaticDiscovery, auto_mount, file_to_uri};
use crate::normalize::CdnHostItem;
use crate::probe::Prober;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the documentation assets come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CdnSource {
    /// Local files if any, else the fastest built-in CDN
    #[default]
    Auto,
    /// Local files below a directory
    Local(PathBuf),
    /// One explicit host
    Host(CdnHost),
    /// The fastest of these hosts
    Candidates(Vec<CdnHost>),
    /// Fully resolved URLs
    Resolved(AssetUrls),
}

impl From<PathBuf> for CdnSource {
    fn from(dir: PathBuf) -> Self {
        Self::Local(dir)
    }
}

impl From<&Path> for CdnSource {
    fn from(dir: &Path) -> Self {
        Self::Local(dir.to_path_buf())
    }
}

impl From<CdnHost> for CdnSource {
    fn from(host: CdnHost) -> Self {
        Self::Host(host)
    }
}

impl From<&str> for CdnSource {
    fn from(host: &str) -> Self {
        Self::Host(CdnHost::host(host))
    }
}

impl From<Vec<CdnHost>> for CdnSource {
    fn from(hosts: Vec<CdnHost>) -> Self {
        Self::Candidates(hosts)
    }
}

impl From<CdnCatalog> for CdnSource {
    fn from(catalog: CdnCatalog) -> Self {
        Self::Candidates(catalog.hosts().to_vec())
    }
}

impl From<AssetUrls> for CdnSource {
    fn from(urls: AssetUrls) -> Self {
        Self::Resolved(urls)
    }
}

impl TryFrom<CdnHostItem> for CdnSource {
    type Error = Error;

    fn try_from(item: CdnHostItem) -> Result<Self> {
        item.export().map(Self::Host)
    }
}

/// Outcome of the steps that need no network
enum Step {
    Done(Option<AssetUrls>),
    Race {
        catalog: CdnCatalog,
        favicon: Option<String>,
        cache: Option<UrlCache>,
    },
}

/// Resolution of documentation asset URLs
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    source: CdnSource,
    favicon: Option<String>,
    use_cache: bool,
    config: RaceConfig,
    prober: Option<Prober>,
}

impl Resolver {
    /// Resolve `source` with the on-disk cache enabled
    pub fn new(source: impl Into<CdnSource>) -> Self {
        Self {
            source: source.into(),
            use_cache: true,
            ..Self::default()
        }
    }

    /// Set the favicon hint
    ///
    /// A root-relative path to an existing local file gets its top directory
    /// mounted as static content.
    #[must_use]
    pub fn with_favicon(mut self, favicon: Option<String>) -> Self {
        self.favicon = favicon;
        self
    }

    /// Enable or disable the on-disk cache of the race result
    #[must_use]
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Set timing, versions and cache location
    #[must_use]
    pub fn with_config(mut self, config: RaceConfig) -> Self {
        self.config = config;
        self
    }

    /// Race with this prober instead of one built from the configuration
    #[must_use]
    pub fn with_prober(mut self, prober: Prober) -> Self {
        self.prober = Some(prober);
        self
    }

    /// The configured source
    pub fn source(&self) -> &CdnSource {
        &self.source
    }

    /// Resolve the asset URLs, mounting directories on `app` when needed
    ///
    /// Callable with or without a surrounding runtime: a race runs on a
    /// worker thread with its own runtime.
    pub fn resolve(&self, app: &mut DocsApp) -> Result<Option<AssetUrls>> {
        match self.prepare(app)? {
            Step::Done(urls) => Ok(urls),
            Step::Race {
                catalog,
                favicon,
                cache,
            } => {
                let urls = self.race_blocking(&catalog, favicon)?;
                Ok(Some(remember(cache.as_ref(), urls)))
            }
        }
    }

    /// Resolve the asset URLs on the current runtime
    pub async fn resolve_async(&self, app: &mut DocsApp) -> Result<Option<AssetUrls>> {
        match self.prepare(app)? {
            Step::Done(urls) => Ok(urls),
            Step::Race {
                catalog,
                favicon,
                cache,
            } => {
                let urls = self.race(&catalog, favicon).await?;
                Ok(Some(remember(cache.as_ref(), urls)))
            }
        }
    }

    fn prepare(&self, app: &mut DocsApp) -> Result<Step> {
        self.config.validate()?;
        let favicon = mount_local_favicon(app, self.favicon.clone());
        let catalog = match &self.source {
            CdnSource::Resolved(urls) => {
                let mut urls = urls.clone();
                if favicon.is_some() && favicon != urls.favicon {
                    urls.favicon = favicon;
                }
                return Ok(Step::Done(Some(urls)));
            }
            CdnSource::Host(host) => {
                return Ok(Step::Done(Some(host.asset_urls(&self.config, favicon))));
            }
            CdnSource::Local(dir) => {
                let urls = StaticDiscovery::new()
                    .with_root(dir)
                    .with_favicon(favicon)
                    .discover(app);
                if urls.is_none() {
                    warn!("No swagger-ui*.css found below {}", dir.display());
                }
                return Ok(Step::Done(urls));
            }
            CdnSource::Auto => {
                let discovery = StaticDiscovery::new().with_favicon(favicon.clone());
                if let Some(urls) = discovery.discover(app) {
                    return Ok(Step::Done(Some(urls)));
                }
                CdnCatalog::builtin()
            }
            CdnSource::Candidates(hosts) if hosts.is_empty() => CdnCatalog::builtin(),
            CdnSource::Candidates(hosts) => CdnCatalog::new(hosts.clone()),
        };

        if !self.use_cache {
            return Ok(Step::Race {
                catalog,
                favicon,
                cache: None,
            });
        }
        let cache = UrlCache::locate(&self.config)?;
        match cache.load() {
            Ok(Some(urls)) => {
                debug!("Using cached asset URLs from {}", cache.path().display());
                return Ok(Step::Done(Some(urls.with_favicon(favicon))));
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable cache {}: {e}", cache.path().display()),
        }
        Ok(Step::Race {
            catalog,
            favicon,
            cache: Some(cache),
        })
    }

    async fn race(&self, catalog: &CdnCatalog, favicon: Option<String>) -> Result<AssetUrls> {
        let prober = match &self.prober {
            Some(prober) => prober.clone(),
            None => Prober::from_config(&self.config)?,
        };
        let urls = catalog.race_urls(&self.config);
        let fastest = prober.find_fastest(&urls).await;
        let index = urls.iter().position(|url| *url == fastest).unwrap_or(0);
        let host = catalog
            .hosts()
            .get(index)
            .ok_or_else(|| Error::invalid_config("empty CDN catalog"))?;
        info!("Select cdn: {} to serve swagger css/js", host.base());
        Ok(host.asset_urls(&self.config, favicon))
    }

    fn race_blocking(&self, catalog: &CdnCatalog, favicon: Option<String>) -> Result<AssetUrls> {
        std::thread::scope(|scope| {
            let worker = scope.spawn(|| -> Result<AssetUrls> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;
                runtime.block_on(self.race(catalog, favicon))
            });
            worker
                .join()
                .unwrap_or_else(|_| Err(Error::Worker("race worker panicked".to_string())))
        })
    }
}

/// Store a race result, keeping it even when the cache cannot be written
fn remember(cache: Option<&UrlCache>, urls: AssetUrls) -> AssetUrls {
    if let Some(cache) = cache
        && let Err(e) = cache.store(&urls)
    {
        warn!("Failed to write {}: {e}", cache.path().display());
    }
    urls
}

/// Mount the directory of a local favicon and return its served URL
///
/// Hints that are not a root-relative path to an existing file below a
/// directory are returned unchanged.
fn mount_local_favicon(app: &mut DocsApp, favicon: Option<String>) -> Option<String> {
    let hint = favicon?;
    let Some((top, _)) = hint.strip_prefix('/').and_then(|rest| rest.split_once('/')) else {
        return Some(hint);
    };
    let file = Path::new(&hint[1..]);
    if !file.is_file() {
        return Some(hint);
    }
    let root = Path::new(top);
    let uri_path = auto_mount(app, root, &format!("/{top}"));
    Some(file_to_uri(file, root, &uri_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Route;
    use crate::candidate::AssetPath;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn offline_config(dir: &TempDir) -> RaceConfig {
        RaceConfig::default().with_cache_file(dir.path().join("urls.txt"))
    }

    #[test]
    fn test_resolved_urls_take_favicon_hint() {
        let urls = AssetUrls::new("/a.css", "/a.js", "/r.js").with_favicon(Some("/old.ico"));
        let mut app = DocsApp::new("Items");
        let resolved = Resolver::new(urls.clone())
            .with_favicon(Some("https://cdn.test/new.png".into()))
            .resolve(&mut app)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.favicon.as_deref(), Some("https://cdn.test/new.png"));

        let untouched = Resolver::new(urls.clone()).resolve(&mut app).unwrap();
        assert_eq!(untouched, Some(urls));
    }

    #[test]
    fn test_explicit_host_never_probes() {
        let dir = TempDir::new().unwrap();
        let mut app = DocsApp::new("Items");
        let urls = Resolver::new(CdnHost::with_shared_path("http://127.0.0.1:9", "/assets/"))
            .with_config(offline_config(&dir))
            .resolve(&mut app)
            .unwrap()
            .unwrap();
        assert_eq!(urls.css, "http://127.0.0.1:9/assets/swagger-ui.css");
        assert_eq!(urls.redoc, "http://127.0.0.1:9/assets/redoc.standalone.js");
        assert!(!dir.path().join("urls.txt").exists());
    }

    #[test]
    fn test_plain_host_uses_default_paths() {
        let mut app = DocsApp::new("Items");
        let urls = Resolver::new("https://mirror.test/npm")
            .resolve(&mut app)
            .unwrap()
            .unwrap();
        assert_eq!(urls.js, "https://mirror.test/npm/swagger-ui-dist@5/swagger-ui-bundle.js");
    }

    #[test]
    fn test_cached_candidates_skip_the_race() {
        let dir = TempDir::new().unwrap();
        let cached = "https://a.test/x.css\nhttps://a.test/x.js\nhttps://a.test/r.js\n";
        fs::write(dir.path().join("urls.txt"), cached).unwrap();
        let mut app = DocsApp::new("Items");
        let urls = Resolver::new(vec![CdnHost::with_paths("http://127.0.0.1:9", AssetPath::npm())])
            .with_config(offline_config(&dir))
            .with_favicon(Some("https://a.test/f.png".into()))
            .resolve(&mut app)
            .unwrap()
            .unwrap();
        assert_eq!(urls.css, "https://a.test/x.css");
        assert_eq!(urls.favicon.as_deref(), Some("https://a.test/f.png"));
    }

    #[test]
    fn test_local_source_without_files_resolves_nothing() {
        let dir = TempDir::new().unwrap();
        let mut app = DocsApp::new("Items");
        let urls = Resolver::new(dir.path()).resolve(&mut app).unwrap();
        assert_eq!(urls, None);
        assert!(!app.has_route("/static"));
    }

    #[test]
    fn test_local_source_is_mounted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("swagger-ui.css"), "").unwrap();
        let mut app = DocsApp::new("Items");
        let urls = Resolver::new(dir.path()).resolve(&mut app).unwrap().unwrap();
        assert_eq!(urls.css, "/static/swagger-ui.css");
        assert!(matches!(app.routes().get("/static"), Some(Route::Static { .. })));
    }

    #[test]
    fn test_remote_favicon_is_not_mounted() {
        let mut app = DocsApp::new("Items");
        let hint = mount_local_favicon(&mut app, Some("https://cdn.test/f.png".into()));
        assert_eq!(hint.as_deref(), Some("https://cdn.test/f.png"));
        let hint = mount_local_favicon(&mut app, Some("/no/such/favicon.png".into()));
        assert_eq!(hint.as_deref(), Some("/no/such/favicon.png"));
        assert_eq!(app.paths().len(), 4);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RaceConfig::default().with_product_name("");
        let mut app = DocsApp::new("Items");
        let err = Resolver::new(CdnSource::Auto)
            .with_config(config)
            .resolve(&mut app)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_item_converts_to_host_source() {
        let item = CdnHostItem::new("https://mirror.test/swagger-ui/5.0.0/swagger-ui.css");
        let source = CdnSource::try_from(item).unwrap();
        assert!(matches!(source, CdnSource::Host(_)));
    }
}
