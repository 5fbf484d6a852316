//! Rewire the documentation pages of an application

use crate::Result;
use crate::app::{DocsApp, DocsPage, page_handler};
use crate::asset::AssetUrls;
use crate::config::RaceConfig;
use crate::lock::SharedLock;
use crate::probe::Prober;
use crate::resolve::{CdnSource, Resolver};
use std::fmt;
use tracing::{debug, info};

/// How [`patch_docs`] resolves assets and guards the pages
#[derive(Clone)]
pub struct PatchOptions {
    source: CdnSource,
    favicon: Option<String>,
    lock: Option<SharedLock>,
    cache: bool,
    config: RaceConfig,
    prober: Option<Prober>,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            source: CdnSource::Auto,
            favicon: None,
            lock: None,
            cache: true,
            config: RaceConfig::default(),
            prober: None,
        }
    }
}

impl fmt::Debug for PatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchOptions")
            .field("source", &self.source)
            .field("favicon", &self.favicon)
            .field("lock", &self.lock.is_some())
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PatchOptions {
    /// Options with automatic source selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Set where the assets come from
    #[must_use]
    pub fn source(mut self, source: impl Into<CdnSource>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the favicon URL or local path
    #[must_use]
    pub fn favicon(mut self, favicon: impl Into<String>) -> Self {
        self.favicon = Some(favicon.into());
        self
    }

    /// Guard both pages with a lock
    #[must_use]
    pub fn lock(mut self, lock: SharedLock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Enable or disable the on-disk cache of the race result
    #[must_use]
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// Set race timing, versions and cache location
    #[must_use]
    pub fn config(mut self, config: RaceConfig) -> Self {
        self.config = config;
        self
    }

    /// Race with this prober
    #[must_use]
    pub fn prober(mut self, prober: Prober) -> Self {
        self.prober = Some(prober);
        self
    }

    fn resolver(&self) -> Resolver {
        let resolver = Resolver::new(self.source.clone())
            .with_favicon(self.favicon.clone())
            .with_cache(self.cache)
            .with_config(self.config.clone());
        match &self.prober {
            Some(prober) => resolver.with_prober(prober.clone()),
            None => resolver,
        }
    }
}

/// Serve the documentation pages of `app` with resolved asset URLs
///
/// Returns the URLs the pages now use, or `None` when the application has no
/// documentation or no asset location could be decided; the routes are left
/// untouched in both cases.
///
/// ```no_run
/// use docs_cdn_host::{DocsApp, PatchOptions, WeekdayLock, patch_docs};
///
/// let mut app = DocsApp::new("Items");
/// patch_docs(&mut app, PatchOptions::new().lock(WeekdayLock::new().shared()))?;
/// let router = app.into_router();
/// # let _ = router;
/// # Ok::<(), docs_cdn_host::Error>(())
/// ```
pub fn patch_docs(app: &mut DocsApp, options: PatchOptions) -> Result<Option<AssetUrls>> {
    if !app.is_docs_enabled() {
        info!("API docs not activated, skip patching.");
        return Ok(None);
    }
    let urls = options.resolver().resolve(app)?;
    Ok(install(app, urls, options.lock))
}

/// [`patch_docs`] for callers already running on a runtime
pub async fn patch_docs_async(
    app: &mut DocsApp,
    options: PatchOptions,
) -> Result<Option<AssetUrls>> {
    if !app.is_docs_enabled() {
        info!("API docs not activated, skip patching.");
        return Ok(None);
    }
    let urls = options.resolver().resolve_async(app).await?;
    Ok(install(app, urls, options.lock))
}

fn install(
    app: &mut DocsApp,
    urls: Option<AssetUrls>,
    lock: Option<SharedLock>,
) -> Option<AssetUrls> {
    let urls = urls?;
    for page in [DocsPage::SwaggerUi, DocsPage::Redoc] {
        let Some(path) = app.page_url(page).map(str::to_string) else {
            continue;
        };
        let handler = page_handler(app, page, urls.clone(), lock.clone());
        if app.replace_endpoint(&path, handler, false) {
            debug!("Patched {path}");
        }
    }
    Some(urls)
}
