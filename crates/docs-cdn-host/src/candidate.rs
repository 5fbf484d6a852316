//! CDN candidates and the built-in catalog
//!
//! A [`CdnHost`] is a host plus the path templates under which Swagger UI and
//! ReDoc live on it. Templates carry a `{version}` placeholder that is filled
//! with the major Swagger UI version for `@`-style hosts (`swagger-ui-dist@5`)
//! and with the full version for numbered-path hosts (`swagger-ui/5.17.14`).

use crate::asset::{AssetUrls, REDOC_JS, SWAGGER_CSS, SWAGGER_JS};
use crate::config::RaceConfig;
use serde::{Deserialize, Serialize};

/// Official ReDoc bundle location, used when a host does not mirror ReDoc
pub const OFFICIAL_REDOC: &str = "https://cdn.redoc.ly/redoc/latest/bundles/";

/// Placeholder replaced by the Swagger UI version
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Swagger UI and ReDoc path templates on a CDN host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPath {
    /// Swagger UI directory template, starting and ending with `/`
    pub swagger: String,
    /// ReDoc directory: a path on the same host, an absolute URL, or empty
    /// for the official ReDoc bundle
    pub redoc: String,
}

impl AssetPath {
    /// Create templates for Swagger UI and ReDoc
    pub fn new(swagger: impl Into<String>, redoc: impl Into<String>) -> Self {
        Self {
            swagger: swagger.into(),
            redoc: redoc.into(),
        }
    }

    /// Use one template for both Swagger UI and ReDoc
    pub fn shared(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            swagger: path.clone(),
            redoc: path,
        }
    }

    /// npm-style layout of jsdelivr and unpkg
    pub fn npm() -> Self {
        Self::new("/swagger-ui-dist@{version}/", "/redoc@next/bundles/")
    }

    /// Numbered-path layout of cdnjs-like hosts
    pub fn numbered() -> Self {
        Self::new("/swagger-ui/{version}/", OFFICIAL_REDOC)
    }

    /// Fill the `{version}` placeholder of the Swagger UI template
    pub fn swagger_path(&self, config: &RaceConfig) -> String {
        let version = if self.swagger.contains('@') {
            &config.swagger_ui_version
        } else {
            &config.swagger_ui_full_version
        };
        self.swagger.replace(VERSION_PLACEHOLDER, version)
    }
}

impl Default for AssetPath {
    fn default() -> Self {
        Self::npm()
    }
}

/// A CDN host eligible for serving documentation assets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CdnHost {
    /// Host using the default npm-style templates
    HostOnly(String),
    /// Host with explicit templates
    WithPaths {
        /// Scheme, authority and optional shared path prefix
        host: String,
        /// Path templates under `host`
        paths: AssetPath,
    },
}

impl CdnHost {
    /// Host with default templates
    pub fn host(host: impl Into<String>) -> Self {
        Self::HostOnly(host.into())
    }

    /// Host with explicit templates
    pub fn with_paths(host: impl Into<String>, paths: AssetPath) -> Self {
        Self::WithPaths {
            host: host.into(),
            paths,
        }
    }

    /// Host whose Swagger UI and ReDoc share one template
    pub fn with_shared_path(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_paths(host, AssetPath::shared(path))
    }

    /// jsdelivr npm mirror
    pub fn jsdelivr() -> Self {
        Self::host("https://cdn.jsdelivr.net/npm")
    }

    /// unpkg npm mirror
    pub fn unpkg() -> Self {
        Self::host("https://unpkg.com")
    }

    /// staticfile.org mirror
    pub fn staticfile() -> Self {
        Self::with_paths("https://cdn.staticfile.org", AssetPath::numbered())
    }

    /// cdnjs mirror
    pub fn cdnjs() -> Self {
        Self::with_paths("https://cdnjs.cloudflare.com/ajax/libs", AssetPath::numbered())
    }

    /// Host part (scheme, authority, shared prefix)
    pub fn base(&self) -> &str {
        match self {
            Self::HostOnly(host) | Self::WithPaths { host, .. } => host,
        }
    }

    /// Path templates, falling back to the npm layout
    pub fn paths(&self) -> AssetPath {
        match self {
            Self::HostOnly(_) => AssetPath::npm(),
            Self::WithPaths { paths, .. } => paths.clone(),
        }
    }

    /// URL of the stylesheet on this host, the one raced against other hosts
    pub fn css_url(&self, config: &RaceConfig) -> String {
        format!(
            "{}{}{SWAGGER_CSS}",
            self.base(),
            self.paths().swagger_path(config)
        )
    }

    /// Build all asset URLs on this host
    pub fn asset_urls(&self, config: &RaceConfig, favicon: Option<String>) -> AssetUrls {
        let paths = self.paths();
        let swagger = paths.swagger_path(config);
        let css = format!("{}{swagger}{SWAGGER_CSS}", self.base());
        let js = format!("{}{swagger}{SWAGGER_JS}", self.base());
        let redoc_dir = if paths.redoc.is_empty() {
            OFFICIAL_REDOC.to_string()
        } else if paths.redoc.starts_with("http") {
            paths.redoc
        } else {
            format!("{}{}", self.base(), paths.redoc)
        };
        AssetUrls {
            css,
            js,
            redoc: format!("{redoc_dir}{REDOC_JS}"),
            favicon,
        }
    }
}

impl From<&str> for CdnHost {
    fn from(host: &str) -> Self {
        Self::host(host)
    }
}

impl From<String> for CdnHost {
    fn from(host: String) -> Self {
        Self::HostOnly(host)
    }
}

impl<H: Into<String>> From<(H, AssetPath)> for CdnHost {
    fn from((host, paths): (H, AssetPath)) -> Self {
        Self::with_paths(host, paths)
    }
}

/// Ordered list of CDN candidates for the race
///
/// Order only matters for tie-breaks: when several candidates succeed within
/// one polling tick the first declared wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdnCatalog {
    hosts: Vec<CdnHost>,
}

impl CdnCatalog {
    /// Catalog of exactly these candidates
    pub fn new(hosts: impl IntoIterator<Item = impl Into<CdnHost>>) -> Self {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// The well-known public CDNs
    pub fn builtin() -> Self {
        Self::new([
            CdnHost::jsdelivr(),
            CdnHost::unpkg(),
            CdnHost::staticfile(),
            CdnHost::cdnjs(),
        ])
    }

    /// Custom candidates followed by the built-in ones
    pub fn extend(custom: impl IntoIterator<Item = impl Into<CdnHost>>) -> Self {
        let mut catalog = Self::new(custom);
        for host in Self::builtin().hosts {
            if !catalog.hosts.contains(&host) {
                catalog.hosts.push(host);
            }
        }
        catalog
    }

    /// Candidates in race order
    pub fn hosts(&self) -> &[CdnHost] {
        &self.hosts
    }

    /// Whether the catalog has no candidates
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Stylesheet URLs to race, parallel to [`Self::hosts`]
    pub fn race_urls(&self, config: &RaceConfig) -> Vec<String> {
        self.hosts.iter().map(|host| host.css_url(config)).collect()
    }
}

impl Default for CdnCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
