//! Derive CDN path templates from example asset URLs
//!
//! Private mirrors rarely follow the npm layout of the public CDNs. Rather
//! than asking for host and templates separately, [`CdnHostItem`] takes the
//! URL of any Swagger UI asset on the mirror and works out the rest:
//!
//! ```
//! use docs_cdn_host::{AssetPath, CdnHost, CdnHostItem};
//!
//! let url = "https://raw.githubusercontent.com/swagger-api/swagger-ui/v5.17.14/dist/swagger-ui.css";
//! let host = CdnHostItem::new(url).export().unwrap();
//! assert_eq!(
//!     host,
//!     CdnHost::with_paths(
//!         "https://raw.githubusercontent.com/swagger-api",
//!         AssetPath::new("/swagger-ui/v{version}/dist/", ""),
//!     )
//! );
//! ```

use crate::candidate::{AssetPath, CdnHost, VERSION_PLACEHOLDER};
use crate::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Default ReDoc directory on npm-style hosts
pub const DEFAULT_REDOC_PATH: &str = "/redoc@next/bundles/";

// Literal patterns, compiled once.
#[allow(clippy::expect_used)]
static SWAGGER_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^swagger-ui\b").expect("valid regex"));

#[allow(clippy::expect_used)]
static SEMVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+").expect("valid regex"));

/// Where ReDoc lives relative to the mirror
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReferenceHint {
    /// Use the official ReDoc bundle
    #[default]
    Official,
    /// Use the npm-style default path on the same host
    Default,
    /// Explicit path, directory or file URL
    Path(String),
}

/// Example asset URL of a CDN mirror
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnHostItem {
    swagger_ui: String,
    redoc: ReferenceHint,
}

impl CdnHostItem {
    /// Mirror identified by the URL of one of its Swagger UI assets
    pub fn new(swagger_ui: impl Into<String>) -> Self {
        Self {
            swagger_ui: swagger_ui.into(),
            redoc: ReferenceHint::Official,
        }
    }

    /// Set where ReDoc lives
    #[must_use]
    pub fn with_redoc(mut self, redoc: ReferenceHint) -> Self {
        self.redoc = redoc;
        self
    }

    /// Remove the last path segment if it looks like a file name
    ///
    /// Directory URLs get a trailing `/`. The authority of an absolute URL
    /// is never treated as a file name, and a bare file name becomes `/`.
    ///
    /// ```
    /// use docs_cdn_host::CdnHostItem;
    ///
    /// let strip = CdnHostItem::strip_filename;
    /// assert_eq!(strip("http://localhost:8000/a/b/c.js"), "http://localhost:8000/a/b/");
    /// assert_eq!(strip("http://localhost:8000/a/b"), "http://localhost:8000/a/b/");
    /// assert_eq!(strip("swagger-ui.css"), "/");
    /// ```
    pub fn strip_filename(url: &str) -> String {
        if url.ends_with('/') {
            return url.to_string();
        }
        let (prefix, path) = match url.split_once("://") {
            Some((scheme, rest)) => match rest.find('/') {
                Some(slash) => (format!("{scheme}://{}", &rest[..slash]), &rest[slash..]),
                None => return format!("{url}/"),
            },
            None => (String::new(), url),
        };
        let mut parts: Vec<&str> = path.split('/').collect();
        match parts.last_mut() {
            Some(last) if last.contains('.') => *last = "",
            _ => parts.push(""),
        }
        let stripped = format!("{prefix}{}", parts.join("/"));
        if stripped.is_empty() {
            return "/".to_string();
        }
        stripped
    }

    /// Split the example URL into host and path templates
    pub fn export(&self) -> Result<CdnHost> {
        let stripped = Self::strip_filename(&self.swagger_ui);
        let url = Url::parse(&stripped).map_err(|_| Error::invalid_url(&self.swagger_ui))?;
        let hostname = match url.host_str() {
            Some(host) if !host.is_empty() && !url.scheme().is_empty() => host,
            _ => return Err(Error::invalid_url(&self.swagger_ui)),
        };

        let parts: Vec<&str> = url.path().split('/').collect();
        let (shared, swagger) = match parts.iter().position(|p| SWAGGER_DIR.is_match(p)) {
            Some(index) => (parts[..index].join("/"), format!("/{}", parts[index..].join("/"))),
            None => {
                let last = parts.len() - 1;
                (parts[..last].join("/"), format!("/{}", parts[last]))
            }
        };
        let authority = match url.port() {
            Some(port) => format!("{hostname}:{port}"),
            None => hostname.to_string(),
        };
        let host = format!("{}://{authority}{shared}", url.scheme());
        let swagger = SEMVER.replace_all(&swagger, VERSION_PLACEHOLDER).into_owned();

        let redoc = match &self.redoc {
            ReferenceHint::Official => String::new(),
            ReferenceHint::Default => DEFAULT_REDOC_PATH.to_string(),
            ReferenceHint::Path(path) if path.is_empty() || path.ends_with('/') => path.clone(),
            ReferenceHint::Path(path) => Self::strip_filename(path),
        };
        Ok(CdnHost::with_paths(host, AssetPath::new(swagger, redoc)))
    }
}

impl TryFrom<CdnHostItem> for CdnHost {
    type Error = Error;

    fn try_from(item: CdnHostItem) -> Result<Self> {
        item.export()
    }
}
