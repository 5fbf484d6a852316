//! Resolved asset locations for the documentation pages

use serde::{Deserialize, Serialize};

/// File name of the Swagger UI stylesheet
pub const SWAGGER_CSS: &str = "swagger-ui.css";

/// File name of the Swagger UI script bundle
pub const SWAGGER_JS: &str = "swagger-ui-bundle.js";

/// File name of the ReDoc standalone script
pub const REDOC_JS: &str = "redoc.standalone.js";

/// URLs of the assets needed to render Swagger UI and ReDoc
///
/// Every URL is either absolute (`https://host/...`) or root-relative
/// (`/static/...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetUrls {
    /// URL of `swagger-ui.css`
    pub css: String,
    /// URL of `swagger-ui-bundle.js`
    pub js: String,
    /// URL of `redoc.standalone.js`
    pub redoc: String,
    /// URL of `favicon.png` / `favicon.ico`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

impl AssetUrls {
    /// Create asset URLs without a favicon
    pub fn new(css: impl Into<String>, js: impl Into<String>, redoc: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            js: js.into(),
            redoc: redoc.into(),
            favicon: None,
        }
    }

    /// Set the favicon URL
    #[must_use]
    pub fn with_favicon(mut self, favicon: Option<impl Into<String>>) -> Self {
        self.favicon = favicon.map(Into::into);
        self
    }

    /// Return a copy whose root-relative URLs live under `root_path`
    ///
    /// URLs that already start with `root_path` are left alone, so applying
    /// this twice is the same as applying it once. Absolute URLs are never
    /// touched.
    #[must_use]
    pub fn with_root_path(&self, root_path: &str) -> Self {
        let root = root_path.trim_end_matches('/');
        let mut urls = self.clone();
        if root.is_empty() {
            return urls;
        }
        for url in [&mut urls.css, &mut urls.js, &mut urls.redoc] {
            prefix_root(url, root);
        }
        if let Some(favicon) = urls.favicon.as_mut() {
            prefix_root(favicon, root);
        }
        urls
    }

    /// The three cacheable URLs in cache-file order
    pub fn cacheable(&self) -> [&str; 3] {
        [&self.css, &self.js, &self.redoc]
    }
}

fn prefix_root(url: &mut String, root: &str) {
    if url.starts_with('/') && !url.starts_with(root) {
        url.insert_str(0, root);
    }
}
