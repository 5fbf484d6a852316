//! Discovery of asset files already present on disk
//!
//! A directory qualifies when a `swagger-ui*.css` file exists anywhere below
//! it. For every asset the most recently modified match wins; a missing
//! script or ReDoc bundle is assumed to sit next to the stylesheet.

use crate::Result;
use crate::app::{DocsApp, Route};
use crate::asset::{AssetUrls, REDOC_JS, SWAGGER_JS};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Route under which discovered directories are mounted by default
pub const DEFAULT_STATIC_PATH: &str = "/static";

/// Conventional static directory, relative to the working directory
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Scanner for local Swagger UI and ReDoc files
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    root: Option<PathBuf>,
    favicon: Option<String>,
    mount_path: Option<String>,
}

impl StaticDiscovery {
    /// Scan the application's static mounts, or `./static` without any
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan only this directory tree
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Use this favicon instead of looking for one
    #[must_use]
    pub fn with_favicon(mut self, favicon: Option<String>) -> Self {
        self.favicon = favicon;
        self
    }

    /// Route for mounting a directory no existing mount serves
    #[must_use]
    pub fn with_mount_path(mut self, path: impl Into<String>) -> Self {
        self.mount_path = Some(path.into());
        self
    }

    /// Find asset files and return the URLs serving them
    ///
    /// May mount the matching directory on `app`.
    pub fn discover(&self, app: &mut DocsApp) -> Option<AssetUrls> {
        if let Some(root) = &self.root {
            return self.scan_and_mount(app, root);
        }
        let mounts = app.static_dirs();
        if mounts.is_empty() {
            let root = Path::new(DEFAULT_STATIC_DIR);
            if root.is_dir() {
                return self.scan_and_mount(app, root);
            }
            debug!("No static mounts and no {DEFAULT_STATIC_DIR} directory");
            return None;
        }
        mounts.iter().find_map(|mount| {
            let files = AssetFiles::scan(&mount.dir)?;
            info!("Using local files in {} to serve docs assets.", mount.dir.display());
            Some(files.urls(&mount.dir, &mount.path, self.favicon.clone()))
        })
    }

    fn scan_and_mount(&self, app: &mut DocsApp, root: &Path) -> Option<AssetUrls> {
        let files = AssetFiles::scan(root)?;
        info!("Using local files in {} to serve docs assets.", root.display());
        let uri_path = served_by(app, root).unwrap_or_else(|| {
            let path = self.mount_path.as_deref().unwrap_or(DEFAULT_STATIC_PATH);
            auto_mount(app, root, path)
        });
        Some(files.urls(root, &uri_path, self.favicon.clone()))
    }
}

/// Newest asset files found below one directory
#[derive(Debug, Clone, PartialEq, Eq)]
struct AssetFiles {
    css: PathBuf,
    js: PathBuf,
    redoc: PathBuf,
    favicon: Option<PathBuf>,
}

impl AssetFiles {
    fn scan(root: &Path) -> Option<Self> {
        let files: Vec<(PathBuf, SystemTime)> = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .flatten()
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let modified = entry.metadata().ok()?.modified().ok()?;
                Some((entry.into_path(), modified))
            })
            .collect();
        let newest = |matches: &dyn Fn(&str) -> bool| -> Option<PathBuf> {
            let mut best: Option<&(PathBuf, SystemTime)> = None;
            for file in &files {
                let name = file.0.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                if matches(name) && best.is_none_or(|b| file.1 > b.1) {
                    best = Some(file);
                }
            }
            best.map(|(path, _)| path.clone())
        };

        let css = newest(&|name| name.starts_with("swagger-ui") && name.ends_with(".css"))?;
        let js = newest(&|name| name.starts_with("swagger-ui") && name.ends_with(".js"))
            .unwrap_or_else(|| css.with_file_name(SWAGGER_JS));
        let redoc =
            newest(&|name| name == REDOC_JS).unwrap_or_else(|| css.with_file_name(REDOC_JS));
        let favicon = newest(&|name| name == "favicon.png")
            .or_else(|| newest(&|name| name == "favicon.ico"));
        Some(Self {
            css,
            js,
            redoc,
            favicon,
        })
    }

    fn urls(&self, root: &Path, uri_path: &str, favicon: Option<String>) -> AssetUrls {
        let favicon = favicon.or_else(|| {
            self.favicon
                .as_deref()
                .map(|file| file_to_uri(file, root, uri_path))
        });
        AssetUrls::new(
            file_to_uri(&self.css, root, uri_path),
            file_to_uri(&self.js, root, uri_path),
            file_to_uri(&self.redoc, root, uri_path),
        )
        .with_favicon(favicon)
    }
}

/// URL serving `file` when `root` is mounted at `uri_path`
pub(crate) fn file_to_uri(file: &Path, root: &Path, uri_path: &str) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("{}/{}", uri_path.trim_end_matches('/'), parts.join("/"))
}

/// Route of an existing static mount serving `dir`
fn served_by(app: &DocsApp, dir: &Path) -> Option<String> {
    let wanted = fs::canonicalize(dir).ok()?;
    app.static_dirs()
        .into_iter()
        .find(|mount| fs::canonicalize(&mount.dir).is_ok_and(|d| d == wanted))
        .map(|mount| mount.path)
}

/// Mount `dir` at `uri_path` unless a route with that path exists
pub(crate) fn auto_mount(app: &mut DocsApp, dir: &Path, uri_path: &str) -> String {
    if !app.has_route(uri_path) {
        let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
        info!("Auto mount static files to {uri_path} from {}", dir.display());
        app.insert(uri_path, Route::Static { dir });
    }
    uri_path.to_string()
}

/// Mount a directory as static content
///
/// The route defaults to `/` followed by the directory name. An existing
/// route with the same path is left alone. With `auto_mkdir` a missing
/// directory is created first. Returns the route path.
pub fn mount_static(
    app: &mut DocsApp,
    root: impl AsRef<Path>,
    uri_path: Option<&str>,
    auto_mkdir: bool,
) -> Result<String> {
    let root = std::path::absolute(root.as_ref())?;
    if auto_mkdir && !root.exists() {
        fs::create_dir_all(&root)?;
        info!("{} created", root.display());
    }
    let uri_path = match uri_path {
        Some(path) if path.starts_with('/') => path.to_string(),
        Some(path) => format!("/{path}"),
        None => {
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("/{name}")
        }
    };
    Ok(auto_mount(app, &root, &uri_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str, age: Duration) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, relative).unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[test]
    fn test_scan_requires_stylesheet() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "redoc.standalone.js", Duration::ZERO);
        assert_eq!(AssetFiles::scan(dir.path()), None);
    }

    #[test]
    fn test_missing_scripts_are_synthesized() {
        let dir = TempDir::new().unwrap();
        let css = touch(dir.path(), "ui/swagger-ui.css", Duration::ZERO);
        let files = AssetFiles::scan(dir.path()).unwrap();
        assert_eq!(files.css, css);
        assert_eq!(files.js, dir.path().join("ui").join(SWAGGER_JS));
        assert_eq!(files.redoc, dir.path().join("ui").join(REDOC_JS));
        assert_eq!(files.favicon, None);
    }

    #[test]
    fn test_newest_match_wins_across_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/swagger-ui.css", Duration::from_secs(600));
        let css = touch(dir.path(), "b/swagger-ui.css", Duration::ZERO);
        let js = touch(dir.path(), "a/swagger-ui-bundle.js", Duration::ZERO);
        touch(dir.path(), "b/swagger-ui-bundle.js", Duration::from_secs(600));

        let files = AssetFiles::scan(dir.path()).unwrap();
        assert_eq!(files.css, css);
        assert_eq!(files.js, js);
        assert_eq!(files.redoc, dir.path().join("b").join(REDOC_JS));
    }

    #[test]
    fn test_png_favicon_preferred_over_ico() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "swagger-ui.css", Duration::ZERO);
        touch(dir.path(), "favicon.ico", Duration::ZERO);
        let png = touch(dir.path(), "img/favicon.png", Duration::from_secs(600));
        assert_eq!(AssetFiles::scan(dir.path()).unwrap().favicon, Some(png));
    }

    #[test]
    fn test_file_to_uri() {
        let root = Path::new("/srv/static");
        assert_eq!(
            file_to_uri(&root.join("swagger-ui/swagger-ui.css"), root, "/static/"),
            "/static/swagger-ui/swagger-ui.css"
        );
    }

    #[test]
    fn test_discover_explicit_root_mounts_it() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "swagger-ui.css", Duration::ZERO);
        touch(dir.path(), "swagger-ui-bundle.js", Duration::ZERO);
        let mut app = DocsApp::new("Items");
        let urls = StaticDiscovery::new()
            .with_root(dir.path())
            .discover(&mut app)
            .unwrap();
        assert_eq!(urls.css, "/static/swagger-ui.css");
        assert_eq!(urls.js, "/static/swagger-ui-bundle.js");
        assert_eq!(urls.redoc, "/static/redoc.standalone.js");
        assert!(matches!(app.routes().get("/static"), Some(Route::Static { .. })));
    }

    #[test]
    fn test_discover_mounts_at_custom_path() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "swagger-ui.css", Duration::ZERO);
        let mut app = DocsApp::new("Items");
        let urls = StaticDiscovery::new()
            .with_root(dir.path())
            .with_mount_path("/docs-assets")
            .discover(&mut app)
            .unwrap();
        assert_eq!(urls.css, "/docs-assets/swagger-ui.css");
        assert!(app.has_route("/docs-assets"));
        assert!(!app.has_route("/static"));
    }

    #[test]
    fn test_discover_uses_existing_mount() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "swagger-ui.css", Duration::ZERO);
        let mut app = DocsApp::new("Items").mount_dir("/assets", dir.path());
        let urls = StaticDiscovery::new()
            .with_favicon(Some("/logo.png".into()))
            .discover(&mut app)
            .unwrap();
        assert_eq!(urls.css, "/assets/swagger-ui.css");
        assert_eq!(urls.favicon.as_deref(), Some("/logo.png"));
        assert!(!app.has_route("/static"));
    }

    #[test]
    fn test_mount_static_creates_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("media");
        let mut app = DocsApp::new("Items");
        let path = mount_static(&mut app, &target, None, true).unwrap();
        assert_eq!(path, "/media");
        assert!(target.is_dir());

        let again = mount_static(&mut app, dir.path(), Some("media"), false).unwrap();
        assert_eq!(again, "/media");
        match app.routes().get("/media") {
            Some(Route::Static { dir }) => assert_eq!(dir, &target),
            other => panic!("unexpected route {other:?}"),
        }
    }
}
