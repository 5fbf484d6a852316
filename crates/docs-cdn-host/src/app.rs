//! Application route table with documentation settings
//!
//! [`DocsApp`] is an ordered map from path to [`Route`]. Routes can be
//! replaced in place by key, which keeps their position, and the table turns
//! into an [`axum::Router`] once patching is done.

use crate::asset::AssetUrls;
use crate::candidate::CdnHost;
use crate::config::RaceConfig;
use crate::lock::{LockRequest, SharedLock};
use crate::render::{PageSettings, oauth2_redirect_html};
use axum::extract::{NestedPath, Request};
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{MethodRouter, get};
use axum::{Json, Router};
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Default title of an application
pub const DEFAULT_TITLE: &str = "API";

/// Default OpenAPI document path
pub const DEFAULT_OPENAPI_URL: &str = "/openapi.json";

/// Default Swagger UI path
pub const DEFAULT_DOCS_URL: &str = "/docs";

/// Default ReDoc path
pub const DEFAULT_REDOC_URL: &str = "/redoc";

/// Default OAuth2 redirect path of Swagger UI
pub const DEFAULT_OAUTH2_REDIRECT_URL: &str = "/docs/oauth2-redirect";

/// One of the two documentation pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocsPage {
    /// Interactive API explorer
    SwaggerUi,
    /// Reference viewer
    Redoc,
}

/// Entry of the route table
#[derive(Debug, Clone)]
pub enum Route {
    /// Request handler
    Endpoint {
        /// Handler for the path
        handler: MethodRouter,
        /// Whether the path is listed in the OpenAPI document
        include_in_schema: bool,
    },
    /// The OpenAPI document of the application
    OpenApi,
    /// Directory served as static content
    Static {
        /// Directory on disk
        dir: PathBuf,
    },
    /// Nested sub-application
    Mount(Box<DocsApp>),
}

/// Directory served as static content, with its full URL prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMount {
    /// URL prefix including the prefixes of enclosing mounts
    pub path: String,
    /// Directory on disk
    pub dir: PathBuf,
}

/// An application with documentation pages
#[derive(Debug, Clone)]
pub struct DocsApp {
    title: String,
    version: String,
    openapi_url: Option<String>,
    docs_url: Option<String>,
    redoc_url: Option<String>,
    oauth2_redirect_url: Option<String>,
    init_oauth: Option<Value>,
    swagger_ui_parameters: Option<Map<String, Value>>,
    root_path: String,
    routes: IndexMap<String, Route>,
}

impl Default for DocsApp {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DocsApp {
    /// Application with default documentation routes
    pub fn new(title: impl Into<String>) -> Self {
        Self::builder().title(title).build()
    }

    /// Create a builder for the documentation settings
    pub fn builder() -> DocsAppBuilder {
        DocsAppBuilder::new()
    }

    /// Application title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Path of the OpenAPI document, `None` when disabled
    pub fn openapi_url(&self) -> Option<&str> {
        self.openapi_url.as_deref()
    }

    /// Path of the Swagger UI page, `None` when disabled
    pub fn docs_url(&self) -> Option<&str> {
        self.docs_url.as_deref()
    }

    /// Path of the ReDoc page, `None` when disabled
    pub fn redoc_url(&self) -> Option<&str> {
        self.redoc_url.as_deref()
    }

    /// Prefix the application is served under behind a proxy
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Whether any documentation page is served
    pub fn is_docs_enabled(&self) -> bool {
        self.openapi_url.is_some() && (self.docs_url.is_some() || self.redoc_url.is_some())
    }

    /// Path of a documentation page
    pub fn page_url(&self, page: DocsPage) -> Option<&str> {
        match page {
            DocsPage::SwaggerUi => self.docs_url(),
            DocsPage::Redoc => self.redoc_url(),
        }
    }

    /// Settings the documentation pages are rendered with
    pub fn page_settings(&self) -> PageSettings {
        PageSettings {
            title: self.title.clone(),
            openapi_url: self.openapi_url.clone().unwrap_or_default(),
            oauth2_redirect_url: self.oauth2_redirect_url.clone(),
            init_oauth: self.init_oauth.clone(),
            swagger_ui_parameters: self.swagger_ui_parameters.clone(),
        }
    }

    /// Add a handler listed in the OpenAPI document
    #[must_use]
    pub fn route(mut self, path: &str, handler: MethodRouter) -> Self {
        self.insert(path, Route::Endpoint {
            handler,
            include_in_schema: true,
        });
        self
    }

    /// Add a handler left out of the OpenAPI document
    #[must_use]
    pub fn route_hidden(mut self, path: &str, handler: MethodRouter) -> Self {
        self.insert(path, Route::Endpoint {
            handler,
            include_in_schema: false,
        });
        self
    }

    /// Nest a sub-application under `path`
    #[must_use]
    pub fn mount(mut self, path: &str, app: Self) -> Self {
        self.insert(path, Route::Mount(Box::new(app)));
        self
    }

    /// Serve a directory under `path`
    #[must_use]
    pub fn mount_dir(mut self, path: &str, dir: impl Into<PathBuf>) -> Self {
        self.insert(path, Route::Static { dir: dir.into() });
        self
    }

    /// Insert or replace a route, keeping the position of an existing one
    pub fn insert(&mut self, path: &str, route: Route) -> Option<Route> {
        self.routes.insert(path.to_string(), route)
    }

    /// Replace the handler of an existing route in place
    ///
    /// Returns `false`, leaving the table untouched, when `path` is unknown.
    pub fn replace_endpoint(
        &mut self,
        path: &str,
        handler: MethodRouter,
        include_in_schema: bool,
    ) -> bool {
        match self.routes.get_mut(path) {
            Some(route) => {
                *route = Route::Endpoint {
                    handler,
                    include_in_schema,
                };
                true
            }
            None => false,
        }
    }

    /// Whether a route with exactly this path exists
    pub fn has_route(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    /// Routes in declaration order
    pub fn routes(&self) -> &IndexMap<String, Route> {
        &self.routes
    }

    /// Paths of the routes in declaration order
    pub fn paths(&self) -> Vec<&str> {
        self.routes.keys().map(String::as_str).collect()
    }

    /// Every directory served as static content, including sub-applications
    pub fn static_dirs(&self) -> Vec<StaticMount> {
        let mut mounts = Vec::new();
        self.collect_static_dirs("", &mut mounts);
        mounts
    }

    fn collect_static_dirs(&self, prefix: &str, mounts: &mut Vec<StaticMount>) {
        for (path, route) in &self.routes {
            let full = join_paths(prefix, path);
            match route {
                Route::Static { dir } => mounts.push(StaticMount {
                    path: full,
                    dir: dir.clone(),
                }),
                Route::Mount(app) => app.collect_static_dirs(&full, mounts),
                Route::Endpoint { .. } | Route::OpenApi => {}
            }
        }
    }

    /// OpenAPI document listing the schema-visible paths
    pub fn openapi_document(&self) -> Value {
        let paths: Map<String, Value> = self
            .routes
            .iter()
            .filter(|(_, route)| {
                matches!(
                    route,
                    Route::Endpoint {
                        include_in_schema: true,
                        ..
                    }
                )
            })
            .map(|(path, _)| (path.clone(), json!({})))
            .collect();
        let mut document = json!({
            "openapi": "3.1.0",
            "info": {"title": self.title, "version": self.version},
            "paths": paths,
        });
        if !self.root_path.is_empty() {
            document["servers"] = json!([{"url": self.root_path}]);
        }
        document
    }

    /// Build the router, with request tracing
    pub fn into_router(self) -> Router {
        self.build_router().layer(TraceLayer::new_for_http())
    }

    fn build_router(self) -> Router {
        let document = self.openapi_document();
        let mut router = Router::new();
        for (path, route) in self.routes {
            router = match route {
                Route::Endpoint { handler, .. } => router.route(&path, handler),
                Route::OpenApi => {
                    let document = document.clone();
                    router.route(&path, get(move || async move { Json(document) }))
                }
                Route::Static { dir } if path == "/" => router.fallback_service(ServeDir::new(dir)),
                Route::Static { dir } => router.nest_service(&path, ServeDir::new(dir)),
                Route::Mount(app) if path == "/" => router.merge(app.build_router()),
                Route::Mount(app) => router.nest(&path, app.build_router()),
            };
        }
        router
    }
}

/// Builder for [`DocsApp`]
#[derive(Debug, Clone)]
pub struct DocsAppBuilder {
    title: String,
    version: String,
    openapi_url: Option<String>,
    docs_url: Option<String>,
    redoc_url: Option<String>,
    oauth2_redirect_url: Option<String>,
    init_oauth: Option<Value>,
    swagger_ui_parameters: Option<Map<String, Value>>,
    root_path: String,
}

impl Default for DocsAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocsAppBuilder {
    /// Create a builder with the default documentation routes
    pub fn new() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            version: "0.1.0".to_string(),
            openapi_url: Some(DEFAULT_OPENAPI_URL.to_string()),
            docs_url: Some(DEFAULT_DOCS_URL.to_string()),
            redoc_url: Some(DEFAULT_REDOC_URL.to_string()),
            oauth2_redirect_url: Some(DEFAULT_OAUTH2_REDIRECT_URL.to_string()),
            init_oauth: None,
            swagger_ui_parameters: None,
            root_path: String::new(),
        }
    }

    /// Set the title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the API version shown in the OpenAPI document
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set or disable the OpenAPI document path
    #[must_use]
    pub fn openapi_url(mut self, url: Option<&str>) -> Self {
        self.openapi_url = url.map(str::to_string);
        self
    }

    /// Set or disable the Swagger UI path
    #[must_use]
    pub fn docs_url(mut self, url: Option<&str>) -> Self {
        self.docs_url = url.map(str::to_string);
        self
    }

    /// Set or disable the ReDoc path
    #[must_use]
    pub fn redoc_url(mut self, url: Option<&str>) -> Self {
        self.redoc_url = url.map(str::to_string);
        self
    }

    /// Set or disable the OAuth2 redirect path of Swagger UI
    #[must_use]
    pub fn oauth2_redirect_url(mut self, url: Option<&str>) -> Self {
        self.oauth2_redirect_url = url.map(str::to_string);
        self
    }

    /// Set the options passed to `ui.initOAuth`
    #[must_use]
    pub fn init_oauth(mut self, options: Value) -> Self {
        self.init_oauth = Some(options);
        self
    }

    /// Set extra Swagger UI parameters
    #[must_use]
    pub fn swagger_ui_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.swagger_ui_parameters = Some(parameters);
        self
    }

    /// Set the prefix the application is served under behind a proxy
    #[must_use]
    pub fn root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = root_path.into();
        self
    }

    /// Build the application and register its documentation routes
    pub fn build(self) -> DocsApp {
        let mut app = DocsApp {
            title: self.title,
            version: self.version,
            openapi_url: self.openapi_url,
            docs_url: self.docs_url,
            redoc_url: self.redoc_url,
            oauth2_redirect_url: self.oauth2_redirect_url,
            init_oauth: self.init_oauth,
            swagger_ui_parameters: self.swagger_ui_parameters,
            root_path: self.root_path,
            routes: IndexMap::new(),
        };
        let Some(openapi_url) = app.openapi_url.clone() else {
            return app;
        };
        app.insert(&openapi_url, Route::OpenApi);

        let urls = default_asset_urls();
        for page in [DocsPage::SwaggerUi, DocsPage::Redoc] {
            let Some(path) = app.page_url(page).map(str::to_string) else {
                continue;
            };
            let handler = page_handler(&app, page, urls.clone(), None);
            app.insert(&path, Route::Endpoint {
                handler,
                include_in_schema: false,
            });
            if page == DocsPage::SwaggerUi
                && let Some(redirect) = app.oauth2_redirect_url.clone()
            {
                app.insert(&redirect, Route::Endpoint {
                    handler: get(|| async { Html(oauth2_redirect_html()) }),
                    include_in_schema: false,
                });
            }
        }
        app
    }
}

/// Asset URLs of unpatched documentation pages
pub fn default_asset_urls() -> AssetUrls {
    CdnHost::jsdelivr().asset_urls(&RaceConfig::default(), None)
}

/// Root path of a request: the configured prefix plus the nesting path
pub fn request_root_path(app_root: &str, parts: &Parts) -> String {
    let nested = parts
        .extensions
        .get::<NestedPath>()
        .map_or("", NestedPath::as_str);
    format!(
        "{}{}",
        app_root.trim_end_matches('/'),
        nested.trim_end_matches('/')
    )
}

/// Handler rendering a documentation page of `app` with `urls`
pub fn page_handler(
    app: &DocsApp,
    page: DocsPage,
    urls: AssetUrls,
    lock: Option<SharedLock>,
) -> MethodRouter {
    let handler = PageHandler {
        page,
        settings: Arc::new(app.page_settings()),
        urls: Arc::new(urls),
        root_path: Arc::from(app.root_path()),
        lock,
    };
    get(move |request: Request| handler.respond(request))
}

#[derive(Clone)]
struct PageHandler {
    page: DocsPage,
    settings: Arc<PageSettings>,
    urls: Arc<AssetUrls>,
    root_path: Arc<str>,
    lock: Option<SharedLock>,
}

impl PageHandler {
    async fn respond(self, request: Request) -> Response {
        let (parts, _body) = request.into_parts();
        if let Some(lock) = &self.lock
            && let Err(rejection) = lock.check(&LockRequest::from_parts(&parts)).await
        {
            return rejection.into_response();
        }
        let root = request_root_path(&self.root_path, &parts);
        let urls = self.urls.with_root_path(&root);
        let html = match self.page {
            DocsPage::SwaggerUi => self.settings.swagger_ui(&urls, &root),
            DocsPage::Redoc => self.settings.redoc(&urls, &root),
        };
        Html(html).into_response()
    }
}

fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path == "/" {
        if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }
    } else {
        format!("{prefix}{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_routes_in_order() {
        let app = DocsApp::new("Items");
        assert_eq!(
            app.paths(),
            vec!["/openapi.json", "/docs", "/docs/oauth2-redirect", "/redoc"]
        );
        assert!(app.is_docs_enabled());
    }

    #[test]
    fn test_disabled_docs_register_nothing() {
        let app = DocsApp::builder().openapi_url(None).build();
        assert!(app.paths().is_empty());
        assert!(!app.is_docs_enabled());

        let app = DocsApp::builder().docs_url(None).redoc_url(None).build();
        assert_eq!(app.paths(), vec!["/openapi.json"]);
        assert!(!app.is_docs_enabled());
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut app = DocsApp::new("Items").route("/items", get(|| async { "[]" }));
        assert!(app.replace_endpoint("/docs", get(|| async { "patched" }), false));
        assert!(!app.replace_endpoint("/missing", get(|| async { "" }), false));
        assert_eq!(
            app.paths(),
            vec![
                "/openapi.json",
                "/docs",
                "/docs/oauth2-redirect",
                "/redoc",
                "/items"
            ]
        );
    }

    #[test]
    fn test_static_dirs_include_sub_applications() {
        let sub = DocsApp::new("Sub").mount_dir("/assets", "sub/assets");
        let app = DocsApp::new("Main")
            .mount_dir("/static", "static")
            .mount("/sub", sub);
        assert_eq!(
            app.static_dirs(),
            vec![
                StaticMount {
                    path: "/static".into(),
                    dir: "static".into()
                },
                StaticMount {
                    path: "/sub/assets".into(),
                    dir: "sub/assets".into()
                },
            ]
        );
    }

    #[test]
    fn test_openapi_document_lists_visible_routes() {
        let app = DocsApp::builder()
            .title("Items")
            .root_path("/api")
            .build()
            .route("/items", get(|| async { "[]" }))
            .route_hidden("/internal", get(|| async { "" }));
        let document = app.openapi_document();
        assert_eq!(document["info"]["title"], "Items");
        assert!(document["paths"].get("/items").is_some());
        assert!(document["paths"].get("/internal").is_none());
        assert!(document["paths"].get("/docs").is_none());
        assert_eq!(document["servers"][0]["url"], "/api");
    }

    #[test]
    fn test_request_root_path_without_nesting() {
        let (parts, ()) = axum::http::Request::new(()).into_parts();
        assert_eq!(request_root_path("", &parts), "");
        assert_eq!(request_root_path("/proxy/", &parts), "/proxy");
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("", "/static"), "/static");
        assert_eq!(join_paths("/sub", "/static"), "/sub/static");
        assert_eq!(join_paths("/sub", "/"), "/sub");
        assert_eq!(join_paths("", "/"), "/");
    }
}
