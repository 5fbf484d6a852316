//! Serve Swagger UI and ReDoc assets from the best available location
//!
//! Documentation pages of an API usually pull their stylesheet and scripts
//! from one hardcoded public CDN. This crate decides where those assets come
//! from and rewires the two documentation routes to use them:
//!
//! - Local files found in the application's static directories
//! - An explicit host, such as a private mirror
//! - The fastest of several CDNs, raced concurrently and cached on disk
//! - Fully resolved URLs given by the caller
//!
//! Both pages can be put behind a [`DocsLock`].
//!
//! # Example
//!
//! ```no_run
//! use axum::routing::get;
//! use docs_cdn_host::{DocsApp, PatchOptions, patch_docs};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut app = DocsApp::new("Items").route("/items", get(|| async { "[]" }));
//!
//! // Race the public CDNs, or use ./static when it holds Swagger UI files
//! patch_docs(&mut app, PatchOptions::new())?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app.into_router()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Private mirrors
//!
//! ```
//! use docs_cdn_host::{CdnHostItem, PatchOptions, ReferenceHint};
//!
//! let mirror = CdnHostItem::new("https://mirror.example.com/swagger-ui/5.17.14/swagger-ui.css")
//!     .with_redoc(ReferenceHint::Default)
//!     .export()?;
//! let options = PatchOptions::new().source(mirror).favicon("/static/favicon.png");
//! # let _ = options;
//! # Ok::<(), docs_cdn_host::Error>(())
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

pub mod app;
mod asset;
pub mod cache;
mod candidate;
pub mod config;
mod docs;
mod error;
pub mod local;
pub mod lock;
mod normalize;
pub mod probe;
pub mod render;
pub mod resolve;

pub use app::{DocsApp, DocsAppBuilder, DocsPage, Route, StaticMount};
pub use asset::{AssetUrls, REDOC_JS, SWAGGER_CSS, SWAGGER_JS};
pub use cache::UrlCache;
pub use candidate::{AssetPath, CdnCatalog, CdnHost, OFFICIAL_REDOC, VERSION_PLACEHOLDER};
pub use config::RaceConfig;
pub use docs::{PatchOptions, patch_docs, patch_docs_async};
pub use error::{Error, Result};
pub use local::{StaticDiscovery, mount_static};
pub use lock::{
    DocsLock, LockRejection, LockRequest, ParamLock, SharedLock, TodayLock, WeekdayLock,
    async_lock_fn, lock_fn,
};
pub use normalize::{CdnHostItem, DEFAULT_REDOC_PATH, ReferenceHint};
pub use probe::{EarlyStop, ProbeOptions, Prober, ResponseCache};
pub use resolve::{CdnSource, Resolver};
