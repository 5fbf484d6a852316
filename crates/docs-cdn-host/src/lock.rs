//! Access gates in front of the documentation pages
//!
//! A [`DocsLock`] inspects the head of a documentation request and either
//! lets it through or rejects it with a [`LockRejection`], which becomes the
//! response for that request only. Plain closures are wrapped once with
//! [`lock_fn`] or [`async_lock_fn`].
//!
//! ```
//! use docs_cdn_host::{LockRejection, lock_fn};
//!
//! let lock = lock_fn(|request| match request.header("x-docs-token") {
//!     Some("secret") => Ok(()),
//!     _ => Err(LockRejection::forbidden()),
//! });
//! # let _ = lock;
//! ```

use async_trait::async_trait;
use axum::Json;
use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use chrono::{Datelike, Local};
use serde_json::json;
use std::future::Future;
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// A lock shared by the documentation handlers
pub type SharedLock = Arc<dyn DocsLock>;

/// Head of a documentation request, as seen by a lock
#[derive(Debug, Clone)]
pub struct LockRequest {
    /// Request URI including the query string
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Peer address, when the server records it
    pub peer: Option<SocketAddr>,
}

impl LockRequest {
    /// Capture the parts a lock may look at
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            peer: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        }
    }

    /// First value of a query parameter
    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Header value as text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Whether the request comes from the loopback interface
    pub fn is_localhost(&self) -> bool {
        self.peer.is_some_and(|addr| addr.ip().is_loopback())
    }
}

/// Rejection of a documentation request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {detail}")]
pub struct LockRejection {
    status: StatusCode,
    detail: String,
}

impl LockRejection {
    /// Reject with a status and a detail message
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Reject with a status and its canonical reason as detail
    pub fn status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or_default())
    }

    /// `418 I'm a teapot`, the rejection of the query-parameter locks
    pub fn teapot() -> Self {
        Self::new(StatusCode::IM_A_TEAPOT, "I'm a Teapot")
    }

    /// `403 Forbidden`
    pub fn forbidden() -> Self {
        Self::status(StatusCode::FORBIDDEN)
    }

    /// Status code of the response
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Detail message of the response
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl Default for LockRejection {
    fn default() -> Self {
        Self::teapot()
    }
}

impl IntoResponse for LockRejection {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Access check run before a documentation page is rendered
#[async_trait]
pub trait DocsLock: Send + Sync {
    /// Let the request through or reject it
    async fn check(&self, request: &LockRequest) -> Result<(), LockRejection>;
}

struct FnLock<F>(F);

#[async_trait]
impl<F> DocsLock for FnLock<F>
where
    F: Fn(&LockRequest) -> Result<(), LockRejection> + Send + Sync,
{
    async fn check(&self, request: &LockRequest) -> Result<(), LockRejection> {
        (self.0)(request)
    }
}

struct AsyncFnLock<F>(F);

#[async_trait]
impl<F, Fut> DocsLock for AsyncFnLock<F>
where
    F: Fn(LockRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), LockRejection>> + Send,
{
    async fn check(&self, request: &LockRequest) -> Result<(), LockRejection> {
        (self.0)(request.clone()).await
    }
}

/// Wrap a synchronous check as a lock
pub fn lock_fn<F>(check: F) -> SharedLock
where
    F: Fn(&LockRequest) -> Result<(), LockRejection> + Send + Sync + 'static,
{
    Arc::new(FnLock(check))
}

/// Wrap an asynchronous check as a lock
pub fn async_lock_fn<F, Fut>(check: F) -> SharedLock
where
    F: Fn(LockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), LockRejection>> + Send + 'static,
{
    Arc::new(AsyncFnLock(check))
}

/// Validation applied to the value of a lock's query parameter
pub trait ParamRule: Send + Sync + 'static {
    /// Parameter name used when none is given
    const PARAM: &'static str;

    /// Whether `value` unlocks the page
    fn validate(value: &str) -> bool;
}

/// Any non-empty value
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyValue;

impl ParamRule for AnyValue {
    const PARAM: &'static str = "a";

    fn validate(_value: &str) -> bool {
        true
    }
}

/// Today's weekday name, e.g. `Monday`, case-insensitive
#[derive(Debug, Clone, Copy, Default)]
pub struct TodayWeekday;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

impl ParamRule for TodayWeekday {
    const PARAM: &'static str = "day";

    fn validate(value: &str) -> bool {
        let today = Local::now().weekday().num_days_from_monday() as usize;
        WEEKDAYS[today].eq_ignore_ascii_case(value)
    }
}

/// Today's date as `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, Default)]
pub struct TodayDate;

impl ParamRule for TodayDate {
    const PARAM: &'static str = "day";

    fn validate(value: &str) -> bool {
        value == Local::now().date_naive().to_string()
    }
}

/// Lock requiring a query parameter whose value passes a [`ParamRule`]
///
/// Requests from the loopback interface pass unchecked unless
/// [`Self::with_exclude_localhost`] turns that off. The peer address is only
/// known when the server is run with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Debug, Clone)]
pub struct QueryLock<R> {
    name: String,
    exclude_localhost: bool,
    rule: PhantomData<fn() -> R>,
}

/// Requires the parameter `a` with any value
pub type ParamLock = QueryLock<AnyValue>;

/// Requires `day` to be today's weekday name
pub type WeekdayLock = QueryLock<TodayWeekday>;

/// Requires `day` to be today's date
pub type TodayLock = QueryLock<TodayDate>;

impl<R: ParamRule> Default for QueryLock<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ParamRule> QueryLock<R> {
    /// Lock on the rule's default parameter
    pub fn new() -> Self {
        Self {
            name: R::PARAM.to_string(),
            exclude_localhost: true,
            rule: PhantomData,
        }
    }

    /// Use another parameter name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether loopback requests skip the check
    #[must_use]
    pub fn with_exclude_localhost(mut self, exclude: bool) -> Self {
        self.exclude_localhost = exclude;
        self
    }

    /// Name of the required parameter
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Share the lock with the documentation handlers
    pub fn shared(self) -> SharedLock {
        Arc::new(self)
    }

    fn verify(&self, request: &LockRequest) -> Result<(), LockRejection> {
        if self.exclude_localhost && request.is_localhost() {
            return Ok(());
        }
        match request.query(&self.name) {
            Some(value) if !value.is_empty() && R::validate(&value) => Ok(()),
            _ => {
                debug!("Docs request rejected, parameter {:?} missing or invalid", self.name);
                Err(LockRejection::teapot())
            }
        }
    }
}

#[async_trait]
impl<R: ParamRule> DocsLock for QueryLock<R> {
    async fn check(&self, request: &LockRequest) -> Result<(), LockRejection> {
        self.verify(request)
    }
}
