//! Navigation engine.
//!
//! Each [`Router::navigate`] call runs the same state machine:
//!
//! ```text
//! Resolving ─► AcquiringPrimary ─► AcquiringAlternate ─► AcquiringViaHost
//!     │               │                    │                    │
//!     ▼ (rejected)    └────────────────────┴──────► Rendering ◄─┘
//!   Idle                                               │        │
//!                                                      ▼        ▼
//!                                                PostRender   Failed
//! ```
//!
//! Navigation errors never escape: they are reported through
//! [`NavigationOutcome`] and, once a surface is known, rendered into it as
//! an error notice.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::services::ServiceReadiness;

use super::content::{self, escape_html};
use super::document::{ContainerTarget, Document, Surface, replace_mode_for};
use super::fetch::{ContentFetcher, FetchResponse, HttpFetcher};
use super::hooks::{GlobalScope, HookRegistry, PageContext};
use super::routes::{RouteChanged, RouteTable};

// ============================================================================
// Constants
// ============================================================================

/// Document name stripped from the location to find the base directory.
const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

/// How long the host tier waits for the file service (20 × 50ms).
const DEFAULT_HOST_SERVICE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Route-changed broadcast capacity.
const DEFAULT_NOTIFICATION_CAPACITY: usize = 16;

// ============================================================================
// NavigationPhase
// ============================================================================

/// States of a single navigation, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    /// Looking up the route.
    Resolving,
    /// Fetching `{base}/{locator}`.
    AcquiringPrimary,
    /// Fetching the separator-stripped locator.
    AcquiringAlternate,
    /// Loading through the host file service.
    AcquiringViaHost,
    /// Swapping content and replaying scripts.
    Rendering,
    /// Recording the route and notifying listeners.
    PostRender,
    /// Rendering the error notice.
    Failed,
}

impl fmt::Display for NavigationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolving => "resolving",
            Self::AcquiringPrimary => "acquiring-primary",
            Self::AcquiringAlternate => "acquiring-alternate",
            Self::AcquiringViaHost => "acquiring-via-host",
            Self::Rendering => "rendering",
            Self::PostRender => "post-render",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ContentSource / NavigationOutcome
// ============================================================================

/// Which tier supplied the rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// Direct fetch against the document directory.
    Primary,
    /// Fetch of the separator-stripped locator.
    Alternate,
    /// Host file service.
    Host,
}

/// Result of a [`Router::navigate`] call.
#[derive(Debug)]
pub enum NavigationOutcome {
    /// Content was rendered and the route recorded.
    Rendered {
        /// Tier that supplied the content.
        source: ContentSource,
    },
    /// Nothing was touched: unknown route or no container.
    Rejected(Error),
    /// Every tier failed; an error notice was rendered.
    Failed(Error),
}

impl NavigationOutcome {
    /// Returns `true` if content was rendered.
    #[inline]
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }

    /// Returns the content source for rendered navigations.
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<ContentSource> {
        match self {
            Self::Rendered { source } => Some(*source),
            _ => None,
        }
    }

    /// Returns the error for rejected or failed navigations.
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Rendered { .. } => None,
            Self::Rejected(e) | Self::Failed(e) => Some(e),
        }
    }
}

// ============================================================================
// RouterOptions
// ============================================================================

/// Router configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterOptions {
    /// Index document stripped from the location to derive the base URL.
    pub index_document: String,
    /// Upper bound on waiting for the host file service.
    pub host_service_timeout: Duration,
    /// Capacity of the route-changed broadcast.
    pub notification_capacity: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index_document: DEFAULT_INDEX_DOCUMENT.to_string(),
            host_service_timeout: DEFAULT_HOST_SERVICE_TIMEOUT,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }

    /// Sets the index document name.
    #[inline]
    #[must_use]
    pub fn with_index_document(mut self, name: impl Into<String>) -> Self {
        self.index_document = name.into();
        self
    }

    /// Sets the host service wait bound.
    #[inline]
    #[must_use]
    pub fn with_host_service_timeout(mut self, limit: Duration) -> Self {
        self.host_service_timeout = limit;
        self
    }

    /// Sets the notification capacity.
    #[inline]
    #[must_use]
    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }
}

// ============================================================================
// URL Derivation
// ============================================================================

/// Strips a trailing index document from `location` to get its directory.
fn base_directory<'a>(location: &'a str, index_document: &str) -> &'a str {
    if location.ends_with(index_document) {
        return location
            .rfind('/')
            .map_or(location, |slash| &location[..slash]);
    }

    if let Some(pos) = location.rfind(&format!("/{index_document}")) {
        return &location[..pos];
    }

    location.trim_end_matches('/')
}

/// `{base}/{locator}`.
fn primary_url(location: &str, index_document: &str, locator: &str) -> String {
    format!("{}/{}", base_directory(location, index_document), locator)
}

/// The locator with one leading `/` removed, resolved against `location`.
fn alternate_url(location: &str, locator: &str) -> Result<String> {
    let relative = locator.strip_prefix('/').unwrap_or(locator);
    Ok(Url::parse(location)?.join(relative)?.into())
}

// ============================================================================
// FetchFailure
// ============================================================================

/// Why a fetch tier did not produce content.
#[derive(Debug)]
struct FetchFailure {
    status: Option<u16>,
    reason: String,
}

impl FetchFailure {
    fn from_attempt(attempt: Result<FetchResponse>) -> std::result::Result<String, Self> {
        match attempt {
            Ok(response) if response.is_ok() => Ok(response.body),
            Ok(response) => Err(Self {
                status: Some(response.status),
                reason: format!("{} ({})", response.status_text, response.status),
            }),
            Err(e) => Err(Self {
                status: None,
                reason: format!("Network error: {e}"),
            }),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

#[derive(Default)]
struct NavigationState {
    current_route: Option<String>,
    surface: Option<Arc<dyn Surface>>,
}

struct RouterInner {
    document: Arc<dyn Document>,
    fetcher: Arc<dyn ContentFetcher>,
    services: ServiceReadiness,
    hooks: HookRegistry,
    globals: GlobalScope,
    options: RouterOptions,
    routes: RwLock<RouteTable>,
    state: RwLock<NavigationState>,
    notifications: broadcast::Sender<RouteChanged>,
}

/// Fragment router for a single rendering surface.
///
/// Cheap to clone; clones share routes, state and hooks.
///
/// # Example
///
/// ```ignore
/// let router = Router::builder()
///     .document(document)
///     .services(readiness)
///     .build()?;
///
/// router.register("/home", "home.html");
/// router.set_container("app");
/// router.navigate("/home").await;
/// ```
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Router")
            .field("current_route", &state.current_route)
            .field("container", &state.surface)
            .field("routes", &self.inner.routes.read().len())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Registers `path` → `locator`, replacing any earlier mapping.
    pub fn register(&self, path: impl Into<String>, locator: impl Into<String>) {
        let (path, locator) = (path.into(), locator.into());
        debug!(%path, %locator, "Route registered");
        self.inner.routes.write().insert(path, locator);
    }

    /// Sets the rendering surface.
    ///
    /// An ID that matches no element clears the container and returns
    /// `false`.
    pub fn set_container(&self, target: impl Into<ContainerTarget>) -> bool {
        let target = target.into();
        let surface = match &target {
            ContainerTarget::Id(id) => self.inner.document.element_by_id(id),
            ContainerTarget::Body => Some(self.inner.document.body()),
            ContainerTarget::Surface(surface) => Some(Arc::clone(surface)),
        };

        if surface.is_none() {
            error!(?target, "Container not found");
        }

        let found = surface.is_some();
        self.inner.state.write().surface = surface;
        found
    }

    /// Returns the current rendering surface.
    #[must_use]
    pub fn container(&self) -> Option<Arc<dyn Surface>> {
        self.inner.state.read().surface.clone()
    }

    /// Returns the path of the last successful navigation.
    #[must_use]
    pub fn current_route(&self) -> Option<String> {
        self.inner.state.read().current_route.clone()
    }

    /// Returns a copy of the route table.
    #[must_use]
    pub fn routes(&self) -> FxHashMap<String, String> {
        self.inner.routes.read().snapshot()
    }

    /// Subscribes to route-changed notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RouteChanged> {
        self.inner.notifications.subscribe()
    }

    /// Page hook registry.
    #[inline]
    #[must_use]
    pub fn hooks(&self) -> &HookRegistry {
        &self.inner.hooks
    }

    /// Scope shared by all page hooks.
    #[inline]
    #[must_use]
    pub fn globals(&self) -> &GlobalScope {
        &self.inner.globals
    }
}

// ============================================================================
// Router - Navigation
// ============================================================================

impl Router {
    /// Navigates to `path`.
    ///
    /// Never deduplicated: navigating to the current route fetches and
    /// renders again, and re-runs its hooks.
    pub async fn navigate(&self, path: &str) -> NavigationOutcome {
        debug!(path, phase = %NavigationPhase::Resolving, "Navigating");

        let Some(locator) = self.inner.routes.read().get(path).map(str::to_string) else {
            let err = Error::route_not_found(path);
            error!(path, error = %err, "Navigation rejected");
            return NavigationOutcome::Rejected(err);
        };

        let Some(surface) = self.container() else {
            let err = Error::SurfaceNotConfigured;
            error!(path, error = %err, "Navigation rejected");
            return NavigationOutcome::Rejected(err);
        };

        match self.acquire(&locator).await {
            Ok((html, source)) => {
                self.render(path, &locator, surface.as_ref(), &html);
                self.complete(path, &locator);
                info!(path, ?source, "Navigated");
                NavigationOutcome::Rendered { source }
            }
            Err(err) => {
                error!(path, phase = %NavigationPhase::Failed, error = %err, "Navigation failed");
                surface.replace_content(&error_notice(&err), replace_mode_for(surface.as_ref()));
                NavigationOutcome::Failed(err)
            }
        }
    }

    /// Runs the three acquisition tiers in order.
    async fn acquire(&self, locator: &str) -> Result<(String, ContentSource)> {
        let location = self.inner.document.location();
        let fetcher = &self.inner.fetcher;

        let primary = primary_url(&location, &self.inner.options.index_document, locator);
        debug!(url = %primary, phase = %NavigationPhase::AcquiringPrimary, "Fetching content");

        let primary_failure = match FetchFailure::from_attempt(fetcher.fetch(&primary).await) {
            Ok(html) => {
                trace!(len = html.len(), "Loaded via primary fetch");
                return Ok((html, ContentSource::Primary));
            }
            Err(failure) => failure,
        };
        warn!(url = %primary, reason = %primary_failure.reason, "Primary fetch failed");

        let alternate_failure = match alternate_url(&location, locator) {
            Ok(alternate) => {
                debug!(url = %alternate, phase = %NavigationPhase::AcquiringAlternate, "Fetching content");
                match FetchFailure::from_attempt(fetcher.fetch(&alternate).await) {
                    Ok(html) => {
                        trace!(len = html.len(), "Loaded via alternate fetch");
                        return Ok((html, ContentSource::Alternate));
                    }
                    Err(failure) => failure,
                }
            }
            Err(e) => FetchFailure {
                status: None,
                reason: format!("Invalid alternate URL: {e}"),
            },
        };
        warn!(locator, reason = %alternate_failure.reason, "Alternate fetch failed");

        // Report the primary status if it had one, as the host shell does.
        let last = if primary_failure.status.is_some() {
            primary_failure
        } else {
            alternate_failure
        };
        let fetch_error = Error::content_fetch_failed(locator, last.status, last.reason);

        debug!(locator, phase = %NavigationPhase::AcquiringViaHost, "Loading via host");
        let service = self
            .inner
            .services
            .wait(self.inner.options.host_service_timeout)
            .await?;

        match service.load_html(locator).await {
            Ok(resource) => {
                trace!(len = resource.content.len(), "Loaded via host");
                Ok((resource.content, ContentSource::Host))
            }
            Err(cause) => Err(Error::host_fallback_failed(locator, fetch_error, cause)),
        }
    }

    /// Swaps the surface content and replays the page's scripts.
    fn render(&self, path: &str, locator: &str, surface: &dyn Surface, html: &str) {
        let page = content::prepare(html);
        debug!(
            path,
            phase = %NavigationPhase::Rendering,
            markup_len = page.markup.len(),
            scripts = page.scripts.len(),
            "Rendering"
        );

        surface.replace_content(&page.markup, replace_mode_for(surface));

        let count = page.scripts.len();
        for (index, script) in page.scripts.iter().enumerate() {
            if let Some(src) = script.src.as_deref() {
                surface.append_script(src);
                debug!(src, "External script attached");
                continue;
            }

            let Some(hook) = script.declared_hook() else {
                continue;
            };

            trace!(hook, script = index + 1, count, "Running page hook");
            let context = PageContext {
                path,
                content_locator: locator,
                surface,
                globals: &self.inner.globals,
                script_index: index,
                script_count: count,
            };

            if let Err(e) = self.inner.hooks.run(hook, &context) {
                error!(hook, script = index + 1, count, error = %e, "Page hook failed");
            }
        }
    }

    /// Records the route and notifies listeners.
    fn complete(&self, path: &str, locator: &str) {
        trace!(path, phase = %NavigationPhase::PostRender, "Recording route");
        self.inner.state.write().current_route = Some(path.to_string());

        let notification = RouteChanged {
            path: path.to_string(),
            content_locator: locator.to_string(),
        };
        if self.inner.notifications.send(notification).is_err() {
            trace!("No route-changed listeners");
        }
    }
}

/// Inline error notice rendered in place of content.
fn error_notice(err: &Error) -> String {
    format!(
        "<div style=\"padding: 20px; color: red;\"><h2>Failed to load page</h2><p>{}</p></div>",
        escape_html(&err.to_string())
    )
}

// ============================================================================
// RouterBuilder
// ============================================================================

/// Builder for a [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    document: Option<Arc<dyn Document>>,
    fetcher: Option<Arc<dyn ContentFetcher>>,
    services: Option<ServiceReadiness>,
    hooks: Option<HookRegistry>,
    globals: Option<GlobalScope>,
    options: RouterOptions,
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("document", &self.document.is_some())
            .field("fetcher", &self.fetcher.is_some())
            .field("services", &self.services)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RouterBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hosting document (required).
    #[inline]
    #[must_use]
    pub fn document(mut self, document: Arc<dyn Document>) -> Self {
        self.document = Some(document);
        self
    }

    /// Sets the content fetcher. Defaults to [`HttpFetcher`].
    #[inline]
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn ContentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets the host service readiness signal used by the host tier.
    #[inline]
    #[must_use]
    pub fn services(mut self, services: ServiceReadiness) -> Self {
        self.services = Some(services);
        self
    }

    /// Shares an existing hook registry.
    #[inline]
    #[must_use]
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Shares an existing global scope.
    #[inline]
    #[must_use]
    pub fn globals(mut self, globals: GlobalScope) -> Self {
        self.globals = Some(globals);
        self
    }

    /// Sets router options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the router.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if no document is set or the notification
    /// capacity is zero.
    pub fn build(self) -> Result<Router> {
        let document = self.document.ok_or_else(|| {
            Error::config("a document is required. Use .document() to set it.")
        })?;

        if self.options.notification_capacity == 0 {
            return Err(Error::config("notification capacity must be greater than zero"));
        }

        let (notifications, _) = broadcast::channel(self.options.notification_capacity);

        Ok(Router {
            inner: Arc::new(RouterInner {
                document,
                fetcher: self
                    .fetcher
                    .unwrap_or_else(|| Arc::new(HttpFetcher::new())),
                services: self.services.unwrap_or_default(),
                hooks: self.hooks.unwrap_or_default(),
                globals: self.globals.unwrap_or_default(),
                options: self.options,
                routes: RwLock::new(RouteTable::new()),
                state: RwLock::new(NavigationState::default()),
                notifications,
            }),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
