//! End-to-end navigation and host round trips.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use jwb_bridge::router::{FetchResponse, NavigationOutcome};
use jwb_bridge::{
    Bridge, ContentFetcher, ContentSource, Document, Error, FileService, HostServer,
    MemoryDocument, MemorySurface, Result, RouteChanged, Router, RouterOptions, ServiceReadiness,
    Surface,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

// ============================================================================
// Fixtures
// ============================================================================

const LOCATION: &str = "http://app.local/shell";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Answers from a URL table; anything else is a network error.
#[derive(Default)]
struct TableFetcher {
    pages: HashMap<String, FetchResponse>,
    requests: Mutex<Vec<String>>,
}

impl TableFetcher {
    fn with(mut self, url: &str, response: FetchResponse) -> Self {
        self.pages.insert(url.to_string(), response);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ContentFetcher for TableFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.requests.lock().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::connection("connection refused"))
    }
}

/// In-process host answering `LOAD_HTML` from a resource table.
fn spawn_host(
    bridge: Bridge,
    mut frames: mpsc::UnboundedReceiver<String>,
    resources: HashMap<&'static str, &'static str>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            let envelope: Value = serde_json::from_str(&frame).expect("envelope");
            let id = envelope["id"].clone();
            let locator = envelope["payload"].as_str().unwrap_or_default();

            let reply = match (envelope["type"].as_str(), resources.get(locator)) {
                (Some("LOAD_HTML"), Some(content)) => json!({
                    "id": id,
                    "status": "SUCCESS",
                    "payload": { "content": content, "path": locator }
                }),
                (Some("LOAD_HTML"), None) => json!({
                    "id": id,
                    "status": "ERROR",
                    "payload": {
                        "code": "HTML_LOAD_ERROR",
                        "message": format!("Resource not found: {locator}")
                    }
                }),
                _ => json!({
                    "id": id,
                    "status": "ERROR",
                    "payload": { "message": "Unsupported operation" }
                }),
            };

            bridge.handle_response(reply.to_string());
        }
    })
}

struct App {
    router: Router,
    fetcher: Arc<TableFetcher>,
    surface: Arc<MemorySurface>,
}

fn app(fetcher: TableFetcher, services: ServiceReadiness) -> App {
    let document = MemoryDocument::new(LOCATION);
    let surface = document.add_element("app");
    let fetcher = Arc::new(fetcher);

    let router = Router::builder()
        .document(document as Arc<dyn Document>)
        .fetcher(Arc::clone(&fetcher) as Arc<dyn ContentFetcher>)
        .services(services)
        .options(RouterOptions::new().with_host_service_timeout(Duration::from_millis(200)))
        .build()
        .expect("router");

    router.register("/home", "home.html");
    assert!(router.set_container("app"));

    App {
        router,
        fetcher,
        surface,
    }
}

fn host_backed(resources: HashMap<&'static str, &'static str>) -> (ServiceReadiness, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let bridge = Bridge::builder()
        .channel(Arc::new(tx))
        .build()
        .expect("bridge");
    let host = spawn_host(bridge.clone(), rx, resources);
    (ServiceReadiness::ready(FileService::new(bridge)), host)
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn home_renders_from_alternate_after_primary_404() {
    init_tracing();

    let fetcher = TableFetcher::default()
        .with(
            "http://app.local/shell/home.html",
            FetchResponse::status(404, "Not Found"),
        )
        .with(
            "http://app.local/home.html",
            FetchResponse::ok("<body><h1>Hi</h1><script>window.flag=1</script></body>"),
        );
    let app = app(fetcher, ServiceReadiness::new());
    app.router.hooks().register("window.flag=1", |page| {
        page.globals.set("flag", 1);
        Ok(())
    });
    let mut changes = app.router.subscribe();

    let outcome = app.router.navigate("/home").await;

    assert_eq!(outcome.source(), Some(ContentSource::Alternate));
    assert_eq!(
        app.fetcher.requests(),
        vec![
            "http://app.local/shell/home.html".to_string(),
            "http://app.local/home.html".to_string(),
        ]
    );
    assert_eq!(app.surface.inner_html(), "<h1>Hi</h1>");
    assert_eq!(app.router.globals().get("flag"), Some(Value::from(1)));
    assert_eq!(app.router.current_route().as_deref(), Some("/home"));

    let change = changes.recv().await.expect("notification");
    assert_eq!(
        change,
        RouteChanged {
            path: "/home".to_string(),
            content_locator: "home.html".to_string(),
        }
    );
    assert_eq!(
        serde_json::to_value(&change).expect("json"),
        json!({ "path": "/home", "htmlPath": "home.html" })
    );
    assert!(changes.try_recv().is_err());
}

#[tokio::test]
async fn host_fallback_renders_host_content() {
    init_tracing();

    let (services, _host) = host_backed(HashMap::from([(
        "home.html",
        "<section>from host</section>",
    )]));
    let app = app(TableFetcher::default(), services);

    let outcome = app.router.navigate("/home").await;

    assert_eq!(outcome.source(), Some(ContentSource::Host));
    assert_eq!(app.surface.inner_html(), "<section>from host</section>");
    assert_eq!(app.fetcher.requests().len(), 2);
}

#[tokio::test]
async fn host_fallback_failure_renders_notice() {
    init_tracing();

    let fetcher = TableFetcher::default().with(
        "http://app.local/shell/home.html",
        FetchResponse::status(404, "Not Found"),
    );
    let (services, _host) = host_backed(HashMap::new());
    let app = app(fetcher, services);

    let outcome = app.router.navigate("/home").await;

    let NavigationOutcome::Failed(err) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(matches!(err, Error::HostFallbackFailed { .. }));

    let notice = app.surface.inner_html();
    assert!(notice.contains("Failed to load page"));
    assert!(notice.contains("Not Found (404)"));
    assert!(notice.contains("Resource not found: home.html"));
    assert_eq!(app.router.current_route(), None);
}

#[tokio::test]
async fn host_tier_waits_for_late_service() {
    init_tracing();

    let (ready, _host) = host_backed(HashMap::from([("home.html", "<p>late</p>")]));
    let services = ServiceReadiness::new();
    let app = app(TableFetcher::default(), services.clone());

    let publisher = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        services.publish(ready.current().expect("service"));
    });

    let outcome = app.router.navigate("/home").await;
    publisher.await.expect("publisher");

    assert_eq!(outcome.source(), Some(ContentSource::Host));
    assert_eq!(app.surface.inner_html(), "<p>late</p>");
}

#[tokio::test]
async fn repeated_navigation_is_not_deduplicated() {
    init_tracing();

    let fetcher = TableFetcher::default().with(
        "http://app.local/shell/home.html",
        FetchResponse::ok("<p>home</p><script data-hook=\"visit\"></script>"),
    );
    let app = app(fetcher, ServiceReadiness::new());
    app.router.hooks().register("visit", |page| {
        let visits = page.globals.get("visits").and_then(|v| v.as_u64()).unwrap_or(0);
        page.globals.set("visits", visits + 1);
        Ok(())
    });
    let mut changes = app.router.subscribe();

    assert!(app.router.navigate("/home").await.is_rendered());
    assert!(app.router.navigate("/home").await.is_rendered());

    assert_eq!(app.fetcher.requests().len(), 2);
    assert_eq!(app.router.globals().get("visits"), Some(Value::from(2)));
    assert!(changes.recv().await.is_ok());
    assert!(changes.recv().await.is_ok());
}

#[tokio::test]
async fn unregistered_path_leaves_state_untouched() {
    init_tracing();

    let fetcher = TableFetcher::default().with(
        "http://app.local/shell/home.html",
        FetchResponse::ok("<p>home</p>"),
    );
    let app = app(fetcher, ServiceReadiness::new());
    assert!(app.router.navigate("/home").await.is_rendered());

    let outcome = app.router.navigate("/missing").await;

    assert!(matches!(
        outcome,
        NavigationOutcome::Rejected(Error::RouteNotFound { ref path }) if path == "/missing"
    ));
    assert_eq!(app.router.current_route().as_deref(), Some("/home"));
    assert_eq!(app.surface.inner_html(), "<p>home</p>");
    assert_eq!(app.fetcher.requests().len(), 1);
}

// ============================================================================
// WebSocket Host
// ============================================================================

#[tokio::test]
async fn services_round_trip_over_websocket() {
    init_tracing();

    let server = HostServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
        .await
        .expect("bind");
    let url = server.ws_url();
    let bridge = Bridge::builder().build().expect("bridge");

    let (link, client) = tokio::join!(
        server.accept(bridge.clone()),
        tokio_tungstenite::connect_async(url)
    );
    let link = link.expect("accept");
    let (mut host, _) = client.expect("connect");

    let host_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = host.next().await {
            let Message::Text(text) = frame else { continue };
            let envelope: Value = serde_json::from_str(text.as_str()).expect("envelope");
            let path = envelope["payload"]["path"].as_str().unwrap_or_default();
            let reply = match envelope["type"].as_str() {
                Some("READ_FILE") => json!({
                    "id": envelope["id"],
                    "status": "SUCCESS",
                    "payload": { "content": "hello", "size": 5, "path": path }
                }),
                _ => json!({
                    "id": envelope["id"],
                    "status": "ERROR",
                    "payload": { "code": "FILE_WRITE_ERROR", "message": "read-only" }
                }),
            };
            if host.send(Message::Text(reply.to_string().into())).await.is_err() {
                break;
            }
        }
    });

    let files = FileService::new(bridge.clone());

    let file = files.read_file("notes.txt").await.expect("read");
    assert_eq!(file.content, "hello");
    assert_eq!(file.size, 5);

    let err = files.write_file("notes.txt", "x").await.unwrap_err();
    assert!(matches!(
        err,
        Error::HostReported { ref code, ref message }
            if code.as_deref() == Some("FILE_WRITE_ERROR") && message == "read-only"
    ));
    assert_eq!(bridge.pending_count(), 0);

    link.shutdown();
    host_task.await.expect("host task");
}
