//! Local relay server.
//!
//! Forwards post queries to the API so they can be made against a local origin
//! when the direct endpoint is blocked. Two forms are accepted:
//!
//! - `GET /proxy?<query>` forwards the query string to the configured API URL.
//! - `GET /relay/<full api url>` forwards a complete API URL, which makes
//!   `http://<bind>:<port>/relay/` usable as an entry in `[api] relays`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW,
    CACHE_CONTROL, CONTENT_TYPE,
};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::Result;
use crate::fetcher::ACCEPT_JSON;

const RELAY_PREFIX: &str = "/relay/";

/// Configuration for the local relay server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Address to bind (default: 127.0.0.1)
    pub bind: String,

    /// Port to listen on (default: 8000)
    pub port: u16,

    /// Timeout for upstream requests in seconds (default: 15)
    pub upstream_timeout_secs: u64,

    /// User agent sent upstream
    pub user_agent: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
            upstream_timeout_secs: 15,
            user_agent: concat!("tagscroll-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ProxyConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Host to show users; wildcard binds are reachable as localhost.
    pub fn display_host(&self) -> &str {
        match self.bind.as_str() {
            "127.0.0.1" | "0.0.0.0" => "localhost",
            other => other,
        }
    }
}

pub struct ProxyState {
    client: reqwest::Client,
    upstream: String,
    allowed: Url,
}

impl ProxyState {
    pub fn new(config: &ProxyConfig, upstream: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        let upstream = upstream.trim().to_string();
        let allowed = Url::parse(&upstream)?;

        Ok(Self {
            client,
            upstream,
            allowed,
        })
    }

    /// Parse a relay target and accept it only if it points at the configured
    /// API: same scheme, host and port, no credentials, path at or below the
    /// API path.
    pub fn allowed_target(&self, target: &str) -> Option<Url> {
        let url = Url::parse(target).ok()?;
        let base = &self.allowed;

        let same_origin = url.scheme() == base.scheme()
            && url.host_str() == base.host_str()
            && url.port_or_known_default() == base.port_or_known_default();
        let no_credentials = url.username().is_empty() && url.password().is_none();

        (same_origin && no_credentials && path_within(base.path(), url.path())).then_some(url)
    }

    async fn forward(&self, url: &str) -> Response {
        tracing::debug!("Relaying {}", url);

        let upstream = match self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .send()
            .await
        {
            Ok(upstream) => upstream,
            Err(e) => return unreachable_upstream(e),
        };

        let status =
            StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = upstream
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();

        match upstream.bytes().await {
            Ok(body) => (
                status,
                [
                    (CONTENT_TYPE, content_type),
                    (CACHE_CONTROL, "no-store".to_string()),
                    (ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
                ],
                body.to_vec(),
            )
                .into_response(),
            Err(e) => unreachable_upstream(e),
        }
    }
}

pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route(
            "/proxy",
            get(proxy_query).head(method_not_allowed).options(preflight),
        )
        .route(
            "/relay/{*target}",
            get(relay).head(method_not_allowed).options(preflight),
        )
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ProxyConfig, upstream: &str) -> Result<()> {
    let state = Arc::new(ProxyState::new(config, upstream)?);
    let listener = tokio::net::TcpListener::bind(config.address()).await?;

    tracing::info!("Relay listening on {}", config.address());
    println!(
        "Relay for {} at http://{}:{}",
        upstream,
        config.display_host(),
        config.port
    );
    println!(
        "Use \"http://{}:{}{}\" as a relay prefix",
        config.display_host(),
        config.port,
        RELAY_PREFIX
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down relay.");
        })
        .await?;

    Ok(())
}

async fn proxy_query(
    State(state): State<Arc<ProxyState>>,
    RawQuery(query): RawQuery,
) -> Response {
    match query.filter(|q| !q.is_empty()) {
        Some(query) => state.forward(&format!("{}?{}", state.upstream, query)).await,
        None => plain_error(StatusCode::BAD_REQUEST, "Missing query string for proxy."),
    }
}

async fn relay(State(state): State<Arc<ProxyState>>, uri: Uri) -> Response {
    let Some(target) = relay_target(&uri) else {
        return plain_error(StatusCode::BAD_REQUEST, "Missing relay target.");
    };

    match state.allowed_target(&target) {
        Some(url) => state.forward(url.as_str()).await,
        None => {
            tracing::warn!("Refusing to relay {}", target);
            plain_error(StatusCode::FORBIDDEN, "Relay target is not the configured API.")
        }
    }
}

/// `/index.php` admits itself and `/index.php/...`, never `/index.phpx`.
fn path_within(base: &str, path: &str) -> bool {
    if base.ends_with('/') {
        return path.starts_with(base);
    }
    path.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// The full URL carried after `/relay/`, query included.
fn relay_target(uri: &Uri) -> Option<String> {
    let path = uri.path().strip_prefix(RELAY_PREFIX)?;
    if path.is_empty() {
        return None;
    }
    Some(match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    })
}

async fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
        .into_response()
}

async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, [(ALLOW, "GET, OPTIONS")]).into_response()
}

fn plain_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (CACHE_CONTROL, "no-store"),
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        message.to_string(),
    )
        .into_response()
}

fn unreachable_upstream(e: reqwest::Error) -> Response {
    tracing::warn!("Upstream request failed: {}", e);
    plain_error(
        StatusCode::BAD_GATEWAY,
        &format!("Failed to reach API: {}", e),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    use crate::domain::Tags;
    use crate::endpoint::EndpointBuilder;
    use crate::fetcher::{ApiConfig, FetchOrchestrator, Fetcher, HttpFetcher, RawResponse};
    use crate::normalizer::Normalizer;

    async fn serve_router(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Fake API: echoes the query inside a post, fails for `tags=fail`.
    async fn fake_api(RawQuery(query): RawQuery, headers: HeaderMap) -> Response {
        let query = query.unwrap_or_default();
        if query.contains("tags=fail") {
            return (StatusCode::SERVICE_UNAVAILABLE, "down").into_response();
        }
        let accept = headers
            .get("accept")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = serde_json::json!([{
            "id": 1,
            "file_url": "http://img.example/1.jpg",
            "query": query,
            "accept": accept,
        }]);
        ([(CONTENT_TYPE, "application/json")], body.to_string()).into_response()
    }

    /// Returns (upstream api url, proxy base url).
    async fn setup() -> (String, String) {
        let upstream = serve_router(Router::new().route("/index.php", get(fake_api))).await;
        let upstream = format!("{}/index.php", upstream);
        let state = Arc::new(ProxyState::new(&ProxyConfig::default(), &upstream).unwrap());
        let proxy = serve_router(router(state)).await;
        (upstream, proxy)
    }

    #[test]
    fn test_relay_target() {
        let uri: Uri = "/relay/https://api.example/index.php?page=dapi&tags=a+b"
            .parse()
            .unwrap();
        assert_eq!(
            relay_target(&uri),
            Some("https://api.example/index.php?page=dapi&tags=a+b".into())
        );

        let uri: Uri = "/relay/".parse().unwrap();
        assert_eq!(relay_target(&uri), None);
    }

    #[test]
    fn test_display_host() {
        let config = ProxyConfig::default();
        assert_eq!(config.display_host(), "localhost");
        assert_eq!(config.address(), "127.0.0.1:8000");

        let config = ProxyConfig {
            bind: "192.168.1.5".into(),
            ..Default::default()
        };
        assert_eq!(config.display_host(), "192.168.1.5");
    }

    #[tokio::test]
    async fn test_proxy_forwards_query() {
        let (_, proxy) = setup().await;

        let response = reqwest::get(format!("{}/proxy?page=dapi&tags=fox", proxy))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.headers()["cache-control"], "no-store");
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["content-type"], "application/json");

        let body: serde_json::Value =
            serde_json::from_str(&response.text().await.unwrap()).unwrap();
        assert_eq!(body[0]["query"], "page=dapi&tags=fox");
        assert_eq!(body[0]["accept"], ACCEPT_JSON);
    }

    #[tokio::test]
    async fn test_proxy_requires_query() {
        let (_, proxy) = setup().await;

        let response = reqwest::get(format!("{}/proxy", proxy)).await.unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_upstream_status_passes_through() {
        let (_, proxy) = setup().await;

        let response = reqwest::get(format!("{}/proxy?tags=fail", proxy)).await.unwrap();
        assert_eq!(response.status().as_u16(), 503);
        assert_eq!(response.text().await.unwrap(), "down");
    }

    #[tokio::test]
    async fn test_relay_forwards_full_url() {
        let (upstream, proxy) = setup().await;

        let response = reqwest::get(format!("{}/relay/{}?tags=fox", proxy, upstream))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let body: serde_json::Value =
            serde_json::from_str(&response.text().await.unwrap()).unwrap();
        assert_eq!(body[0]["query"], "tags=fox");
    }

    #[tokio::test]
    async fn test_relay_refuses_other_hosts() {
        let (_, proxy) = setup().await;

        let response = reqwest::get(format!("{}/relay/http://elsewhere.example/x", proxy))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 403);
    }

    #[test]
    fn test_allowed_target_requires_same_origin() {
        let state = ProxyState::new(&ProxyConfig::default(), "http://127.0.0.1:1").unwrap();

        assert!(state.allowed_target("http://127.0.0.1:1/index.php?tags=a").is_some());
        assert!(state.allowed_target("http://127.0.0.1:19/").is_none());
        assert!(state.allowed_target("http://127.0.0.10:1/").is_none());
        assert!(state.allowed_target("http://host.evil.example/").is_none());
        assert!(state.allowed_target("https://127.0.0.1:1/").is_none());
        assert!(state.allowed_target("http://127.0.0.1:1@evil.example/").is_none());
        assert!(state.allowed_target("not a url").is_none());
    }

    #[test]
    fn test_allowed_target_requires_api_path() {
        let state = ProxyState::new(
            &ProxyConfig::default(),
            "https://api.example/index.php",
        )
        .unwrap();

        assert!(state.allowed_target("https://api.example/index.php?page=dapi").is_some());
        assert!(state.allowed_target("https://api.example:443/index.php").is_some());
        assert!(state.allowed_target("https://api.example/index.phpx").is_none());
        assert!(state.allowed_target("https://api.example/admin").is_none());
        assert!(state
            .allowed_target("https://api.example/index.php/../admin")
            .is_none());
    }

    #[tokio::test]
    async fn test_relay_refuses_other_port_on_bare_host() {
        let state = Arc::new(ProxyState::new(&ProxyConfig::default(), "http://127.0.0.1:1").unwrap());
        let proxy = serve_router(router(state)).await;

        let response = reqwest::get(format!("{}/relay/http://127.0.0.1:19/", proxy))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 403);
    }

    #[tokio::test]
    async fn test_preflight_and_head() {
        let (_, proxy) = setup().await;
        let client = reqwest::Client::new();

        let response = client
            .request(reqwest::Method::OPTIONS, format!("{}/proxy", proxy))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 204);
        assert_eq!(response.headers()["access-control-allow-methods"], "GET, OPTIONS");

        let response = client
            .head(format!("{}/proxy?tags=fox", proxy))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 405);
        assert_eq!(response.headers()["allow"], "GET, OPTIONS");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = format!("http://{}/index.php", listener.local_addr().unwrap());
        drop(listener);

        let state = Arc::new(ProxyState::new(&ProxyConfig::default(), &dead).unwrap());
        let proxy = serve_router(router(state)).await;

        let response = reqwest::get(format!("{}/proxy?tags=fox", proxy)).await.unwrap();
        assert_eq!(response.status().as_u16(), 502);
        assert!(response
            .text()
            .await
            .unwrap()
            .starts_with("Failed to reach API"));
    }

    /// Refuses anything that isn't routed through the local relay.
    struct BlockedDirect {
        inner: HttpFetcher,
        relay: String,
    }

    #[async_trait::async_trait]
    impl Fetcher for BlockedDirect {
        async fn fetch(&self, url: &str) -> Result<RawResponse> {
            if !url.starts_with(&self.relay) {
                return Ok(RawResponse::new(403, "blocked"));
            }
            self.inner.fetch(url).await
        }
    }

    #[tokio::test]
    async fn test_orchestrator_falls_back_to_local_relay() {
        let (upstream, proxy) = setup().await;
        let relay = format!("{}/relay/", proxy);

        let config = ApiConfig {
            base_url: upstream,
            relays: vec!["https://unused.example/?".to_string(), relay.clone()],
            ..ApiConfig::default()
        };
        let fetcher = Arc::new(BlockedDirect {
            inner: HttpFetcher::new(&config).unwrap(),
            relay,
        });
        let orchestrator = FetchOrchestrator::new(
            fetcher,
            EndpointBuilder::new(&config).unwrap(),
            Normalizer::new(),
        );

        let posts = orchestrator
            .fetch_posts(&Tags::parse("fox").unwrap())
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].file_url, "http://img.example/1.jpg");
        assert_eq!(
            posts[0].field_str("query"),
            Some("page=dapi&s=post&q=index&json=1&limit=60&tags=fox")
        );
    }
}
