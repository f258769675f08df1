use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use reqwest::{header, redirect::Policy, Client as ReqwestClient};
use thiserror::Error;
use url::Url;

use crate::config::Config;

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; SeoInspectorBot/1.0)";

/// Redirect hops followed before giving up (reqwest's default limit).
pub const MAX_REDIRECTS: usize = 10;

/// Decides whether a resolved address must not be contacted.
pub type AddressFilter = Arc<dyn Fn(SocketAddr) -> bool + Send + Sync>;

// ============================================================================
// Fetcher contract
// ============================================================================

/// Why a page could not be retrieved. Callers surface all of these as one
/// generic failure; the variant is kept for logging.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("host resolves to a private or reserved address")]
    Blocked,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote responded with status {0}")]
    Status(u16),

    #[error("remote returned no content")]
    Empty,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

/// Retrieves the raw markup of a page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_markup(&self, url: &Url) -> Result<String, FetchError>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

/// Fetches pages over HTTP, optionally through a pass-through proxy.
///
/// Redirects are followed here rather than by reqwest so every hop goes
/// through the same address check as the first request.
pub struct HttpFetcher {
    client: ReqwestClient,
    proxy_url: Option<String>,
    blocked: Option<AddressFilter>,
}

impl HttpFetcher {
    pub fn new(
        timeout: Duration,
        proxy_url: Option<String>,
        block_private_hosts: bool,
    ) -> Result<Self, FetchError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()?;

        let blocked = block_private_hosts
            .then(|| Arc::new(|addr: SocketAddr| is_private_ip(addr.ip())) as AddressFilter);

        Ok(Self {
            client,
            proxy_url,
            blocked,
        })
    }

    /// Replace the private-address check with a custom filter.
    pub fn with_address_filter(mut self, filter: AddressFilter) -> Self {
        self.blocked = Some(filter);
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            config.fetch_timeout,
            config.fetch_proxy_url.clone(),
            config.block_private_hosts,
        )
    }

    /// Address actually requested: the target itself, or the proxy prefix
    /// followed by the percent-encoded target.
    pub fn request_url(&self, target: &Url) -> String {
        match &self.proxy_url {
            Some(prefix) => format!("{prefix}{}", urlencoding::encode(target.as_str())),
            None => target.to_string(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_markup(&self, url: &Url) -> Result<String, FetchError> {
        let mut target = url.clone();

        for _ in 0..=MAX_REDIRECTS {
            if let Some(blocked) = &self.blocked {
                ensure_allowed_host(&target, blocked.as_ref()).await?;
            }

            let response = self.client.get(self.request_url(&target)).send().await?;
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or(FetchError::Status(status.as_u16()))?;
                target = next_hop(response.url(), location)?;
                tracing::debug!(from = %response.url(), to = %target, "Following redirect");
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let markup = response.text().await?;
            if markup.trim().is_empty() {
                return Err(FetchError::Empty);
            }

            return Ok(markup);
        }

        Err(FetchError::Transport(format!(
            "stopped after {MAX_REDIRECTS} redirects"
        )))
    }
}

/// Resolve a `Location` header against the URL that returned it. Only
/// http(s) targets are followed.
fn next_hop(base: &Url, location: &str) -> Result<Url, FetchError> {
    let next = base
        .join(location)
        .map_err(|e| FetchError::Transport(format!("invalid redirect location: {e}")))?;

    match next.scheme() {
        "http" | "https" => Ok(next),
        other => Err(FetchError::Transport(format!(
            "refusing redirect to `{other}` URL"
        ))),
    }
}

// ============================================================================
// SSRF guard
// ============================================================================

/// Returns `true` if `ip` is a private, loopback, link-local or otherwise
/// special-use address that must not be fetched.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            matches!(
                o,
                [127, ..]
                    | [10, ..]
                    | [169, 254, ..]
                    | [192, 168, ..]
                    | [192, 0, 0, _]
                    | [0, ..]
                    | [255, 255, 255, 255]
            ) || (o[0] == 172 && (16..=31).contains(&o[1]))
                || (o[0] == 100 && (64..=127).contains(&o[1]))
                || (o[0] == 198 && (18..=19).contains(&o[1]))
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00 == 0xfc00)
                || (v6.segments()[0] & 0xffc0 == 0xfe80)
                // Covers both IPv4-mapped (::ffff:a.b.c.d) and
                // IPv4-compatible (::a.b.c.d) forms.
                || v6.to_ipv4().is_some_and(|v4| is_private_ip(IpAddr::V4(v4)))
        }
    }
}

/// Resolve the target host and refuse it if any address is blocked.
async fn ensure_allowed_host(
    url: &Url,
    blocked: &(dyn Fn(SocketAddr) -> bool + Send + Sync),
) -> Result<(), FetchError> {
    let host = url
        .host_str()
        .ok_or_else(|| FetchError::Transport("URL has no host".into()))?;
    let port = url.port_or_known_default().unwrap_or(80);

    // IPv6 literals come back bracketed from host_str().
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| FetchError::Transport(format!("could not resolve host: {e}")))?;

    for addr in addrs {
        if blocked(addr) {
            return Err(FetchError::Blocked);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::get, Router};

    use super::*;

    /// Serve `app` on an ephemeral loopback port.
    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    async fn serve_page(markup: &'static str) -> SocketAddr {
        serve(Router::new().route("/", get(move || async move { markup }))).await
    }

    async fn serve_redirect(location: String) -> SocketAddr {
        serve(Router::new().route(
            "/",
            get(move || {
                let location = location.clone();
                async move { (StatusCode::FOUND, [(axum::http::header::LOCATION, location)]) }
            }),
        ))
        .await
    }

    /// Fetcher that refuses exactly the given addresses.
    fn fetcher_blocking(blocked: Vec<SocketAddr>) -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(3), None, true)
            .unwrap()
            .with_address_filter(Arc::new(move |addr: SocketAddr| blocked.contains(&addr)))
    }

    fn fetcher(proxy: Option<&str>) -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(1), proxy.map(str::to_string), true).unwrap()
    }

    #[test]
    fn blocks_loopback_ipv4() {
        assert!(is_private_ip("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn blocks_private_ranges() {
        assert!(is_private_ip("10.0.0.1".parse().unwrap()));
        assert!(is_private_ip("172.16.0.1".parse().unwrap()));
        assert!(is_private_ip("172.31.255.255".parse().unwrap()));
        assert!(is_private_ip("192.168.1.1".parse().unwrap()));
        assert!(is_private_ip("169.254.0.1".parse().unwrap()));
    }

    #[test]
    fn blocks_ipv6_loopback_and_mapped_private() {
        assert!(is_private_ip("::1".parse().unwrap()));
        assert!(is_private_ip("::ffff:10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn blocks_special_use_ranges() {
        assert!(is_private_ip("100.64.0.1".parse().unwrap()));
        assert!(is_private_ip("100.127.255.254".parse().unwrap()));
        assert!(is_private_ip("192.0.0.8".parse().unwrap()));
        assert!(is_private_ip("198.18.0.1".parse().unwrap()));
        assert!(is_private_ip("198.19.255.255".parse().unwrap()));
        assert!(is_private_ip("::127.0.0.1".parse().unwrap()));
        assert!(is_private_ip("::10.1.2.3".parse().unwrap()));
    }

    #[test]
    fn allows_public_addresses() {
        assert!(!is_private_ip("8.8.8.8".parse().unwrap()));
        assert!(!is_private_ip("172.32.0.1".parse().unwrap()));
        assert!(!is_private_ip("100.128.0.1".parse().unwrap()));
        assert!(!is_private_ip("198.20.0.1".parse().unwrap()));
        assert!(!is_private_ip("192.0.2.2".parse().unwrap()));
        assert!(!is_private_ip("2606:4700:4700::1111".parse().unwrap()));
    }

    #[test]
    fn direct_request_url_is_the_target() {
        let target = Url::parse("https://example.com/page?a=1").unwrap();
        assert_eq!(
            fetcher(None).request_url(&target),
            "https://example.com/page?a=1"
        );
    }

    #[test]
    fn proxied_request_url_encodes_the_target() {
        let target = Url::parse("https://example.com/page?a=1").unwrap();
        assert_eq!(
            fetcher(Some("https://proxy.example/raw?url=")).request_url(&target),
            "https://proxy.example/raw?url=https%3A%2F%2Fexample.com%2Fpage%3Fa%3D1"
        );
    }

    #[tokio::test]
    async fn refuses_loopback_target() {
        let target = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher(None).fetch_markup(&target).await.unwrap_err();
        assert!(matches!(err, FetchError::Blocked), "got {err:?}");
    }

    #[tokio::test]
    async fn redirect_into_blocked_address_is_refused() {
        let internal = serve_page("<title>INTERNAL SECRET</title>").await;
        let outer = serve_redirect(format!("http://{internal}/")).await;

        let target = Url::parse(&format!("http://{outer}/")).unwrap();
        let err = fetcher_blocking(vec![internal])
            .fetch_markup(&target)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Blocked), "got {err:?}");
    }

    #[tokio::test]
    async fn relative_redirect_to_blocked_host_is_refused() {
        let internal = serve_page("<title>INTERNAL SECRET</title>").await;
        // Same host, different port: resolved against the redirecting URL.
        let outer = serve_redirect(format!("//{internal}/admin")).await;

        let target = Url::parse(&format!("http://{outer}/")).unwrap();
        let err = fetcher_blocking(vec![internal])
            .fetch_markup(&target)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Blocked), "got {err:?}");
    }

    #[tokio::test]
    async fn allowed_redirect_is_followed() {
        let page = serve_page("<title>Moved</title>").await;
        let outer = serve_redirect(format!("http://{page}/")).await;

        let target = Url::parse(&format!("http://{outer}/")).unwrap();
        let markup = fetcher_blocking(vec![])
            .fetch_markup(&target)
            .await
            .unwrap();
        assert_eq!(markup, "<title>Moved</title>");
    }

    #[tokio::test]
    async fn redirect_loop_gives_up() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/",
            get(|| async { (StatusCode::FOUND, [(axum::http::header::LOCATION, "/")]) }),
        );
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let target = Url::parse(&format!("http://{addr}/")).unwrap();
        let err = fetcher_blocking(vec![])
            .fetch_markup(&target)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)), "got {err:?}");
    }

    #[test]
    fn redirect_to_other_scheme_is_rejected() {
        let base = Url::parse("https://example.com/a").unwrap();
        assert!(next_hop(&base, "file:///etc/passwd").is_err());
        assert_eq!(
            next_hop(&base, "/b?c=d").unwrap().as_str(),
            "https://example.com/b?c=d"
        );
    }
}
