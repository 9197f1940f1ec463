//! HTTP session client for bromotenggersemeru.id
//!
//! Each session gets its own `reqwest::Client` and cookie jar, so replacing a
//! session really does start from a clean cookie set.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect, Client, Url};

use super::expiry::ExpiryDetector;
use super::SessionClient;
use crate::error::{Error, Result};
use crate::models::CapacityQuery;
use crate::services::poll::PollConfig;

// ============================================================================
// Constants
// ============================================================================

/// Booking site base URL
pub const BASE_URL: &str = "https://bromotenggersemeru.id";

/// Capacity view endpoint (POST)
pub const GET_VIEW_PATH: &str = "/website/home/get_view";

/// TCP connect timeout in seconds
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Whole-request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 45;

/// TCP keepalive so idle pooled connections do not go stale
const TCP_KEEPALIVE_SECS: u64 = 30;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

// ============================================================================
// Configuration
// ============================================================================

/// Connection settings for [`HttpSessionClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Site root, without trailing slash
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Resolve and connect over IPv4 only
    pub force_ipv4: bool,
    pub expiry: ExpiryDetector,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            force_ipv4: false,
            expiry: ExpiryDetector::default(),
        }
    }
}

impl ClientConfig {
    /// Point the client at another host (mirrors, tests)
    /// Default connection settings carrying the IPv4 choice of `poll`
    pub fn for_poll(poll: &PollConfig) -> Self {
        Self::default().with_force_ipv4(poll.force_ipv4)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_force_ipv4(mut self, force_ipv4: bool) -> Self {
        self.force_ipv4 = force_ipv4;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    pub fn with_expiry(mut self, expiry: ExpiryDetector) -> Self {
        self.expiry = expiry;
        self
    }

    /// Validate and normalize the configuration
    pub fn validate(self) -> Result<Self> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("invalid base URL '{}': {}", self.base_url, e)))?;
        if self.connect_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(Error::config("timeouts must be greater than zero"));
        }
        Ok(self)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Cookie-carrying HTTP session
#[derive(Clone, Debug)]
pub struct HttpSession {
    client: Client,
    jar: Arc<Jar>,
}

impl HttpSession {
    /// Whether the jar holds any cookie for `url`
    pub fn has_cookies_for(&self, url: &Url) -> bool {
        self.jar.cookies(url).is_some()
    }
}

// ============================================================================
// HttpSessionClient
// ============================================================================

/// [`SessionClient`] talking to the real booking site
pub struct HttpSessionClient {
    config: ClientConfig,
    base: Url,
}

impl HttpSessionClient {
    /// Create a client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = config.validate()?;
        let base = Url::parse(&config.base_url)
            .map_err(|e| Error::config(format!("invalid base URL: {}", e)))?;
        Ok(Self { config, base })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html, */*; q=0.01"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        if let Ok(origin) = HeaderValue::from_str(&self.config.base_url) {
            headers.insert(header::ORIGIN, origin);
        }
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/", self.config.base_url)) {
            headers.insert(header::REFERER, referer);
        }
        headers
    }

    /// Build a fresh client with its own cookie jar
    fn build_client(&self, jar: Arc<Jar>) -> Result<Client> {
        let mut builder = Client::builder()
            .cookie_provider(jar)
            .user_agent(USER_AGENT)
            .default_headers(self.default_headers())
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .tcp_keepalive(Duration::from_secs(TCP_KEEPALIVE_SECS))
            .redirect(redirect::Policy::none())
            .no_proxy();

        if self.config.force_ipv4 {
            // Binding to 0.0.0.0 only lets IPv4 destinations connect
            builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }

        builder
            .build()
            .map_err(|e| Error::network(format!("failed to build HTTP client: {}", e)))
    }
}

#[async_trait]
impl SessionClient for HttpSessionClient {
    type Session = HttpSession;

    async fn acquire_session(&self) -> Result<HttpSession> {
        let jar = Arc::new(Jar::default());
        let client = self.build_client(jar.clone())?;

        log::debug!(
            "[session] handshake with {} (ipv4 only: {})",
            self.config.base_url,
            self.config.force_ipv4
        );
        let response = client.get(self.endpoint("/")).send().await?;
        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(Error::network(format!("handshake returned HTTP {}", status)));
        }

        let session = HttpSession { client, jar };
        if session.has_cookies_for(&self.base) {
            log::info!("[session] new session acquired");
        } else {
            log::warn!("[session] handshake succeeded but the server set no cookie");
        }
        Ok(session)
    }

    async fn query_capacity(&self, session: &HttpSession, query: &CapacityQuery) -> Result<String> {
        let started = Instant::now();
        let response = session
            .client
            .post(self.endpoint(GET_VIEW_PATH))
            .form(&query.form_fields())
            .send()
            .await?;

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(reason) = self
            .config
            .expiry
            .check_status(status.as_u16(), location.as_deref())
        {
            log::warn!("[session] session expired: {}", reason);
            return Err(Error::session_expired(reason));
        }
        if !status.is_success() {
            return Err(Error::network(format!("get_view returned HTTP {}", status)));
        }

        let body = response.text().await?;
        if let Some(reason) = self.config.expiry.check_body(&body) {
            log::warn!("[session] session expired: {}", reason);
            return Err(Error::session_expired(reason));
        }

        log::info!(
            "[session] get_view {} | {} bytes | {:.3}s",
            status,
            body.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(body)
    }
}
