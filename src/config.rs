//! Request and transport configuration.
//!
//! Both configuration types are built through a fluent builder and validated by
//! `build()`, which returns a [`ConfigError`] for invalid values.
//!
//! # Examples
//!
//! ## A request with an expected type
//! ```rust
//! use blobfetch::RequestConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = RequestConfig::builder()
//!     .url("https://example.com/img.png")
//!     .expect("image/png")
//!     .autostart(false)
//!     .on_success(|req| println!("got {} bytes", req.bytes_loaded()))
//!     .build()?;
//! assert!(!cfg.autostart());
//! # Ok(()) }
//! ```
//!
//! ## Transport defaults
//! ```rust
//! use blobfetch::TransportConfig;
//! let cfg = TransportConfig::default();
//! assert_eq!(cfg.max_redirects, 10);
//! ```
//!
//! # Notes
//!
//! An empty expected type (either as MIME type or as pattern) means "no expectation",
//! the same as not configuring one. A string passed to `expect()` is a pattern; use
//! `expect_type(ExpectedType::mime(..))` for an exact MIME comparison.

use crate::errors::{ConfigError, FetchError};
use crate::events::ProgressEvent;
use crate::expect::ExpectedType;
use crate::request::{BlobRequest, Handlers};
use http::HeaderValue;
use url::Url;

const DEFAULT_USER_AGENT: &str = concat!("blobfetch/", env!("CARGO_PKG_VERSION"));
const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Configuration of a single [`BlobRequest`]. Captured once at construction.
#[derive(Debug)]
pub struct RequestConfig {
    url: Url,
    expect: Option<ExpectedType>,
    autostart: bool,
    pub(crate) handlers: Handlers,
}

impl RequestConfig {
    pub fn builder() -> RequestConfigBuilder {
        RequestConfigBuilder::default()
    }

    /// Configuration for a bare URL: no expectation, no handlers, started immediately.
    pub fn for_url(url: &str) -> Result<Self, ConfigError> {
        Self::builder().url(url).build()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn expect(&self) -> Option<&ExpectedType> {
        self.expect.as_ref()
    }

    pub fn autostart(&self) -> bool {
        self.autostart
    }

    pub(crate) fn into_parts(self) -> (Url, Option<ExpectedType>, bool, Handlers) {
        (self.url, self.expect, self.autostart, self.handlers)
    }
}

#[derive(Debug)]
enum ExpectSource {
    Type(ExpectedType),
    Pattern(String),
}

/// Builder for [`RequestConfig`].
#[derive(Debug)]
pub struct RequestConfigBuilder {
    url: Option<String>,
    expect: Option<ExpectSource>,
    autostart: bool,
    handlers: Handlers,
}

impl Default for RequestConfigBuilder {
    fn default() -> Self {
        Self {
            url: None,
            expect: None,
            autostart: true,
            handlers: Handlers::default(),
        }
    }
}

impl RequestConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self
    }

    pub fn url<S: Into<String>>(self, url: S) -> Self { self.map(|b| b.url = Some(url.into())) }
    pub fn autostart(self, on: bool) -> Self { self.map(|b| b.autostart = on) }

    /// Expect the content type to match `pattern`, a regular expression searched anywhere
    /// in the declared type (`"png"` accepts `image/png`). Compiled by `build()`.
    pub fn expect<S: Into<String>>(self, pattern: S) -> Self {
        self.map(|b| b.expect = Some(ExpectSource::Pattern(pattern.into())))
    }

    /// Expect a prepared [`ExpectedType`], such as a strict `ExpectedType::mime("image/png")`
    /// or a compiled [`Regex`](regex::Regex).
    pub fn expect_type<T: Into<ExpectedType>>(self, expected: T) -> Self {
        self.map(|b| b.expect = Some(ExpectSource::Type(expected.into())))
    }

    pub fn on_load<F>(self, f: F) -> Self
    where
        F: FnMut(&BlobRequest) + Send + 'static,
    {
        self.map(|b| b.handlers.on_load = Some(Box::new(f)))
    }

    pub fn on_success<F>(self, f: F) -> Self
    where
        F: FnMut(&BlobRequest) + Send + 'static,
    {
        self.map(|b| b.handlers.on_success = Some(Box::new(f)))
    }

    pub fn on_error<F>(self, f: F) -> Self
    where
        F: FnMut(&BlobRequest, &FetchError) + Send + 'static,
    {
        self.map(|b| b.handlers.on_error = Some(Box::new(f)))
    }

    pub fn on_abort<F>(self, f: F) -> Self
    where
        F: FnMut(&BlobRequest) + Send + 'static,
    {
        self.map(|b| b.handlers.on_abort = Some(Box::new(f)))
    }

    pub fn on_progress<F>(self, f: F) -> Self
    where
        F: FnMut(&BlobRequest, &ProgressEvent) + Send + 'static,
    {
        self.map(|b| b.handlers.on_progress = Some(Box::new(f)))
    }

    /// Validate and build the final config.
    pub fn build(self) -> Result<RequestConfig, ConfigError> {
        let url = parse_url(self.url.as_deref().ok_or(ConfigError::MissingUrl)?)?;

        let expect = match self.expect {
            None => None,
            Some(ExpectSource::Type(t)) if t.is_empty() => None,
            Some(ExpectSource::Type(t)) => Some(t),
            Some(ExpectSource::Pattern(p)) if p.is_empty() => None,
            Some(ExpectSource::Pattern(p)) => Some(ExpectedType::pattern(&p)?),
        };

        Ok(RequestConfig {
            url,
            expect,
            autostart: self.autostart,
            handlers: self.handlers,
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

/// Configuration for [`ReqwestTransport`](crate::net::ReqwestTransport).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User agent string sent with every request
    pub user_agent: String,
    /// Value of the `Accept` header
    pub accept: String,
    /// Maximum number of redirects followed. `0` disables redirects.
    pub max_redirects: usize,
    /// Number of events buffered per transfer before the transport waits for the request
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: "*/*".to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            channel_capacity: crate::net::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl TransportConfig {
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if HeaderValue::from_str(&self.user_agent).is_err() {
            return Err(ConfigError::InvalidHeader { name: "user-agent" });
        }
        if HeaderValue::from_str(&self.accept).is_err() {
            return Err(ConfigError::InvalidHeader { name: "accept" });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

/// Builder for [`TransportConfig`], mirroring [`RequestConfigBuilder`].
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    inner: TransportConfig,
}

impl TransportConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut TransportConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn accept<S: Into<String>>(self, accept: S) -> Self { self.map(|c| c.accept = accept.into()) }
    pub fn max_redirects(self, n: usize) -> Self { self.map(|c| c.max_redirects = n) }
    pub fn channel_capacity(self, n: usize) -> Self { self.map(|c| c.channel_capacity = n) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<TransportConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
