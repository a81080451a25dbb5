//! Fetcher configuration.
//!
//! `FetchConfig` controls how the reqwest-backed transports are built: the
//! user agent, connection pooling and the redirect hop limit that both the
//! accelerated and the fallback transport enforce.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use gosub_fetch::FetchConfig;
//! let cfg = FetchConfig::default();
//! assert_eq!(cfg.max_redirects, 20);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use std::time::Duration;
//! use gosub_fetch::FetchConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = FetchConfig::builder()
//!     .user_agent("MyAgent/0.1")
//!     .max_redirects(5)
//!     .pool_idle_timeout(Duration::from_secs(30))
//!     .build()?;
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `user_agent`: `User-Agent` header sent by both transports.
//! - `max_redirects`: redirect hops followed before the request fails (default: 20).
//! - `pool_idle_timeout`: how long idle keep-alive connections are kept (default: 90s).
//! - `pool_max_idle_per_host`: idle connections kept per host (default: 10).
//! - `connect_timeout`: optional TCP connect timeout.

use std::fmt;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Gosub-Fetch/1.0";

/// Hop limit applied when nothing else is configured.
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

const MAX_REDIRECT_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub max_redirects: usize,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub connect_timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            connect_timeout: None,
        }
    }
}

impl FetchConfig {
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::default()
    }
}

/// Builder for [`FetchConfig`].
#[derive(Debug, Clone, Default)]
pub struct FetchConfigBuilder {
    inner: FetchConfig,
}

impl FetchConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut FetchConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn max_redirects(self, hops: usize) -> Self { self.map(|c| c.max_redirects = hops) }
    pub fn pool_idle_timeout(self, timeout: Duration) -> Self { self.map(|c| c.pool_idle_timeout = timeout) }
    pub fn pool_max_idle_per_host(self, n: usize) -> Self { self.map(|c| c.pool_max_idle_per_host = n) }
    pub fn connect_timeout(self, timeout: Duration) -> Self { self.map(|c| c.connect_timeout = Some(timeout)) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut FetchConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<FetchConfig, FetchConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum FetchConfigError {
    EmptyUserAgent,
    ZeroIdlePool,
    RedirectLimitTooHigh(usize),
}

impl fmt::Display for FetchConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchConfigError::EmptyUserAgent =>
                write!(f, "user_agent must not be empty"),
            FetchConfigError::ZeroIdlePool =>
                write!(f, "pool_max_idle_per_host must be at least 1"),
            FetchConfigError::RedirectLimitTooHigh(n) =>
                write!(f, "max_redirects {n} is out of range (expected 0..={MAX_REDIRECT_LIMIT})"),
        }
    }
}
impl std::error::Error for FetchConfigError {}

fn validate(c: &FetchConfig) -> Result<(), FetchConfigError> {
    if c.user_agent.trim().is_empty() {
        return Err(FetchConfigError::EmptyUserAgent);
    }
    if c.pool_max_idle_per_host == 0 {
        return Err(FetchConfigError::ZeroIdlePool);
    }
    if c.max_redirects > MAX_REDIRECT_LIMIT {
        return Err(FetchConfigError::RedirectLimitTooHigh(c.max_redirects));
    }
    Ok(())
}
