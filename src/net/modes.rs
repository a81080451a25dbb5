//! Request modes: redirect, cache and credentials.
//!
//! The string forms match the fetch standard (`"follow"`, `"force-cache"`,
//! `"same-origin"`, ...) and are what the serde representation uses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::FetchError;

/// How redirects are handled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectMode {
    /// Transparently follow redirects up to the configured hop limit.
    #[default]
    Follow,
    /// Return the redirect response itself.
    Manual,
    /// Fail on any redirect.
    Error,
}

impl RedirectMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectMode::Follow => "follow",
            RedirectMode::Manual => "manual",
            RedirectMode::Error => "error",
        }
    }
}

impl FromStr for RedirectMode {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(RedirectMode::Follow),
            "manual" => Ok(RedirectMode::Manual),
            "error" => Ok(RedirectMode::Error),
            other => Err(FetchError::InvalidRedirectMode(other.to_string())),
        }
    }
}

impl fmt::Display for RedirectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the response cache participates in a request.
///
/// `Default` means "no special handling": the cache is neither read nor
/// written.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    #[default]
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Default => "default",
            CacheMode::NoStore => "no-store",
            CacheMode::Reload => "reload",
            CacheMode::NoCache => "no-cache",
            CacheMode::ForceCache => "force-cache",
            CacheMode::OnlyIfCached => "only-if-cached",
        }
    }

    /// Whether a stored entry may answer the request without dispatching.
    pub fn reads_cache(&self) -> bool {
        matches!(self, CacheMode::ForceCache | CacheMode::OnlyIfCached)
    }

    /// Whether a successful dispatch overwrites the stored entry.
    pub fn writes_cache(&self) -> bool {
        matches!(self, CacheMode::ForceCache | CacheMode::Reload | CacheMode::NoCache)
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the cookie jar takes part in a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialsMode {
    #[default]
    Omit,
    SameOrigin,
    Include,
}

impl CredentialsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialsMode::Omit => "omit",
            CredentialsMode::SameOrigin => "same-origin",
            CredentialsMode::Include => "include",
        }
    }

    /// With a single client and a strictly origin-keyed jar, same-origin and
    /// include behave the same.
    pub fn uses_cookie_jar(&self) -> bool {
        matches!(self, CredentialsMode::SameOrigin | CredentialsMode::Include)
    }
}

impl fmt::Display for CredentialsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
