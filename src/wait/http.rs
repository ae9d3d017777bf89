//! HTTP status-code readiness probe.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Method, StatusCode, Url};

use crate::error::ProbeError;
use crate::wait::{PROBE_TIMEOUT, Probe};

/// Method used when none is configured.
pub const DEFAULT_HTTP_METHOD: &str = "HEAD";

static STATUS_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*\.\.+\s*(\d+)$").expect("status range regex"));
static STATUS_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("status code regex"));

/// Inclusive range of acceptable status codes. `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    min: u16,
    max: u16,
}

impl StatusRange {
    /// Create a range, rejecting `min > max`.
    pub fn new(min: u16, max: u16) -> Result<Self, ProbeError> {
        if min > max {
            return Err(ProbeError::InvalidStatusSpec {
                spec: format!("{min}..{max}"),
                reason: "lower bound is greater than upper bound".to_string(),
            });
        }
        Ok(Self { min, max })
    }

    /// A range matching exactly one code.
    pub fn exact(code: u16) -> Self {
        Self {
            min: code,
            max: code,
        }
    }

    pub fn min(&self) -> u16 {
        self.min
    }

    pub fn max(&self) -> u16 {
        self.max
    }

    pub fn contains(&self, code: u16) -> bool {
        (self.min..=self.max).contains(&code)
    }
}

impl Default for StatusRange {
    fn default() -> Self {
        Self { min: 200, max: 399 }
    }
}

impl fmt::Display for StatusRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}..{}", self.min, self.max)
        }
    }
}

impl FromStr for StatusRange {
    type Err = ProbeError;

    /// Parse `NNN` or `NNN..MMM` (any run of two or more dots).
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let code = |s: &str| {
            s.parse::<u16>().map_err(|e| ProbeError::InvalidStatusSpec {
                spec: spec.to_string(),
                reason: e.to_string(),
            })
        };

        if let Some(caps) = STATUS_RANGE_RE.captures(spec) {
            let range = Self::new(code(&caps[1])?, code(&caps[2])?);
            return range.map_err(|_| ProbeError::InvalidStatusSpec {
                spec: spec.to_string(),
                reason: "lower bound is greater than upper bound".to_string(),
            });
        }

        if STATUS_CODE_RE.is_match(spec) {
            return Ok(Self::exact(code(spec)?));
        }

        Err(ProbeError::InvalidStatusSpec {
            spec: spec.to_string(),
            reason: "expected a status code or a range like 200..399".to_string(),
        })
    }
}

/// Probe that is ready once the URL answers with a status in range.
///
/// Each evaluation sends exactly one request: redirects are not followed and
/// no idle connection is kept, so nothing lingers between polls. A 501
/// answer means the server does not know the method and fails the wait.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: Url,
    method: Method,
    status: StatusRange,
    client: Client,
}

impl HttpProbe {
    /// Create a probe. `None` or empty `method`/`status` fall back to
    /// `HEAD` and `200..399`.
    pub fn new(url: &str, method: Option<&str>, status: Option<&str>) -> Result<Self, ProbeError> {
        let url = Url::parse(url).map_err(|e| ProbeError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let method = method
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_HTTP_METHOD)
            .to_uppercase();
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| ProbeError::InvalidMethod { method })?;

        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(spec) => spec.parse()?,
            None => StatusRange::default(),
        };

        let client = Client::builder()
            .connect_timeout(PROBE_TIMEOUT)
            .read_timeout(PROBE_TIMEOUT)
            .timeout(PROBE_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Ok(Self {
            url,
            method,
            status,
            client,
        })
    }

    /// Probe `url` with the default method and status range.
    pub fn for_url(url: &str) -> Result<Self, ProbeError> {
        Self::new(url, None, None)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn status(&self) -> StatusRange {
        self.status
    }

    /// Classify a response status.
    pub fn classify(&self, status: StatusCode) -> Result<bool, ProbeError> {
        if status == StatusCode::NOT_IMPLEMENTED {
            return Err(ProbeError::UnsupportedMethod {
                method: self.method.to_string(),
                url: self.url.to_string(),
            });
        }
        Ok(self.status.contains(status.as_u16()))
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn name(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    async fn evaluate(&mut self) -> Result<bool, ProbeError> {
        let response = self
            .client
            .request(self.method.clone(), self.url.clone())
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status = resp.status();
                tracing::debug!("{} {} answered {}", self.method, self.url, status);
                // Dropping the response closes the connection; nothing is pooled.
                drop(resp);
                self.classify(status)
            }
            Err(e) => {
                tracing::trace!("{} {} not reachable yet: {}", self.method, self.url, e);
                Ok(false)
            }
        }
    }
}
