use http::{header, request::Parts, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;

/// Origins accepted for cross-origin requests: exact matches from the
/// allow-list, or a host matching one of the patterns. A pattern is either an
/// exact host or `*.` followed by a domain suffix.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    exact: Vec<String>,
    patterns: Vec<String>,
}

impl OriginPolicy {
    pub fn new(exact: Vec<String>, patterns: Vec<String>) -> Self {
        let exact = exact.into_iter().map(|o| o.trim_end_matches('/').to_ascii_lowercase()).collect();
        let patterns = patterns.into_iter().map(|p| p.to_ascii_lowercase()).collect();
        Self { exact, patterns }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.allowed_origins(), config.origin_patterns())
    }

    pub fn allows(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/').to_ascii_lowercase();
        if self.exact.iter().any(|o| *o == origin) {
            return true;
        }
        let Some(host) = origin_host(&origin) else { return false };
        self.patterns.iter().any(|pattern| match pattern.strip_prefix("*.") {
            Some(suffix) => host.len() > suffix.len() && host.ends_with(suffix) && host[..host.len() - suffix.len()].ends_with('.'),
            None => host == pattern.as_str(),
        })
    }

    pub fn layer(self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
                origin.to_str().is_ok_and(|o| self.allows(o))
            }))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    }
}

/// Host part of `scheme://host[:port]`.
fn origin_host(origin: &str) -> Option<&str> {
    let (_, rest) = origin.split_once("://")?;
    let host = rest.split(['/', ':']).next()?;
    (!host.is_empty()).then_some(host)
}
