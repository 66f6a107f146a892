//! Relay state shared across all route handlers.
//!
//! RelayState is cheap to clone: the HTTP client is reference counted and the
//! rest is small immutable configuration.

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Client, Url};

use sakila_core::config::SakilaConfig;
use sakila_core::{Result, SakilaError};

#[derive(Clone)]
pub struct RelayState {
    /// Client used for every forwarded question.
    pub client: Client,
    /// Answering service endpoint.
    pub upstream: Url,
    /// Path the relay accepts questions on.
    pub route: Arc<str>,
    /// Origins allowed by CORS.
    pub allowed_origins: Arc<[String]>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl RelayState {
    /// Build relay state from the loaded configuration.
    ///
    /// Fails on an invalid upstream URL or a route that is not an absolute
    /// path.
    pub fn new(config: &SakilaConfig) -> Result<Self> {
        let upstream = Url::parse(&config.service.endpoint).map_err(|e| {
            SakilaError::Config(format!(
                "invalid service endpoint '{}': {}",
                config.service.endpoint, e
            ))
        })?;

        let route = config.relay.route.trim();
        if !route.starts_with('/') {
            return Err(SakilaError::Config(format!(
                "relay route must start with '/': '{}'",
                route
            )));
        }
        if route == "/health" {
            return Err(SakilaError::Config(
                "relay route '/health' is reserved".to_string(),
            ));
        }
        check_route_syntax(route)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.service.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SakilaError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            upstream,
            route: Arc::from(route),
            allowed_origins: config.relay.allowed_origins.clone().into(),
            start_time: Instant::now(),
        })
    }
}

/// Reject paths the router would refuse at startup: old-style `:name` and
/// `*name` captures, and braces that do not form a whole `{name}` segment.
fn check_route_syntax(route: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(SakilaError::Config(format!(
            "invalid relay route '{}': {}",
            route, reason
        )))
    };

    let segments: Vec<&str> = route.split('/').collect();
    for (i, segment) in segments.iter().enumerate() {
        if segment.starts_with(':') || segment.starts_with('*') {
            return invalid("use '{name}' captures instead of ':name' or '*name'");
        }
        if !segment.contains(['{', '}']) {
            continue;
        }
        let name = segment
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or_default();
        let last = i + 1 == segments.len();
        let name = match name.strip_prefix('*') {
            Some(rest) if last => rest,
            Some(_) => return invalid("a '{*name}' capture must be the last segment"),
            None => name,
        };
        if name.is_empty() || name.contains(['{', '}', '*']) {
            return invalid("captures must be whole segments of the form '{name}'");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_from_defaults() {
        let state = RelayState::new(&SakilaConfig::default()).unwrap();
        assert_eq!(state.upstream.as_str(), "http://127.0.0.1:8000/ask");
        assert_eq!(&*state.route, "/api/film");
        assert_eq!(state.allowed_origins.len(), 2);
    }

    #[test]
    fn test_new_rejects_bad_endpoint() {
        let mut config = SakilaConfig::default();
        config.service.endpoint = "::not a url::".to_string();
        assert!(matches!(
            RelayState::new(&config),
            Err(SakilaError::Config(_))
        ));
    }

    #[test]
    fn test_new_rejects_relative_route() {
        let mut config = SakilaConfig::default();
        config.relay.route = "api/film".to_string();
        let err = RelayState::new(&config).err().unwrap();
        assert!(err.to_string().contains("must start with '/'"));

        for route in [
            "/:film",
            "/api/*rest",
            "/api/{film",
            "/api/film}",
            "/{a{b}}",
            "/api/{}",
            "/api/x{film}",
            "/{*rest}/ask",
        ] {
            config.relay.route = route.to_string();
            assert!(
                matches!(RelayState::new(&config), Err(SakilaError::Config(_))),
                "route {} should be rejected",
                route
            );
        }
    }

    #[test]
    fn test_new_accepts_brace_captures() {
        let mut config = SakilaConfig::default();
        config.relay.route = "/api/{surface}/ask".to_string();
        assert!(RelayState::new(&config).is_ok());

        config.relay.route = "/api/{*rest}".to_string();
        assert!(RelayState::new(&config).is_ok());
    }
}
