use serde::Deserialize;

/// Opt-in / opt-out selection of middleware layers.
///
/// `Include` enables only the listed layers; `Exclude` enables everything
/// except the listed layers. Absent configuration means everything is on.
#[derive(Debug, Clone, Deserialize)]
pub enum MiddlewareConfig {
    Include(Vec<Middleware>),
    Exclude(Vec<Middleware>),
}

impl MiddlewareConfig {
    pub fn is_enabled(&self, middleware: Middleware) -> bool {
        match self {
            MiddlewareConfig::Include(list) => list.contains(&middleware),
            MiddlewareConfig::Exclude(list) => !list.contains(&middleware),
        }
    }
}

/// The middleware layers that can be toggled from configuration.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum Middleware {
    Cors,
    SecurityHeaders,
    RateLimiting,
    RequestId,
    Logging,
    Timeout,
    CatchPanic,
    Liveness,
    Readiness,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_enabled_include() {
        let config = MiddlewareConfig::Include(vec![Middleware::Logging, Middleware::Cors]);
        assert!(config.is_enabled(Middleware::Logging));
        assert!(config.is_enabled(Middleware::Cors));
        assert!(!config.is_enabled(Middleware::RateLimiting));
    }

    #[test]
    fn test_is_enabled_exclude() {
        let config = MiddlewareConfig::Exclude(vec![Middleware::RateLimiting]);
        assert!(!config.is_enabled(Middleware::RateLimiting));
        assert!(config.is_enabled(Middleware::SecurityHeaders));
        assert!(config.is_enabled(Middleware::Cors));
    }

    #[test]
    fn test_empty_include_disables_everything() {
        let config = MiddlewareConfig::Include(vec![]);
        assert!(!config.is_enabled(Middleware::Logging));
        assert!(!config.is_enabled(Middleware::CatchPanic));
    }

    #[test]
    fn test_parses_from_toml() {
        let config: crate::Config = r#"
[http]
Exclude = ["rate-limiting", "timeout"]
        "#
        .parse()
        .unwrap();

        let middleware = config.http.middleware.expect("middleware config");
        assert!(!middleware.is_enabled(Middleware::RateLimiting));
        assert!(!middleware.is_enabled(Middleware::Timeout));
        assert!(middleware.is_enabled(Middleware::Cors));
    }
}
