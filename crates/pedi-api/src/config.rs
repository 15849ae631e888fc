use std::env;
use std::path::PathBuf;

use axum::http::HeaderValue;
use eyre::WrapErr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use pedi_protocols::Registry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, for CloudWatch.
    #[default]
    Json,
    Pretty,
}

/// Service settings read from the environment at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceConfig {
    /// JSON catalog replacing the built-in protocols.
    pub catalog_path: Option<PathBuf>,
    pub log_format: LogFormat,
    /// Allowed CORS origin; any origin when unset.
    pub cors_origin: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let log_format = match lookup("PEDI_LOG_FORMAT").as_deref() {
            None | Some("") | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                eyre::bail!("PEDI_LOG_FORMAT must be 'json' or 'pretty', got '{other}'")
            }
        };

        Ok(Self {
            catalog_path: lookup("PEDI_CATALOG_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            log_format,
            cors_origin: lookup("PEDI_CORS_ORIGIN").filter(|o| !o.is_empty() && o != "*"),
        })
    }

    /// Build the protocol registry. Any defect in the catalog fails startup.
    pub fn load_registry(&self) -> eyre::Result<Registry> {
        match &self.catalog_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .wrap_err_with(|| format!("reading catalog {}", path.display()))?;
                Ok(Registry::from_json(&json)?)
            }
            None => Ok(Registry::builtin()?),
        }
    }

    pub fn cors_layer(&self) -> eyre::Result<CorsLayer> {
        let origin = match &self.cors_origin {
            Some(origin) => AllowOrigin::exact(
                HeaderValue::from_str(origin).wrap_err("invalid PEDI_CORS_ORIGIN")?,
            ),
            None => AllowOrigin::any(),
        };
        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> eyre::Result<ServiceConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]).unwrap(), ServiceConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            ("PEDI_CATALOG_PATH", "/opt/catalog.json"),
            ("PEDI_LOG_FORMAT", "pretty"),
            ("PEDI_CORS_ORIGIN", "https://pronto.example.org"),
        ])
        .unwrap();
        assert_eq!(cfg.catalog_path, Some(PathBuf::from("/opt/catalog.json")));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.cors_origin.as_deref(), Some("https://pronto.example.org"));
        assert!(cfg.cors_layer().is_ok());
    }

    #[test]
    fn wildcard_origin_means_any() {
        assert_eq!(config(&[("PEDI_CORS_ORIGIN", "*")]).unwrap().cors_origin, None);
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(config(&[("PEDI_LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn missing_catalog_file_fails_startup() {
        let cfg = config(&[("PEDI_CATALOG_PATH", "/nonexistent/catalog.json")]).unwrap();
        assert!(cfg.load_registry().is_err());
    }

    #[test]
    fn builtin_catalog_by_default() {
        assert_eq!(ServiceConfig::default().load_registry().unwrap().len(), 20);
    }
}
