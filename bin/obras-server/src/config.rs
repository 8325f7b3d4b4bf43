//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;

/// Runtime configuration for obras-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Directory where CSV exports are staged before being streamed.
    pub export_dir: PathBuf,

    /// Upper bound for `POST /upload-obras` request bodies, in bytes.
    pub max_upload_bytes: usize,

    /// Comma-separated CORS allow-list; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Mount Swagger UI and the OpenAPI document.
    pub enable_swagger: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_upload_mb: usize = parse_or(lookup("OBRAS_MAX_UPLOAD_MB"), 16);
        Self {
            bind_address: lookup("OBRAS_BIND").unwrap_or_else(|| "0.0.0.0:8000".to_owned()),
            log_level: lookup("OBRAS_LOG").unwrap_or_else(|| "info".to_owned()),
            log_json: lookup("OBRAS_LOG_JSON").is_some_and(|v| flag(&v)),
            export_dir: lookup("OBRAS_EXPORT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            cors_allowed_origins: lookup("OBRAS_CORS_ORIGINS").filter(|v| !v.trim().is_empty()),
            enable_swagger: lookup("OBRAS_ENABLE_SWAGGER").is_none_or(|v| flag(&v)),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = Config::default();
        assert_eq!(cfg.bind_address, "0.0.0.0:8000");
        assert_eq!(cfg.log_level, "info");
        assert!(!cfg.log_json);
        assert_eq!(cfg.export_dir, std::env::temp_dir());
        assert_eq!(cfg.max_upload_bytes, 16 * 1024 * 1024);
        assert!(cfg.cors_allowed_origins.is_none());
        assert!(cfg.enable_swagger);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config_from(&[
            ("OBRAS_BIND", "127.0.0.1:9000"),
            ("OBRAS_LOG", "debug"),
            ("OBRAS_LOG_JSON", "TRUE"),
            ("OBRAS_EXPORT_DIR", "/var/tmp/obras"),
            ("OBRAS_MAX_UPLOAD_MB", "2"),
            ("OBRAS_CORS_ORIGINS", "http://localhost:3000"),
            ("OBRAS_ENABLE_SWAGGER", "false"),
        ]);
        assert_eq!(cfg.bind_address, "127.0.0.1:9000");
        assert_eq!(cfg.log_level, "debug");
        assert!(cfg.log_json);
        assert_eq!(cfg.export_dir, PathBuf::from("/var/tmp/obras"));
        assert_eq!(cfg.max_upload_bytes, 2 * 1024 * 1024);
        assert_eq!(cfg.cors_allowed_origins.as_deref(), Some("http://localhost:3000"));
        assert!(!cfg.enable_swagger);
    }

    #[test]
    fn unparsable_numbers_fall_back_to_default() {
        let cfg = config_from(&[("OBRAS_MAX_UPLOAD_MB", "lots")]);
        assert_eq!(cfg.max_upload_bytes, 16 * 1024 * 1024);
    }
}
