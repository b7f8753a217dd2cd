use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

use kiln_generate::chain::DEFAULT_ENDPOINTS;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

// Values copied verbatim from setup guides and sample env files
const PLACEHOLDER_MARKERS: &[&str] = &["your-", "your_", "changeme", "change-me", "..."];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{0} still holds a placeholder value")]
    Placeholder(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Url,
    pub backend_key: String,
    pub ai_key: String,
    pub jwt_secret: String,
    pub addr: SocketAddr,
    /// Primary generation endpoint. Absent means the in-process fallback answers.
    pub generation_url: Option<Url>,
    pub proxy_endpoints: Vec<Url>,
    /// Local SQLite file used instead of the hosted store.
    pub db_path: Option<PathBuf>,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let optional = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| -> Result<String, ConfigError> {
            let value = optional(name).ok_or(ConfigError::Missing(name))?;
            if is_placeholder(&value) {
                return Err(ConfigError::Placeholder(name));
            }
            Ok(value)
        };

        let backend_url = parse_url("KILN_BACKEND_URL", &required("KILN_BACKEND_URL")?)?;
        let backend_key = required("KILN_BACKEND_KEY")?;
        let ai_key = required("KILN_AI_KEY")?;
        let jwt_secret = required("KILN_JWT_SECRET")?;

        let host = optional("KILN_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match optional("KILN_PORT") {
            Some(p) => p.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "KILN_PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "KILN_HOST",
                reason: e.to_string(),
            })?;

        let generation_url = optional("KILN_GENERATION_URL")
            .map(|u| parse_url("KILN_GENERATION_URL", &u))
            .transpose()?;

        let proxy_endpoints = match optional("KILN_PROXY_ENDPOINTS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_url("KILN_PROXY_ENDPOINTS", s))
                .collect::<Result<Vec<_>, _>>()?,
            None => DEFAULT_ENDPOINTS
                .iter()
                .map(|s| parse_url("KILN_PROXY_ENDPOINTS", s))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let secure_cookies = match optional("KILN_SECURE_COOKIES").as_deref() {
            None => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: "KILN_SECURE_COOKIES",
                    reason: format!("expected true or false, got {v:?}"),
                });
            }
        };

        Ok(Self {
            backend_url,
            backend_key,
            ai_key,
            jwt_secret,
            addr,
            generation_url,
            proxy_endpoints,
            db_path: optional("KILN_DB_PATH").map(PathBuf::from),
            secure_cookies,
        })
    }
}

fn is_placeholder(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m))
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> HashMap<String, String> {
        [
            ("KILN_BACKEND_URL", "https://abcd.supabase.co"),
            ("KILN_BACKEND_KEY", "anon-key"),
            ("KILN_AI_KEY", "sk-live-123"),
            ("KILN_JWT_SECRET", "super-secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_vars(base()).unwrap();
        assert_eq!(cfg.addr, "0.0.0.0:3000".parse().unwrap());
        assert!(cfg.generation_url.is_none());
        assert!(cfg.db_path.is_none());
        assert!(cfg.secure_cookies);
        assert_eq!(cfg.proxy_endpoints.len(), DEFAULT_ENDPOINTS.len());
        assert_eq!(cfg.proxy_endpoints[0].as_str(), "https://v0.dev/api/chat");
    }

    #[test]
    fn missing_required_value_is_named() {
        let mut vars = base();
        vars.remove("KILN_AI_KEY");
        let err = Config::from_vars(vars).unwrap_err();
        assert_eq!(err.to_string(), "KILN_AI_KEY is not set");

        let mut vars = base();
        vars.insert("KILN_JWT_SECRET".into(), "   ".into());
        assert!(matches!(Config::from_vars(vars), Err(ConfigError::Missing("KILN_JWT_SECRET"))));
    }

    #[test]
    fn placeholders_are_rejected() {
        let mut vars = base();
        vars.insert("KILN_BACKEND_URL".into(), "https://your-project.supabase.co".into());
        assert!(matches!(Config::from_vars(vars), Err(ConfigError::Placeholder("KILN_BACKEND_URL"))));

        let mut vars = base();
        vars.insert("KILN_AI_KEY".into(), "sk-proj-...".into());
        assert!(matches!(Config::from_vars(vars), Err(ConfigError::Placeholder("KILN_AI_KEY"))));
    }

    #[test]
    fn optional_values_are_parsed() {
        let mut vars = base();
        vars.insert("KILN_PORT".into(), "8080".into());
        vars.insert("KILN_HOST".into(), "127.0.0.1".into());
        vars.insert("KILN_GENERATION_URL".into(), "http://localhost:9000/chat".into());
        vars.insert("KILN_PROXY_ENDPOINTS".into(), "http://a.test/x, http://b.test/y,".into());
        vars.insert("KILN_DB_PATH".into(), "kiln.db".into());
        vars.insert("KILN_SECURE_COOKIES".into(), "false".into());

        let cfg = Config::from_vars(vars).unwrap();
        assert_eq!(cfg.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.generation_url.unwrap().as_str(), "http://localhost:9000/chat");
        assert_eq!(cfg.proxy_endpoints.len(), 2);
        assert_eq!(cfg.db_path, Some(PathBuf::from("kiln.db")));
        assert!(!cfg.secure_cookies);
    }

    #[test]
    fn bad_port_is_invalid() {
        let mut vars = base();
        vars.insert("KILN_PORT".into(), "eighty".into());
        assert!(matches!(
            Config::from_vars(vars),
            Err(ConfigError::Invalid { name: "KILN_PORT", .. })
        ));
    }
}
