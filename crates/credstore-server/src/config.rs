use anyhow::Context;
use credstore_jwt::{check_lifetime, max_lifetime};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

use crate::auth::TokenLifetimes;

pub const CONFIG_ENV: &str = "CREDSTORE_SERVER_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8008"
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Path to the YAML policy file.
    #[serde(default)]
    pub policy_file: Option<PathBuf>,

    /// Path to the PKCS#8 PEM signing key.
    #[serde(default)]
    pub signing_key_file: Option<PathBuf>,

    #[serde(default)]
    pub tokens: TokenConfig,
}

fn default_bind() -> String {
    "0.0.0.0:8008".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            policy_file: None,
            signing_key_file: None,
            tokens: TokenConfig::default(),
        }
    }
}

/// Lifetimes of issued tokens, as humantime strings ("1h", "5m").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenConfig {
    #[serde(default = "default_auth_ttl")]
    pub auth_ttl: String,

    #[serde(default = "default_rpc_ttl")]
    pub rpc_ttl: String,
}

fn default_auth_ttl() -> String {
    "1h".to_string()
}

fn default_rpc_ttl() -> String {
    "5m".to_string()
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            auth_ttl: default_auth_ttl(),
            rpc_ttl: default_rpc_ttl(),
        }
    }
}

impl TokenConfig {
    pub fn lifetimes(&self) -> anyhow::Result<TokenLifetimes> {
        Ok(TokenLifetimes {
            auth: parse_ttl("auth_ttl", &self.auth_ttl)?,
            rpc: parse_ttl("rpc_ttl", &self.rpc_ttl)?,
        })
    }
}

fn parse_ttl(field: &str, raw: &str) -> anyhow::Result<chrono::Duration> {
    let ttl = humantime::parse_duration(raw)
        .with_context(|| format!("invalid tokens.{}: {:?}", field, raw))?;
    let ttl = chrono::Duration::from_std(ttl)
        .with_context(|| format!("tokens.{} is out of range", field))?;
    check_lifetime(ttl).with_context(|| {
        format!(
            "tokens.{} must be positive and at most {} days",
            field,
            max_lifetime().num_days()
        )
    })
}

impl ServerConfig {
    /// Apply command-line flags on top of the file values.
    pub fn with_overrides(
        mut self,
        bind: Option<String>,
        policy_file: Option<PathBuf>,
        signing_key_file: Option<PathBuf>,
    ) -> Self {
        if let Some(bind) = bind {
            self.bind = bind;
        }
        if policy_file.is_some() {
            self.policy_file = policy_file;
        }
        if signing_key_file.is_some() {
            self.signing_key_file = signing_key_file;
        }
        self
    }

    pub fn policy_file(&self) -> anyhow::Result<&Path> {
        self.policy_file
            .as_deref()
            .context("no policy file configured (set --config or policy_file)")
    }

    pub fn signing_key_file(&self) -> anyhow::Result<&Path> {
        self.signing_key_file
            .as_deref()
            .context("no signing key configured (set --signing-key or signing_key_file)")
    }
}

/// Load the server config from `path`, else from `$CREDSTORE_SERVER_CONFIG`.
///
/// With neither set, defaults are returned and flags must supply the rest.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    let Some(path) = config_path(path) else {
        return Ok(ServerConfig::default());
    };
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let cfg: ServerConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(cfg)
}

fn config_path(path: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = path {
        return Some(p.to_path_buf());
    }
    env::var_os(CONFIG_ENV).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let cfg: ServerConfig = toml::from_str(
            r#"
            bind = "127.0.0.1:9000"
            policy_file = "/etc/credstore/policy.yaml"
            signing_key_file = "/etc/credstore/signing.key"

            [tokens]
            auth_ttl = "30m"
            rpc_ttl = "90s"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.bind, "127.0.0.1:9000");
        assert_eq!(
            cfg.policy_file().unwrap(),
            Path::new("/etc/credstore/policy.yaml")
        );
        let lifetimes = cfg.tokens.lifetimes().unwrap();
        assert_eq!(lifetimes.auth, chrono::Duration::minutes(30));
        assert_eq!(lifetimes.rpc, chrono::Duration::seconds(90));
    }

    #[test]
    fn test_defaults() {
        let cfg: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, ServerConfig::default());
        assert_eq!(cfg.tokens.lifetimes().unwrap(), TokenLifetimes::default());
        assert!(cfg.policy_file().is_err());
        assert!(cfg.signing_key_file().is_err());
    }

    #[test]
    fn test_invalid_ttl_is_rejected() {
        let tokens = TokenConfig {
            auth_ttl: "soon".into(),
            rpc_ttl: "5m".into(),
        };
        assert!(tokens.lifetimes().is_err());

        let tokens = TokenConfig {
            auth_ttl: "1h".into(),
            rpc_ttl: "0s".into(),
        };
        assert!(tokens.lifetimes().is_err());
    }

    #[test]
    fn test_huge_ttl_is_rejected() {
        let cfg: ServerConfig = toml::from_str(
            r#"
            [tokens]
            auth_ttl = "300000years"
            "#,
        )
        .unwrap();
        let err = cfg.tokens.lifetimes().unwrap_err();
        assert!(err.to_string().contains("tokens.auth_ttl"));

        let tokens = TokenConfig {
            auth_ttl: "1h".into(),
            rpc_ttl: "101years".into(),
        };
        assert!(tokens.lifetimes().is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let cfg = ServerConfig {
            policy_file: Some("file.yaml".into()),
            ..ServerConfig::default()
        }
        .with_overrides(Some("127.0.0.1:1".into()), None, Some("flag.key".into()));

        assert_eq!(cfg.bind, "127.0.0.1:1");
        assert_eq!(cfg.policy_file().unwrap(), Path::new("file.yaml"));
        assert_eq!(cfg.signing_key_file().unwrap(), Path::new("flag.key"));
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "bind = \"127.0.0.1:7000\"").unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:7000");
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Some(Path::new("/nonexistent/credstore.toml"))).is_err());
    }
}
