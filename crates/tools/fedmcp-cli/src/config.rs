use fedmcp_types::FedMcpError;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "FEDMCP_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8090";

fn default_request_timeout_secs() -> u64 {
    30
}

/// Settings for the `fedmcp` tool, read from TOML.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Base URL of the FedMCP store, e.g. `https://fedmcp.example.gov`.
    pub server_url: Option<String>,

    /// Default workspace for `create` and `push`.
    pub workspace_id: Option<String>,

    /// Signing key file. Falls back to `$FEDMCP_KEY_PATH`, then
    /// `~/.fedmcp/signing-key.json`.
    pub key_path: Option<PathBuf>,

    /// Sent as a bearer token on every request to the store.
    pub api_key: Option<String>,

    /// Log filter used when `RUST_LOG` is unset (e.g. "info", "fedmcp=debug").
    pub log_level: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            workspace_id: None,
            key_path: None,
            api_key: None,
            log_level: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl CliConfig {
    pub fn from_file(path: &Path) -> Result<Self, FedMcpError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FedMcpError::Config(format!("failed to read config file '{}': {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            FedMcpError::Config(format!("failed to parse config file '{}': {}", path.display(), e))
        })
    }

    /// `--config`, else `$FEDMCP_CONFIG`, else `~/.fedmcp/config.toml` when it
    /// exists, else defaults. An explicitly named file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, FedMcpError> {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::load_from(explicit, std::env::var_os(CONFIG_PATH_ENV), home)
    }

    fn load_from(
        explicit: Option<&Path>,
        env_path: Option<OsString>,
        home: Option<PathBuf>,
    ) -> Result<Self, FedMcpError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = env_path.filter(|p| !p.is_empty()) {
            return Self::from_file(Path::new(&path));
        }
        if let Some(home) = home {
            let path = home.join(fedmcp_identity::FEDMCP_HOME_DIR).join(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn defaults_when_nothing_configured() {
        let dir = tempdir().unwrap();
        let config = CliConfig::load_from(None, None, Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.server_url(), DEFAULT_SERVER_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn reads_home_config() {
        let dir = tempdir().unwrap();
        let fedmcp_dir = dir.path().join(".fedmcp");
        std::fs::create_dir_all(&fedmcp_dir).unwrap();
        std::fs::write(
            fedmcp_dir.join("config.toml"),
            r#"
server_url = "https://fedmcp.example.gov"
workspace_id = "3fa85f64-5717-4562-b3fc-2c963f66afa6"
request_timeout_secs = 5
"#,
        )
        .unwrap();

        let config = CliConfig::load_from(None, None, Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.server_url(), "https://fedmcp.example.gov");
        assert_eq!(config.workspace_id.as_deref(), Some("3fa85f64-5717-4562-b3fc-2c963f66afa6"));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.key_path, None);
    }

    #[test]
    fn explicit_path_wins_over_env_and_home() {
        let dir = tempdir().unwrap();
        let explicit = dir.path().join("explicit.toml");
        let from_env = dir.path().join("env.toml");
        std::fs::write(&explicit, "log_level = \"debug\"\n").unwrap();
        std::fs::write(&from_env, "log_level = \"warn\"\n").unwrap();

        let config = CliConfig::load_from(
            Some(&explicit),
            Some(from_env.clone().into_os_string()),
            Some(dir.path().to_path_buf()),
        )
        .unwrap();
        assert_eq!(config.log_level(), "debug");

        let config =
            CliConfig::load_from(None, Some(from_env.into_os_string()), Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.log_level(), "warn");
    }

    #[test]
    fn missing_or_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        assert_matches!(
            CliConfig::load_from(Some(&dir.path().join("absent.toml")), None, None),
            Err(FedMcpError::Config(_))
        );

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "server_url = 42\n").unwrap();
        assert_matches!(CliConfig::from_file(&bad), Err(FedMcpError::Config(_)));

        std::fs::write(&bad, "sever_url = \"typo\"\n").unwrap();
        assert_matches!(CliConfig::from_file(&bad), Err(FedMcpError::Config(_)));
    }
}
