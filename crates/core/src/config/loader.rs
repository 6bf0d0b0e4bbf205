use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides (e.g. `HELPDESK_SERVER__PORT`).
const ENV_PREFIX: &str = "HELPDESK_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load built-in defaults with environment variable overrides, for running
/// without a config file.
pub fn load_default_config() -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn env_provider() -> Env {
    // HELPDESK_CONFIG names the config file itself, it is not a setting.
    Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_str_bad_port() {
        let toml = r#"
[server]
port = "not-a-port"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.database.path.to_str().unwrap(), "helpdesk.db");
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "helpdesk.toml",
                r#"
[server]
port = 3000

[database]
path = "from-file.db"
"#,
            )?;
            jail.set_env("HELPDESK_SERVER__PORT", "4000");
            jail.set_env("HELPDESK_DATABASE__BUSY_TIMEOUT_MS", "100");

            let config = load_config(Path::new("helpdesk.toml")).unwrap();
            assert_eq!(config.server.port, 4000);
            assert_eq!(config.database.path.to_str().unwrap(), "from-file.db");
            assert_eq!(config.database.busy_timeout_ms, 100);
            Ok(())
        });
    }

    #[test]
    fn test_load_default_config_ignores_config_path_variable() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("HELPDESK_CONFIG", "/somewhere/else.toml");
            jail.set_env("HELPDESK_DATABASE__PATH", "env.db");

            let config = load_default_config().unwrap();
            assert_eq!(config.server.port, 8000);
            assert_eq!(config.database.path.to_str().unwrap(), "env.db");
            Ok(())
        });
    }
}
