use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which display app this process instance serves. The two controllers are
/// mutually exclusive per instance; running both means running two
/// instances with different package names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppKind {
    TicTacToe,
    Teleprompter,
}

impl AppKind {
    pub fn default_package_name(&self) -> &'static str {
        match self {
            AppKind::TicTacToe => "com.lenslet.tictactoe",
            AppKind::Teleprompter => "com.lenslet.teleprompter",
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub cloud_host: String,
    pub app: AppKind,
    pub package_name: String,
    pub api_key: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let cloud_host = std::env::var("CLOUD_HOST").unwrap_or_else(|_| "cloud".to_string());

        let app_str = std::env::var("LENSLET_APP").unwrap_or_else(|_| "teleprompter".to_string());
        let app = match app_str.to_lowercase().as_str() {
            "tictactoe" => AppKind::TicTacToe,
            "teleprompter" => AppKind::Teleprompter,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LENSLET_APP".to_string(),
                    format!("'{}' is not a known app", other),
                ));
            }
        };

        let package_name = std::env::var("PACKAGE_NAME")
            .unwrap_or_else(|_| app.default_package_name().to_string());

        let api_key =
            std::env::var("API_KEY").map_err(|_| ConfigError::MissingVar("API_KEY".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            cloud_host,
            app,
            package_name,
            api_key,
            log_level,
        })
    }

    /// WebSocket endpoint of the cloud display transport.
    pub fn cloud_ws_url(&self) -> String {
        format!("ws://{}/app-ws", self.cloud_host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("CLOUD_HOST");
            env::remove_var("LENSLET_APP");
            env::remove_var("PACKAGE_NAME");
            env::remove_var("API_KEY");
            env::remove_var("RUST_LOG");
        }
    }

    fn set_minimal_env() {
        unsafe {
            env::set_var("API_KEY", "test-key");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8080");
        assert_eq!(config.cloud_host, "cloud");
        assert_eq!(config.app, AppKind::Teleprompter);
        assert_eq!(config.package_name, "com.lenslet.teleprompter");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.cloud_ws_url(), "ws://cloud/app-ws");
    }

    #[test]
    #[serial]
    fn test_config_from_env_tictactoe_app() {
        clear_env_vars();
        unsafe {
            env::set_var("API_KEY", "test-key");
            env::set_var("LENSLET_APP", "tictactoe");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.app, AppKind::TicTacToe);
        assert_eq!(config.package_name, "com.lenslet.tictactoe");
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:9090");
            env::set_var("CLOUD_HOST", "cloud.internal:7002");
            env::set_var("LENSLET_APP", "teleprompter");
            env::set_var("PACKAGE_NAME", "com.example.prompter");
            env::set_var("API_KEY", "custom-key");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:9090");
        assert_eq!(config.cloud_host, "cloud.internal:7002");
        assert_eq!(config.package_name, "com.example.prompter");
        assert_eq!(config.api_key, "custom-key");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.cloud_ws_url(), "ws://cloud.internal:7002/app-ws");
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
            env::set_var("API_KEY", "test-key");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_app() {
        clear_env_vars();
        unsafe {
            env::set_var("API_KEY", "test-key");
            env::set_var("LENSLET_APP", "minesweeper");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "LENSLET_APP"),
            _ => panic!("Expected InvalidValue for LENSLET_APP"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_api_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(var) => assert_eq!(var, "API_KEY"),
            _ => panic!("Expected MissingVar for API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("API_KEY", "test-key");
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }
}
