use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub database_name: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub login_rate_limit: u64,
    pub login_rate_window_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub session_ttl_days: i64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_NAME") {
            self.database.database_name = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_LOGIN_RATE_LIMIT") {
            self.api.login_rate_limit = v.parse().unwrap_or(self.api.login_rate_limit);
        }
        if let Ok(v) = env::var("API_LOGIN_RATE_WINDOW_SECS") {
            self.api.login_rate_window_secs =
                v.parse().unwrap_or(self.api.login_rate_window_secs);
        }
        if let Ok(v) = env::var("API_SWEEP_INTERVAL_SECS") {
            self.api.sweep_interval_secs = v.parse().unwrap_or(self.api.sweep_interval_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_SESSION_TTL_DAYS") {
            self.security.session_ttl_days = v.parse().unwrap_or(self.security.session_ttl_days);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                database_name: "beacon_main".to_string(),
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                login_rate_limit: 1000,
                login_rate_window_secs: 60,
                sweep_interval_secs: 600,
            },
            security: SecurityConfig {
                session_ttl_days: 30,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                database_name: "beacon_main".to_string(),
                max_connections: 20,
                connection_timeout_secs: 10,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                login_rate_limit: 20,
                login_rate_window_secs: 60,
                sweep_interval_secs: 600,
            },
            security: SecurityConfig {
                session_ttl_days: 30,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                database_name: "beacon_main".to_string(),
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                login_rate_limit: 10,
                login_rate_window_secs: 60,
                sweep_interval_secs: 600,
            },
            security: SecurityConfig {
                session_ttl_days: 30,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

// Helper macro for common checks
#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.session_ttl_days, 30);
        assert_eq!(config.api.login_rate_limit, 1000);
        assert!(config.api.enable_rate_limiting);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.api.login_rate_limit, 10);
        assert_eq!(config.api.login_rate_window_secs, 60);
        assert!(config.api.enable_rate_limiting);
    }
}
