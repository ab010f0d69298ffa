use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use dotenvy::dotenv;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub addr: String,
    pub port: u16,
    pub cors_origin: String,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_minutes")]
    pub access_token_expires_minutes: i64,
    #[serde(default = "default_refresh_days")]
    pub refresh_token_expires_days: i64,
}

// Keeps the signing secret out of the startup log.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field(
                "access_token_expires_minutes",
                &self.access_token_expires_minutes,
            )
            .field("refresh_token_expires_days", &self.refresh_token_expires_days)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_minutes() -> i64 {
    5
}

fn default_refresh_days() -> i64 {
    1
}

impl AppConfig {
    /// Loads `Config.toml` and overlays `APP_`-prefixed environment variables,
    /// e.g. `APP_DATABASE__URL` or `APP_JWT__SECRET`.
    pub fn from_env() -> Result<Self, figment::Error> {
        dotenv().ok();

        let config: Result<Self, figment::Error> = Figment::new()
            .merge(Toml::file("Config.toml")) // For non-sensitive defaults
            .merge(Env::prefixed("APP_").split("__"))
            .extract();

        match &config {
            Ok(config) => tracing::info!("Configuration loaded successfully: {:?}", config),
            Err(e) => tracing::error!("Failed to load configuration: {}", e),
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn env_overrides_toml_and_defaults_apply() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [web]
                addr = "127.0.0.1"
                port = 8000
                cors_origin = "http://localhost:3000"

                [database]
                url = "sqlite://leads.db"
                "#,
            )?;
            jail.set_env("APP_JWT__SECRET", "from-env");
            jail.set_env("APP_WEB__PORT", "9000");

            let config = AppConfig::from_env().expect("config should load");
            assert_eq!(config.web.port, 9000);
            assert_eq!(config.jwt.secret, "from-env");
            assert_eq!(config.jwt.access_token_expires_minutes, 5);
            assert_eq!(config.jwt.refresh_token_expires_days, 1);
            assert_eq!(config.database.max_connections, 5);
            assert!(!format!("{:?}", config.jwt).contains("from-env"));
            Ok(())
        });
    }

    #[test]
    fn missing_secret_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [web]
                addr = "127.0.0.1"
                port = 8000
                cors_origin = "http://localhost:3000"

                [database]
                url = "sqlite://leads.db"
                "#,
            )?;
            assert!(AppConfig::from_env().is_err());
            Ok(())
        });
    }
}
