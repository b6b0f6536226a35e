use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// Rate limiting is disabled when absent.
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    /// Events only reach the log when absent.
    #[serde(default)]
    pub kafka: Option<KafkaConfig>,
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    /// How far past the new departure time a delayed flight's cancellation deadlines move.
    #[serde(default = "default_deadline_extension")]
    pub deadline_extension_minutes: i64,
    #[serde(default = "default_max_group_size")]
    pub max_group_size: usize,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

fn default_deadline_extension() -> i64 { 60 }
fn default_max_group_size() -> usize { 50 }
fn default_rate_limit() -> i64 { 100 }

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            deadline_extension_minutes: default_deadline_extension(),
            max_group_size: default_max_group_size(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

fn default_max_connections() -> u32 { 10 }
fn default_acquire_timeout() -> u64 { 3 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `SKYBOOK__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("SKYBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [server]
            port = 3000
            [database]
            url = "postgres://localhost/skybook"
            [auth]
            jwt_secret = "secret"
            "#,
        );

        assert!(config.redis.is_none());
        assert!(config.kafka.is_none());
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.booking.deadline_extension_minutes, 60);
        assert_eq!(config.booking.max_group_size, 50);
    }

    #[test]
    fn test_booking_rules_override() {
        let config = parse(
            r#"
            [server]
            port = 8080
            [database]
            url = "postgres://db/skybook"
            acquire_timeout_seconds = 10
            [redis]
            url = "redis://127.0.0.1/"
            [auth]
            jwt_secret = "secret"
            [booking]
            deadline_extension_minutes = 90
            "#,
        );

        assert_eq!(config.database.acquire_timeout_seconds, 10);
        assert_eq!(config.redis.map(|r| r.url).as_deref(), Some("redis://127.0.0.1/"));
        assert_eq!(config.booking.deadline_extension_minutes, 90);
        assert_eq!(config.booking.rate_limit_per_minute, 100);
    }
}
