use anyhow::{Context, Result};

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub studio: StudioConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: std::env::var("DATABASE_HOST").context("DATABASE_HOST is not set")?,
            port: parse_var("DATABASE_PORT")?,
            username: std::env::var("DATABASE_USERNAME")
                .context("DATABASE_USERNAME is not set")?,
            password: std::env::var("DATABASE_PASSWORD")
                .context("DATABASE_PASSWORD is not set")?,
            database: std::env::var("DATABASE_NAME").context("DATABASE_NAME is not set")?,
        };
        let redis = RedisConfig {
            host: std::env::var("REDIS_HOST").context("REDIS_HOST is not set")?,
            port: parse_var("REDIS_PORT")?,
        };
        let auth = AuthConfig {
            ttl: parse_var("AUTH_TOKEN_TTL")?,
        };
        // スタジオの営業時間とタイムゾーンは未設定ならデフォルト値を使う
        let studio = StudioConfig {
            utc_offset_hours: parse_var_or("STUDIO_UTC_OFFSET_HOURS", 0)?,
            open_hour: parse_var_or("STUDIO_OPEN_HOUR", 9)?,
            close_hour: parse_var_or("STUDIO_CLOSE_HOUR", 22)?,
        };
        anyhow::ensure!(
            (-23..=23).contains(&studio.utc_offset_hours),
            "STUDIO_UTC_OFFSET_HOURS must be between -23 and 23"
        );
        anyhow::ensure!(
            studio.open_hour < studio.close_hour && studio.close_hour <= 24,
            "STUDIO_OPEN_HOUR must be before STUDIO_CLOSE_HOUR (at most 24)"
        );
        let server = ServerConfig {
            port: parse_var_or("SERVER_PORT", 8080)?,
        };
        Ok(Self {
            database,
            redis,
            auth,
            studio,
            server,
        })
    }
}

fn parse_var<T>(key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    std::env::var(key)
        .with_context(|| format!("{key} is not set"))?
        .parse()
        .with_context(|| format!("{key} has an invalid value"))
}

fn parse_var_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v
            .parse()
            .with_context(|| format!("{key} has an invalid value")),
        Err(_) => Ok(default),
    }
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

pub struct AuthConfig {
    pub ttl: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct StudioConfig {
    pub utc_offset_hours: i32,
    pub open_hour: u32,
    pub close_hour: u32,
}

pub struct ServerConfig {
    pub port: u16,
}
