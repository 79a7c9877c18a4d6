use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub temp_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres connection string. Without it the service runs on in-memory stores.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub two_factor_ttl_minutes: i64,
    /// Base used when building links sent by email.
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "watchlist".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "watchlist-users".into()),
            ttl_minutes: minutes_from_env("JWT_TTL_MINUTES", 60 * 24),
            temp_ttl_minutes: minutes_from_env("JWT_TEMP_TTL_MINUTES", 15),
        };
        Ok(Self {
            database_url,
            jwt,
            two_factor_ttl_minutes: minutes_from_env("TWO_FACTOR_TTL_MINUTES", 10),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60,
                temp_ttl_minutes: 15,
            },
            two_factor_ttl_minutes: 10,
            public_base_url: "http://localhost:3000".into(),
        }
    }
}

fn minutes_from_env(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
