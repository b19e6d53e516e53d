use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub presign_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bistro".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "bistro-admins".into()),
            ttl_minutes: parse_env("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: parse_env("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        let storage = StorageConfig {
            endpoint: std::env::var("MINIO_ENDPOINT")?,
            bucket: std::env::var("MINIO_BUCKET")?,
            access_key: std::env::var("MINIO_ACCESS_KEY")?,
            secret_key: std::env::var("MINIO_SECRET_KEY")?,
            region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".into()),
            presign_ttl_secs: parse_env("PRESIGN_TTL_SECS").unwrap_or(30 * 60),
        };
        let max_upload_bytes = parse_env::<usize>("MAX_UPLOAD_MB").unwrap_or(20) * 1024 * 1024;
        Ok(Self {
            database_url,
            jwt,
            storage,
            max_upload_bytes,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_ignores_garbage() {
        std::env::set_var("BISTRO_TEST_PARSE_ENV", "not-a-number");
        assert_eq!(parse_env::<u64>("BISTRO_TEST_PARSE_ENV"), None);
        std::env::set_var("BISTRO_TEST_PARSE_ENV", "42");
        assert_eq!(parse_env::<u64>("BISTRO_TEST_PARSE_ENV"), Some(42));
        assert_eq!(parse_env::<u64>("BISTRO_TEST_PARSE_ENV_MISSING"), None);
    }
}
