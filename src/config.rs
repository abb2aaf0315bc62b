use log::warn;

pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub s3: Option<S3Config>,
}

pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("GRID_WARS_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let database_url =
            std::env::var("GRID_WARS_DB").unwrap_or_else(|_| "sqlite://grid-wars.db".to_string());

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET is not set, using a random secret. Tokens will not survive restarts.");
            uuid::Uuid::new_v4().to_string()
        });

        let ttl_hours = std::env::var("JWT_EXPIRES_IN_HOURS")
            .ok()
            .and_then(|h| h.parse().ok())
            .unwrap_or(168);
        let token_ttl = chrono::Duration::hours(ttl_hours);

        let s3 = std::env::var("AWS_S3_BUCKET_NAME").ok().map(|bucket| S3Config {
            bucket,
            region: std::env::var("AWS_S3_REGION").unwrap_or_else(|_| "eu-north-1".to_string()),
            endpoint_url: std::env::var("AWS_S3_ENDPOINT_URL").ok(),
        });

        Self {
            port,
            database_url,
            jwt_secret,
            token_ttl,
            s3,
        }
    }
}
