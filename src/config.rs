use std::env;
use secrecy::SecretString;

const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";

#[derive(Clone, Debug)]
pub struct Config {
    pub app_env: String,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub users_collection: String,
    pub refresh_tokens_collection: String,
    pub redis_url: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub public_base_url: String,
    pub cors_allowed_origin: String,
    pub jwt_secret: SecretString,
    pub jwt_access_expiration_minutes: i64,
    pub jwt_refresh_expiration_hours: i64,
    pub password_reset_expiration_minutes: i64,
    pub bcrypt_cost: u32,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let web_server_host = env_or("WEB_SERVER_HOST", "localhost");
        let web_server_port = env_parse_or("WEB_SERVER_PORT", 5000);

        Self {
            app_env: env_or("APP_ENV", "development"),
            mongo_conn_string: env_or("MONGO_CONN_STRING", "mongodb://localhost:27017"),
            mongo_db_name: env_or("MONGO_DB_NAME", "quizypal-local"),
            users_collection: env_or("USERS_COLLECTION", "users"),
            refresh_tokens_collection: env_or("REFRESH_TOKENS_COLLECTION", "refresh_tokens"),
            redis_url: env_or("REDIS_URL", "redis://localhost:6379/0"),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://{}:{}", web_server_host, web_server_port)),
            cors_allowed_origin: env_or("CORS_ALLOWED_ORIGIN", "http://localhost:5173"),
            web_server_host,
            web_server_port,
            jwt_secret: SecretString::from(env_or("JWT_SECRET", DEFAULT_JWT_SECRET)),
            jwt_access_expiration_minutes: env_parse_or("JWT_ACCESS_EXPIRATION_MINUTES", 15),
            jwt_refresh_expiration_hours: env_parse_or("JWT_REFRESH_EXPIRATION_HOURS", 168),
            password_reset_expiration_minutes: env_parse_or(
                "PASSWORD_RESET_EXPIRATION_MINUTES",
                60,
            ),
            bcrypt_cost: env_parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }

        if self.jwt_refresh_expiration_hours <= 0 || self.jwt_access_expiration_minutes <= 0 {
            panic!("FATAL: token lifetimes must be positive");
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            app_env: "test".to_string(),
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "quizypal-test".to_string(),
            users_collection: "users".to_string(),
            refresh_tokens_collection: "refresh_tokens".to_string(),
            redis_url: "redis://localhost:6379/0".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 5000,
            public_base_url: "http://127.0.0.1:5000".to_string(),
            cors_allowed_origin: "http://localhost:5173".to_string(),
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_access_expiration_minutes: 15,
            jwt_refresh_expiration_hours: 72,
            password_reset_expiration_minutes: 60,
            bcrypt_cost: 4,
        }
    }
}
