use std::env;
use std::net::SocketAddr;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::apply_security_headers;

pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub identity_jwt_secret: String,
    pub upload_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/stagepass".to_string()),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            identity_jwt_secret: env::var("IDENTITY_JWT_SECRET")
                .unwrap_or_else(|_| "dev-only-identity-secret".to_string()),
            upload_base_url: env::var("UPLOAD_BASE_URL")
                .unwrap_or_else(|_| "https://media.stagepass.local".to_string()),
        }
    }
}
