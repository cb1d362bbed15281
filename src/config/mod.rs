use serde::{Deserialize, Serialize};

pub mod loader;

pub use loader::AppConfig;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5006,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            jwt_secret: "change-me-in-production".to_string(),
            token_ttl_secs: 86400,  // 24 hours
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EmailConfig {
    pub sender_name: String,
    pub sender_address: String,
    /// Base URL of the web client, used to build registration links in
    /// outbound loan notifications.
    pub frontend_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            sender_name: "Peerledger".to_string(),
            sender_address: "no-reply@peerledger.app".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            max_requests: 120,
            window_secs: 60,
        }
    }
}
