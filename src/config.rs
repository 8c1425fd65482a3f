//! Server configuration

/// Runtime configuration, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Domain this marketplace is hosted at
    pub domain: String,

    /// SQLite database path; None selects the in-memory stores
    pub db_path: Option<String>,

    /// Bootstrap admin credentials, seeded at startup when absent
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("MARKET_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            domain: std::env::var("MARKET_DOMAIN").unwrap_or_else(|_| "localhost".to_string()),
            db_path: std::env::var("MARKET_DB").ok(),
            admin_email: std::env::var("MARKET_ADMIN_EMAIL").ok(),
            admin_password: std::env::var("MARKET_ADMIN_PASSWORD").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            domain: "localhost".to_string(),
            db_path: None,
            admin_email: None,
            admin_password: None,
        }
    }
}
