use clap::Parser;

use crate::config::AppConfig;

#[derive(Parser, Debug, Default)]
#[command(name = "users-api")]
#[command(about = "Users API - CRUD over a PostgreSQL users table")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Address to listen on, e.g. 0.0.0.0:8080 or :8080")]
    pub address: Option<String>,

    #[arg(long, help = "PostgreSQL connection string (overrides DATABASE_URL)")]
    pub database_url: Option<String>,
}

impl Cli {
    /// Command-line flags win over environment configuration
    pub fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(address) = self.address {
            config.api.address = normalize_address(&address);
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        config
    }
}

/// Accept the bare `:port` form by binding every interface
fn normalize_address(address: &str) -> String {
    match address.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => address.to_string(),
    }
}
