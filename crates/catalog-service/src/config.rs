use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "catalog-service")]
#[command(about = "HTTP service for the product catalog")]
pub struct Args {
    #[arg(long, env = "CATALOG_DB", default_value = "./catalog.sqlite3")]
    pub db: PathBuf,
    #[arg(long, env = "CATALOG_BIND", default_value = "127.0.0.1:4020")]
    pub bind: SocketAddr,
    #[arg(long, env = "CATALOG_ENVIRONMENT", value_enum, default_value_t = Environment::Local)]
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Local,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Unauthenticated helper routes such as user provisioning are only mounted locally.
    #[must_use]
    pub fn exposes_private_routes(self) -> bool {
        matches!(self, Self::Local)
    }
}
