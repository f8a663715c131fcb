use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;

/// Command line flags. Anything given here wins over the environment.
#[derive(Debug, Default, Parser)]
#[command(name = "project_tracker", about = "HTTP service for tracking projects")]
pub struct Cli {
    /// Address to listen on (overrides HOST)
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on (overrides PORT)
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(long)]
    pub debug: bool,
}

/// Configuration for the application
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on pooled database connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables from a `.env` file are picked up first if one exists.
    pub fn load() -> Result<Self> {
        dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).context("invalid configuration in environment")
    }

    /// Command line flags take precedence over the environment.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(host) = cli.host {
            self.host = host;
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Load the configuration and fold in command line overrides
pub fn init(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()?;
    config.apply_cli(cli);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_in_everything_but_database_url() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/projects")]))
            .unwrap();

        assert_eq!(config.database_url(), "postgres://localhost/projects");
        assert_eq!(config.bind_addr(), "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(Config::from_vars(vars(&[("PORT", "9000")])).is_err());
    }

    #[test]
    fn bad_port_is_an_error() {
        let result = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/projects"),
            ("PORT", "eighty"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn cli_flags_override_environment() {
        let mut config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/projects"),
            ("HOST", "10.0.0.1"),
            ("PORT", "9000"),
        ]))
        .unwrap();

        let cli = Cli::parse_from(["project_tracker", "--port", "3000"]);
        config.apply_cli(&cli);

        assert_eq!(config.bind_addr(), "10.0.0.1:3000".parse::<SocketAddr>().unwrap());
    }
}
