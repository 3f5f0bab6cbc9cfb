use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::signaling::{DEFAULT_SIGNALING_PORT, IceServer};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read ICE server file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ICE server file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("ICE server file {0} lists no servers")]
    Empty(PathBuf),
}

/// Session rendezvous server for two-party peer-to-peer connections
#[derive(Parser, Clone, Debug)]
#[command(name = "concierge", version, about)]
pub struct Config {
    /// Bind address
    #[arg(long, env = "CONCIERGE_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Port to listen on
    #[arg(long, env = "CONCIERGE_PORT", default_value_t = DEFAULT_SIGNALING_PORT)]
    pub port: u16,

    /// Enable structured JSON logging
    #[arg(long, env = "CONCIERGE_JSON_LOGS")]
    pub json_logs: bool,

    /// ICE server URL(s) advertised to clients
    #[arg(long, env = "TANDEM_ICE_URLS", default_value = "stun:stun.l.google.com:19302")]
    pub ice_urls: String,

    /// Username for the advertised ICE server
    #[arg(long, env = "TANDEM_ICE_USERNAME", default_value = "")]
    pub ice_username: String,

    /// Credential for the advertised ICE server
    #[arg(long, env = "TANDEM_ICE_CREDENTIAL", default_value = "", hide_env_values = true)]
    pub ice_credential: String,

    /// Display location of the advertised ICE server (empty to omit)
    #[arg(long, env = "TANDEM_ICE_LOCATION", default_value = "Google")]
    pub ice_location: String,

    /// JSON file with a list of ICE servers; replaces the single server above
    #[arg(long, env = "TANDEM_ICE_SERVERS_FILE")]
    pub ice_servers_file: Option<PathBuf>,
}

impl Config {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// The static ICE server list handed to every client
    pub fn ice_servers(&self) -> Result<Vec<IceServer>, ConfigError> {
        match &self.ice_servers_file {
            Some(path) => load_ice_servers(path),
            None => Ok(vec![IceServer {
                urls: self.ice_urls.clone(),
                username: self.ice_username.clone(),
                credential: self.ice_credential.clone(),
                location: Some(self.ice_location.clone()).filter(|l| !l.is_empty()),
            }]),
        }
    }
}

fn load_ice_servers(path: &PathBuf) -> Result<Vec<IceServer>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let servers: Vec<IceServer> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
    if servers.is_empty() {
        return Err(ConfigError::Empty(path.clone()));
    }
    Ok(servers)
}
