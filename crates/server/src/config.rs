use std::net::SocketAddr;

use anyhow::{Context, Result};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Server configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("SSO_SERVER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind_addr = raw
            .parse()
            .with_context(|| format!("parse SSO_SERVER_BIND: {raw}"))?;
        Ok(Self { bind_addr })
    }
}
