use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use anyhow::Context;

/// Process configuration shared by the API server and the bot binaries.
/// Secrets (`JWT_SECRET`, `TELOXIDE_TOKEN`, `ADMIN_CHAT_ID`) are read at
/// point of use instead.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = match env::var("APP_HOST") {
            Ok(raw) => raw.parse().context("APP_HOST is not a valid IP address")?,
            Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let port = match env::var("APP_PORT") {
            Ok(raw) => raw.parse().context("APP_PORT is not a valid port")?,
            Err(_) => 3000,
        };
        Ok(Self {
            database_url,
            host,
            port,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}
