use crate::security::AccessGate;
use crate::services::{ServiceResult, StudioError};
use std::{env, net::SocketAddr};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_ADMIN_PASSWORD: &str = "studio-admin";

/// Server configuration loaded from environment.
#[derive(Clone)]
pub struct StudioConfig {
    pub bind_addr: SocketAddr,
    pub admin_password: String,
}

impl StudioConfig {
    pub fn from_env() -> ServiceResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ServiceResult<Self> {
        let raw_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = raw_addr.parse().map_err(|_| {
            StudioError::Config(format!("invalid BIND_ADDR {raw_addr:?}, expected host:port"))
        })?;
        let admin_password = lookup("ADMIN_PASSWORD")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.into());
        Ok(Self {
            bind_addr,
            admin_password,
        })
    }

    pub fn gate(&self) -> AccessGate {
        AccessGate::new(self.admin_password.clone())
    }
}
