use std::{
    env,
    net::{IpAddr, SocketAddr},
};

use crate::error::AppError;

pub const DEFAULT_DATABASE_NAME: &str = "ride_social";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Store connection string as given in the environment, if any.
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host: IpAddr = non_empty("HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid HOST: {err}")))?;
        let port: u16 = match non_empty("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|err| AppError::Config(format!("invalid PORT: {err}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            database_name: non_empty("DATABASE_NAME"),
            listen_addr: SocketAddr::new(host, port),
        })
    }

    pub fn database_name(&self) -> &str {
        self.database_name
            .as_deref()
            .unwrap_or(DEFAULT_DATABASE_NAME)
    }

    pub fn connection_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}.db?mode=rwc", self.database_name()),
        }
    }
}
