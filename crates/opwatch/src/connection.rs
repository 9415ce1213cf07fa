//! Connection management: build an authenticated API client from config or environment

use crate::error::Result as CliResult;
use opwatch_core::{Config, HttpClient};
use tracing::{debug, info, trace};

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<std::path::PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Create an API client from profile credentials with environment variable override support
    ///
    /// When --config-file is explicitly specified, environment variables are ignored to provide
    /// true configuration isolation (CLI args > env vars > defaults).
    pub fn create_client(&self, profile_name: Option<&str>) -> CliResult<HttpClient> {
        debug!("Creating API client");
        trace!("Profile name: {:?}", profile_name);

        let use_env_vars = self.config_path.is_none();
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let env_api_url = std::env::var("OPWATCH_API_URL").ok().filter(|_| use_env_vars);
        let env_api_token = std::env::var("OPWATCH_API_TOKEN")
            .ok()
            .filter(|_| use_env_vars);

        let (api_url, api_token) = match (env_api_url, env_api_token) {
            (Some(url), Some(token)) if profile_name.is_none() => {
                info!("Using API credentials from environment variables");
                (url, token)
            }
            _ => {
                let (name, profile) = self.config.profile(profile_name)?;
                info!("Using profile: {}", name);
                (profile.api_url.clone(), profile.api_token.clone())
            }
        };

        debug!("API URL: {}", api_url);
        Ok(HttpClient::new(&api_url, &api_token)?)
    }
}
