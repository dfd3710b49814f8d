//! Application configuration loaded from environment variables and flags.

use std::env;

use babbly_infra::ClientConfig;

use crate::cli::Cli;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    /// Expected ID-token issuer, when pinned.
    pub issuer: Option<String>,
}

impl AppConfig {
    /// Load configuration from the environment, with command line flags
    /// taking precedence.
    pub fn from_env(cli: &Cli) -> Self {
        Self::from_vars(cli, |key| env::var(key).ok())
    }

    fn from_vars(cli: &Cli, var: impl Fn(&str) -> Option<String>) -> Self {
        let mut client = ClientConfig::from_vars(&var);
        if let Some(api_url) = &cli.api_url {
            client.set_api_url(api_url);
        }

        Self {
            client,
            access_token: cli.access_token.clone().filter(|t| !t.is_empty()),
            id_token: cli.id_token.clone().filter(|t| !t.is_empty()),
            issuer: var("BABBLY_ID_TOKEN_ISSUER"),
        }
    }
}
