//! Application state - the client context plus how login is presented.

use std::sync::Arc;

use anyhow::Context;

use babbly_core::domain::{AccessToken, ProfileState};
use babbly_core::ports::LoginNavigator;
use babbly_infra::{AppContext, JwtIdentityDecoder};

use crate::config::AppConfig;

/// A terminal cannot redirect; it tells the user where to sign in.
pub struct ConsoleNavigator {
    login_url: String,
}

impl ConsoleNavigator {
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
        }
    }
}

impl LoginNavigator for ConsoleNavigator {
    fn redirect_to_login(&self) {
        tracing::warn!(login_url = %self.login_url, "Login required");
        eprintln!(
            "You need to log in. Sign in at {} and set BABBLY_ACCESS_TOKEN.",
            self.login_url
        );
    }
}

pub struct AppState {
    pub ctx: Arc<AppContext>,
}

impl AppState {
    /// Build the context and, when tokens are configured, sign in.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let navigator = Arc::new(ConsoleNavigator::new(config.client.login_url.clone()));
        let ctx = AppContext::connect(config.client.clone(), navigator)
            .context("failed to build the gateway transport")?;

        let state = Self { ctx: Arc::new(ctx) };

        if let Some(access_token) = &config.access_token {
            let id_token = config.id_token.as_deref().unwrap_or(access_token);
            let decoder = JwtIdentityDecoder::new(config.issuer.as_deref());
            let profile = state
                .ctx
                .establish_from_tokens(&decoder, id_token, AccessToken::new(access_token.clone()))
                .await
                .context("could not read identity from token")?;

            if let ProfileState::Provisional { error, .. } = &profile {
                tracing::warn!(%error, "Continuing without a synced profile");
            }
        } else {
            tracing::debug!("No access token configured, running anonymously");
        }

        tracing::info!(api_url = %config.client.api_url, "Application state initialized");
        Ok(state)
    }
}
