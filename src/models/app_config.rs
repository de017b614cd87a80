use crate::handlers::oauth::provider_client::ProviderClient;
use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use reqwest::Url;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const DEFAULT_USER_URL: &str = "https://api.github.com/user";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not found")]
    Missing(&'static str),
    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: oauth2::url::ParseError,
    },
    #[error("{name} must be a positive integer, got `{value}`")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} is not a valid socket address: `{value}`")]
    InvalidAddr { name: &'static str, value: String },
}

/// Provider credentials and endpoints, read once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub authorize_url: AuthUrl,
    pub token_url: TokenUrl,
    pub user_url: Url,
    pub redirect_url: Option<RedirectUrl>,
    pub listen_addr: SocketAddr,
    pub upstream_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        use dotenvy::dotenv;
        use std::env;

        dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));
        let or_default =
            |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let client_id = ClientId::new(required("OAUTH_CLIENT_ID")?);
        let client_secret = ClientSecret::new(required("OAUTH_CLIENT_SECRET")?);

        let authorize_url =
            AuthUrl::new(or_default("OAUTH_AUTHORIZE_URL", DEFAULT_AUTHORIZE_URL)).map_err(
                |source| ConfigError::InvalidUrl {
                    name: "OAUTH_AUTHORIZE_URL",
                    source,
                },
            )?;
        let token_url = TokenUrl::new(or_default("OAUTH_TOKEN_URL", DEFAULT_TOKEN_URL)).map_err(
            |source| ConfigError::InvalidUrl {
                name: "OAUTH_TOKEN_URL",
                source,
            },
        )?;
        let user_url = Url::parse(&or_default("OAUTH_USER_URL", DEFAULT_USER_URL)).map_err(
            |source| ConfigError::InvalidUrl {
                name: "OAUTH_USER_URL",
                source,
            },
        )?;
        let redirect_url = get("OAUTH_REDIRECT_URL")
            .map(RedirectUrl::new)
            .transpose()
            .map_err(|source| ConfigError::InvalidUrl {
                name: "OAUTH_REDIRECT_URL",
                source,
            })?;

        let listen_value = or_default("LISTEN_ADDR", DEFAULT_LISTEN_ADDR);
        let listen_addr = listen_value
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddr {
                name: "LISTEN_ADDR",
                value: listen_value.clone(),
            })?;

        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        name: "UPSTREAM_TIMEOUT_SECS",
                        value,
                    });
                }
            },
        };

        Ok(Self {
            client_id,
            client_secret,
            authorize_url,
            token_url,
            user_url,
            redirect_url,
            listen_addr,
            upstream_timeout,
        })
    }

    #[cfg(test)]
    pub fn for_tests(token_url: &str, user_url: &str) -> Self {
        Self::for_tests_with_timeout(token_url, user_url, "5")
    }

    #[cfg(test)]
    pub fn for_tests_with_timeout(token_url: &str, user_url: &str, timeout_secs: &str) -> Self {
        let vars = [
            ("OAUTH_CLIENT_ID", "test-client"),
            ("OAUTH_CLIENT_SECRET", "test-secret"),
            ("OAUTH_TOKEN_URL", token_url),
            ("OAUTH_USER_URL", user_url),
            ("UPSTREAM_TIMEOUT_SECS", timeout_secs),
        ];

        Self::from_lookup(|name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        })
        .expect("test config should be valid")
    }

    /// Link target for the landing page: the provider's consent screen for this client.
    pub fn authorization_link(&self) -> Url {
        let mut url = self.authorize_url.url().clone();

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", self.client_id.as_str());
            if let Some(redirect_url) = &self.redirect_url {
                query.append_pair("redirect_uri", redirect_url.as_str());
            }
        }

        url
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub provider: ProviderClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let provider = ProviderClient::new(&config)?;

        Ok(Self { config, provider })
    }
}
