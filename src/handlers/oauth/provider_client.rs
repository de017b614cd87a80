use crate::error::{CallbackError, Stage};
use crate::models::AppConfig;
use crate::models::oauth::{ProfileResponse, TokenExchangeResponse};
use crate::redact::summarize_body;
use oauth2::{AccessToken, AuthorizationCode, ClientId, ClientSecret, TokenUrl};
use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Outbound calls to the identity provider. Cloning shares the connection pool.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    client_id: ClientId,
    client_secret: ClientSecret,
    token_url: TokenUrl,
    user_url: Url,
}

impl ProviderClient {
    /// Every request made through this client is bounded by `upstream_timeout`.
    /// Token endpoints answer directly, so redirects are not followed.
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_url: config.token_url.clone(),
            user_url: config.user_url.clone(),
        })
    }

    pub async fn exchange_code(
        &self,
        code: &AuthorizationCode,
    ) -> Result<AccessToken, CallbackError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.secret().as_str()),
            ("code", code.secret().as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.as_str())
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| CallbackError::upstream(Stage::TokenExchange, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CallbackError::upstream(Stage::TokenExchange, e))?;
        debug!(%status, body = %summarize_body(&body), "token endpoint responded");

        let token: TokenExchangeResponse = decode_object(Stage::TokenExchange, &body)?;

        match token.access_token {
            Some(access_token) => {
                debug!(token_type = ?token.token_type, scope = ?token.scope, "access token issued");
                Ok(AccessToken::new(access_token))
            }
            None => {
                let reason = match token.provider_error() {
                    Some(provider_error) => format!("provider returned {}", provider_error),
                    None => format!("HTTP {} response has no string access_token", status),
                };
                Err(CallbackError::TokenExtractionFailed { reason })
            }
        }
    }

    /// Returns the display name of the user the token belongs to.
    pub async fn fetch_profile(&self, access_token: &AccessToken) -> Result<String, CallbackError> {
        let response = self
            .http
            .get(self.user_url.clone())
            .header(AUTHORIZATION, format!("token {}", access_token.secret()))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CallbackError::upstream(Stage::ProfileFetch, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CallbackError::upstream(Stage::ProfileFetch, e))?;
        debug!(%status, body = %summarize_body(&body), "user endpoint responded");

        let profile: ProfileResponse = decode_object(Stage::ProfileFetch, &body)?;

        match profile.name {
            Some(name) => Ok(name),
            None => {
                debug!(has_login = profile.login.is_some(), "profile has no display name");
                Err(CallbackError::ProfileExtractionFailed {
                    reason: format!("HTTP {} response has no string name", status),
                })
            }
        }
    }
}

fn decode_object<T: DeserializeOwned>(stage: Stage, body: &str) -> Result<T, CallbackError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| CallbackError::malformed(stage, e.to_string()))?;

    if !value.is_object() {
        return Err(CallbackError::malformed(
            stage,
            format!("expected a JSON object, got {}", summarize_body(body)),
        ));
    }

    serde_json::from_value(value).map_err(|e| CallbackError::malformed(stage, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn client_for(server: &ServerGuard) -> ProviderClient {
        let config = AppConfig::for_tests(
            &format!("{}/login/oauth/access_token", server.url()),
            &format!("{}/user", server.url()),
        );
        ProviderClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn exchange_posts_credentials_as_form() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/login/oauth/access_token")
            .match_header("accept", "application/json")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("client_id".into(), "test-client".into()),
                Matcher::UrlEncoded("client_secret".into(), "test-secret".into()),
                Matcher::UrlEncoded("code".into(), "abc123".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok_xyz","token_type":"bearer","scope":""}"#)
            .expect(1)
            .create_async()
            .await;

        let token = client_for(&server)
            .exchange_code(&AuthorizationCode::new("abc123".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(token.secret(), "tok_xyz");
    }

    #[tokio::test]
    async fn exchange_reports_provider_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/login/oauth/access_token")
            .with_status(200)
            .with_body(r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .exchange_code(&AuthorizationCode::new("stale".to_string()))
            .await
            .unwrap_err();

        match err {
            CallbackError::TokenExtractionFailed { reason } => {
                assert!(reason.contains("bad_verification_code"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn exchange_rejects_json_array() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/login/oauth/access_token")
            .with_status(200)
            .with_body(r#"["tok_xyz"]"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .exchange_code(&AuthorizationCode::new("abc123".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CallbackError::MalformedUpstreamResponse {
                stage: Stage::TokenExchange,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn profile_fetch_sends_token_authorization() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/user")
            .match_header("authorization", "token tok_xyz")
            .match_header("accept", "application/json")
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_body(r#"{"login":"ada","name":"Ada Lovelace"}"#)
            .expect(1)
            .create_async()
            .await;

        let name = client_for(&server)
            .fetch_profile(&AccessToken::new("tok_xyz".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn profile_with_non_string_name_is_extraction_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/user")
            .with_status(200)
            .with_body(r#"{"login":"ada","name":42}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_profile(&AccessToken::new("tok_xyz".to_string()))
            .await
            .unwrap_err();

        match err {
            CallbackError::ProfileExtractionFailed { reason } => {
                assert!(reason.contains("no string name"));
                assert!(!reason.contains("ada"));
                assert!(!reason.contains("tok_xyz"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn profile_non_json_is_malformed_at_profile_stage() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/user")
            .with_status(200)
            .with_body("not-json")
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_profile(&AccessToken::new("tok_xyz".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CallbackError::MalformedUpstreamResponse {
                stage: Stage::ProfileFetch,
                ..
            }
        ));
    }
}
