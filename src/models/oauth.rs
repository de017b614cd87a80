use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Query string of the provider's redirect back to `/oauth/redirect`.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Body of the token endpoint. Fields that are present with the wrong JSON
/// type decode as `None`; callers must check the body is an object first.
#[derive(Debug, Default, Deserialize)]
pub struct TokenExchangeResponse {
    #[serde(default, deserialize_with = "string_or_none")]
    pub access_token: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub scope: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub error_description: Option<String>,
}

impl TokenExchangeResponse {
    /// Provider-reported reason for a missing token, e.g. GitHub's
    /// `bad_verification_code` delivered with a 200 status.
    pub fn provider_error(&self) -> Option<String> {
        match (&self.error, &self.error_description) {
            (Some(error), Some(description)) => Some(format!("{}: {}", error, description)),
            (Some(error), None) => Some(error.clone()),
            (None, Some(description)) => Some(description.clone()),
            (None, None) => None,
        }
    }
}

/// Body of the user-info endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default, deserialize_with = "string_or_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub login: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(Some(value)),
        _ => Ok(None),
    }
}
