use crate::error::CallbackError;
use crate::models::AppState;
use crate::models::oauth::CallbackParams;
use crate::pages;
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Html,
};
use oauth2::AuthorizationCode;
use tracing::{debug, error, info, warn};

const MAX_LOGGED_DESCRIPTION: usize = 200;

/// Handles the provider's redirect: validates the code, trades it for an
/// access token, then fetches the profile the token belongs to.
#[tracing::instrument(name = "oauth_callback", skip_all)]
pub async fn callback_handler(
    query: Result<Query<CallbackParams>, QueryRejection>,
    State(app_state): State<AppState>,
) -> Result<Html<String>, CallbackError> {
    let result = match query {
        Ok(Query(params)) => complete_login(params, &app_state).await,
        Err(rejection) => {
            debug!(error = %rejection, "unreadable callback query");
            Err(CallbackError::InvalidRequest("Invalid oauth code".to_string()))
        }
    };

    match &result {
        Ok(_) => info!("oauth login completed"),
        Err(e @ CallbackError::InvalidRequest(_)) => warn!(error = %e, "oauth callback rejected"),
        Err(e) => error!(error = %e, status = %e.status_code(), "oauth login failed"),
    }

    result
}

async fn complete_login(
    params: CallbackParams,
    app_state: &AppState,
) -> Result<Html<String>, CallbackError> {
    if params.state.is_some() {
        info!("state parameter present; not validated");
    }

    if let Some(provider_error) = params.error {
        let description = params.error_description.unwrap_or_default();
        warn!(
            error = %truncate(&provider_error, MAX_LOGGED_DESCRIPTION),
            description = %truncate(&description, MAX_LOGGED_DESCRIPTION),
            "provider redirected with an error"
        );
        return Err(CallbackError::InvalidRequest(
            "Authorization was not granted".to_string(),
        ));
    }

    let code = match params.code.filter(|code| !code.is_empty()) {
        Some(code) => AuthorizationCode::new(code),
        None => return Err(CallbackError::InvalidRequest("Invalid oauth code".to_string())),
    };
    info!(code_len = code.secret().len(), "oauth code received");

    info!("start access token exchange");
    let access_token = app_state.provider.exchange_code(&code).await?;

    info!("start user api request");
    let user_name = app_state.provider.fetch_profile(&access_token).await?;

    Ok(pages::welcome_page(&user_name))
}

/// Cuts `value` to at most `max` characters for log output.
fn truncate(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
