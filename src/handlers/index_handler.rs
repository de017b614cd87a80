use crate::models::AppState;
use crate::pages;
use axum::{extract::State, response::Html};
use tracing::debug;

pub async fn index_handler(State(app_state): State<AppState>) -> Html<String> {
    debug!("rendering index page");
    pages::index_page(app_state.config.authorization_link().as_str())
}

#[cfg(test)]
mod tests {
    use crate::models::{AppConfig, AppState};
    use crate::routes::app_router;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use mockito::Server;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_index_renders_without_network_calls() {
        let mut server = Server::new_async().await;
        let any_get = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let any_post = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let config = AppConfig::for_tests(
            &format!("{}/login/oauth/access_token", server.url()),
            &format!("{}/user", server.url()),
        );
        let app = app_router(AppState::new(config).unwrap());

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("https://github.com/login/oauth/authorize?client_id=test-client"));
        any_get.assert_async().await;
        any_post.assert_async().await;
    }
}
