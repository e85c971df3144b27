//! Subscription management API served next to the Web Push sender.
//!
//! ```text
//! GET    /publickey       VAPID public key (text/plain, base64url)
//! POST   /subscriptions   store a subscription            200 | 400 | 500
//! DELETE /subscriptions   remove a subscription           204 | 400 | 500
//! GET    /subscriptions   JSON list of stored endpoints   200 | 500
//! ```
//! CORS is fully permissive so that any page can register itself.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;

use super::store::{Subscription, SubscriptionStore};

#[derive(Clone)]
pub(super) struct ApiState {
    pub(super) store: Arc<dyn SubscriptionStore>,
    pub(super) public_key: Arc<str>,
}

pub(super) fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/publickey", get(public_key))
        .route(
            "/subscriptions",
            get(list).post(subscribe).delete(unsubscribe),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn public_key(State(state): State<ApiState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain")],
        state.public_key.to_string(),
    )
}

async fn subscribe(State(state): State<ApiState>, body: Bytes) -> Response {
    let subscription = match decode(&body) {
        Ok(s) => s,
        Err(response) => return response,
    };
    match state.store.store(subscription).await {
        Ok(()) => {
            tracing::info!("subscription stored");
            StatusCode::OK.into_response()
        }
        Err(err) => store_failure(err),
    }
}

async fn unsubscribe(State(state): State<ApiState>, body: Bytes) -> Response {
    let subscription = match decode(&body) {
        Ok(s) => s,
        Err(response) => return response,
    };
    match state.store.delete(&subscription.endpoint).await {
        Ok(()) => {
            tracing::info!("subscription deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => store_failure(err),
    }
}

async fn list(State(state): State<ApiState>) -> Response {
    match state.store.load_all().await {
        Ok(all) => {
            let endpoints: Vec<String> = all.into_iter().map(|s| s.endpoint).collect();
            Json(endpoints).into_response()
        }
        Err(err) => store_failure(err),
    }
}

fn decode(body: &[u8]) -> Result<Subscription, Response> {
    serde_json::from_slice(body).map_err(|err| {
        tracing::warn!(error = %err, "malformed subscription");
        StatusCode::BAD_REQUEST.into_response()
    })
}

fn store_failure(err: impl std::fmt::Display) -> Response {
    tracing::error!(error = %err, "subscription repository failed");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::senders::web_push::store::InMemoryStore;

    const SUB: &str = r#"{"endpoint":"https://push.example/abc","keys":{"p256dh":"BNcR","auth":"tBHI"}}"#;

    fn app() -> Router {
        routes(ApiState {
            store: Arc::new(InMemoryStore::default()),
            public_key: "BPublic".into(),
        })
    }

    fn request(method: &str, uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn serves_the_public_key_as_text() {
        let response = app()
            .oneshot(request("GET", "/publickey", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(body_text(response).await, "BPublic");
    }

    #[tokio::test]
    async fn subscription_lifecycle() {
        let app = app();

        let stored = app
            .clone()
            .oneshot(request("POST", "/subscriptions", SUB))
            .await
            .unwrap();
        assert_eq!(stored.status(), StatusCode::OK);

        let listed = app
            .clone()
            .oneshot(request("GET", "/subscriptions", ""))
            .await
            .unwrap();
        assert_eq!(body_text(listed).await, r#"["https://push.example/abc"]"#);

        let deleted = app
            .clone()
            .oneshot(request("DELETE", "/subscriptions", SUB))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let listed = app
            .oneshot(request("GET", "/subscriptions", ""))
            .await
            .unwrap();
        assert_eq!(body_text(listed).await, "[]");
    }

    #[tokio::test]
    async fn malformed_subscription_is_a_bad_request() {
        let response = app()
            .oneshot(request("POST", "/subscriptions", r#"{"endpoint":1}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/publickey")
                    .header("origin", "https://elsewhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
