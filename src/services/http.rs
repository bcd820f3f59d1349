use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use super::document::DocumentRequest;

mod users;

#[derive(Clone)]
struct AppState {
    document_channel: mpsc::Sender<DocumentRequest>,
}

/// Overwrites the whole document with the demo seed.
async fn initialize(State(state): State<AppState>) -> impl IntoResponse {
    let (document_tx, document_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::Initialize {
            response: document_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error", "details": e.to_string() })),
        );
    }

    match document_rx.await {
        Ok(Ok(document)) => (
            StatusCode::CREATED,
            Json(json!({ "seeded": true, "users": document.users.len() })),
        ),
        Ok(Err(service_error)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": service_error.to_string() })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error", "details": e.to_string() })),
        ),
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/initialize", post(initialize))
        .route("/users", post(users::create_user))
        .route(
            "/users/{user_id}",
            get(users::get_user).put(users::update_user),
        )
        .route("/login", post(users::login))
        .route("/users/{user_id}/wallet/topup", post(users::top_up))
        .route("/users/{user_id}/wallet/withdraw", post(users::withdraw))
        .route(
            "/users/{user_id}/contacts",
            post(users::add_contact).get(users::get_contacts),
        )
        .route(
            "/users/{user_id}/products",
            post(users::add_product).get(users::get_products),
        )
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(
    listen: &str,
    document_channel: mpsc::Sender<DocumentRequest>,
) -> Result<(), anyhow::Error> {
    let app_state = AppState { document_channel };

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app(app_state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::fallback::FallbackStore;
    use crate::services::document::{DocumentRequestHandler, DocumentService};
    use crate::services::Service;
    use serde_json::json;

    async fn spawn_app(dir: &std::path::Path) -> String {
        let fallback = FallbackStore::open(dir).unwrap();
        let handler = DocumentRequestHandler::new(
            "test-master-key".to_string(),
            "http://127.0.0.1:1".to_string(),
            fallback,
        );

        let (document_tx, mut document_rx) = mpsc::channel(512);
        let mut document_service = DocumentService::new();
        tokio::spawn(async move {
            document_service.run(handler, &mut document_rx).await;
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let state = AppState {
            document_channel: document_tx,
        };
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });

        url
    }

    #[tokio::test]
    async fn create_fetch_and_login_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let url = spawn_app(dir.path()).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/users", url))
            .json(&json!({ "userID": "alice", "password": "x", "fullName": "Alice" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let response = client
            .get(format!("{}/users/alice", url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["userID"], "alice");
        assert_eq!(body["fullName"], "Alice");
        // Credentials stay out of responses.
        assert!(body.get("password").is_none());

        let response = client
            .post(format!("{}/login", url))
            .json(&json!({ "userID": "alice", "password": "bad" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);

        let response = client
            .get(format!("{}/users/nobody", url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn initialize_resets_to_seed_document() {
        let dir = tempfile::tempdir().unwrap();
        let url = spawn_app(dir.path()).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/initialize", url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["users"], 1);

        let response = client
            .get(format!("{}/users/tmp101", url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_registration_answers_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let url = spawn_app(dir.path()).await;
        let client = reqwest::Client::new();

        let payload = json!({ "userID": "bob", "password": "x", "fullName": "Bob" });
        client
            .post(format!("{}/users", url))
            .json(&payload)
            .send()
            .await
            .unwrap();

        let response = client
            .post(format!("{}/users", url))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
    }
}
