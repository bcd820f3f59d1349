use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::users::{Contact, Credentials, NewUser, Product, User, UserPatch, WalletOperation};
use crate::services::document::DocumentRequest;
use crate::services::ServiceError;

fn user_summary(user: &User) -> serde_json::Value {
    json!({
        "userID": user.user_id,
        "fullName": user.full_name,
        "wallet": user.wallet,
        "createdAt": user.created_at,
        "lastLogin": user.last_login,
    })
}

fn service_error_response(e: &ServiceError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match e {
        ServiceError::DuplicateUser(_) => StatusCode::CONFLICT,
        ServiceError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
        ServiceError::InsufficientFunds(_, _) | ServiceError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "error": e.to_string() })))
}

fn internal_error(details: String) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal server error",
            "details": details
        })),
    )
}

fn user_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "User not found" })),
    )
}

pub async fn create_user(
    State(state): State<super::AppState>,
    Json(new_user): Json<NewUser>,
) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::CreateUser {
            new_user,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return internal_error(e.to_string());
    }

    match user_rx.await {
        Ok(Ok(user)) => (StatusCode::CREATED, Json(user_summary(&user))),
        Ok(Err(service_error)) => service_error_response(&service_error),
        Err(e) => internal_error(e.to_string()),
    }
}

pub async fn get_user(
    State(state): State<super::AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::GetUser {
            id: user_id,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return internal_error(e.to_string());
    }

    match user_rx.await {
        Ok(Ok(Some(user))) => (StatusCode::OK, Json(user_summary(&user))),
        Ok(Ok(None)) => user_not_found(),
        Ok(Err(service_error)) => service_error_response(&service_error),
        Err(e) => internal_error(e.to_string()),
    }
}

pub async fn update_user(
    State(state): State<super::AppState>,
    Path(user_id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::UpdateUser {
            id: user_id,
            patch,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return internal_error(e.to_string());
    }

    match user_rx.await {
        Ok(Ok(Some(user))) => (StatusCode::OK, Json(user_summary(&user))),
        Ok(Ok(None)) => user_not_found(),
        Ok(Err(service_error)) => service_error_response(&service_error),
        Err(e) => internal_error(e.to_string()),
    }
}

pub async fn login(
    State(state): State<super::AppState>,
    Json(credentials): Json<Credentials>,
) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::Login {
            id: credentials.user_id,
            password: credentials.password,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return internal_error(e.to_string());
    }

    match user_rx.await {
        Ok(Ok(user)) => (StatusCode::OK, Json(user_summary(&user))),
        Ok(Err(service_error)) => service_error_response(&service_error),
        Err(e) => internal_error(e.to_string()),
    }
}

pub async fn top_up(
    State(state): State<super::AppState>,
    Path(user_id): Path<String>,
    Json(operation): Json<WalletOperation>,
) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::TopUp {
            id: user_id,
            amount: operation.amount,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return internal_error(e.to_string());
    }

    match user_rx.await {
        Ok(Ok(Some(user))) => (
            StatusCode::OK,
            Json(json!({ "userID": user.user_id, "wallet": user.wallet })),
        ),
        Ok(Ok(None)) => user_not_found(),
        Ok(Err(service_error)) => service_error_response(&service_error),
        Err(e) => internal_error(e.to_string()),
    }
}

pub async fn withdraw(
    State(state): State<super::AppState>,
    Path(user_id): Path<String>,
    Json(operation): Json<WalletOperation>,
) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::Withdraw {
            id: user_id,
            amount: operation.amount,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return internal_error(e.to_string());
    }

    match user_rx.await {
        Ok(Ok(Some(user))) => (
            StatusCode::OK,
            Json(json!({ "userID": user.user_id, "wallet": user.wallet })),
        ),
        Ok(Ok(None)) => user_not_found(),
        Ok(Err(service_error)) => service_error_response(&service_error),
        Err(e) => internal_error(e.to_string()),
    }
}

pub async fn add_contact(
    State(state): State<super::AppState>,
    Path(user_id): Path<String>,
    Json(contact): Json<Contact>,
) -> impl IntoResponse {
    let (contact_tx, contact_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::AddContact {
            id: user_id,
            contact,
            response: contact_tx,
        })
        .await;
    if let Err(e) = send_result {
        return internal_error(e.to_string());
    }

    match contact_rx.await {
        Ok(Ok(Some(contact))) => (StatusCode::CREATED, Json(contact)),
        Ok(Ok(None)) => user_not_found(),
        Ok(Err(service_error)) => service_error_response(&service_error),
        Err(e) => internal_error(e.to_string()),
    }
}

pub async fn get_contacts(
    State(state): State<super::AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (contacts_tx, contacts_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::GetContacts {
            id: user_id,
            response: contacts_tx,
        })
        .await;
    if let Err(e) = send_result {
        return internal_error(e.to_string());
    }

    match contacts_rx.await {
        Ok(Ok(Some(contacts))) => (StatusCode::OK, Json(json!(contacts))),
        Ok(Ok(None)) => user_not_found(),
        Ok(Err(service_error)) => service_error_response(&service_error),
        Err(e) => internal_error(e.to_string()),
    }
}

pub async fn add_product(
    State(state): State<super::AppState>,
    Path(user_id): Path<String>,
    Json(product): Json<Product>,
) -> impl IntoResponse {
    let (product_tx, product_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::AddProduct {
            id: user_id,
            product,
            response: product_tx,
        })
        .await;
    if let Err(e) = send_result {
        return internal_error(e.to_string());
    }

    match product_rx.await {
        Ok(Ok(Some(product))) => (StatusCode::CREATED, Json(json!(product))),
        Ok(Ok(None)) => user_not_found(),
        Ok(Err(service_error)) => service_error_response(&service_error),
        Err(e) => internal_error(e.to_string()),
    }
}

pub async fn get_products(
    State(state): State<super::AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (products_tx, products_rx) = oneshot::channel();

    let send_result = state
        .document_channel
        .send(DocumentRequest::GetProducts {
            id: user_id,
            response: products_tx,
        })
        .await;
    if let Err(e) = send_result {
        return internal_error(e.to_string());
    }

    match products_rx.await {
        Ok(Ok(Some(products))) => (StatusCode::OK, Json(json!(products))),
        Ok(Ok(None)) => user_not_found(),
        Ok(Err(service_error)) => service_error_response(&service_error),
        Err(e) => internal_error(e.to_string()),
    }
}
