use super::{AppState, ChatBody, ReportBody, StorageBody, StorageQuery};
use crate::error::StorageError;
use crate::session::ConversationHistory;
use crate::storage::decode_data_url;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

/// GET /health
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /chat — relay one turn, then regenerate the report in the
/// background without blocking the reply.
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let Json(chat_body) = match body {
        Ok(b) => b,
        Err(e) => {
            let err = serde_json::json!({
                "error": format!("Invalid JSON: {e}. Expected: {{\"messages\": [...]}}")
            });
            return (StatusCode::BAD_REQUEST, Json(err));
        }
    };

    let reply = match state
        .orchestrator
        .chat_turn(&chat_body.messages, chat_body.report_image_url.as_deref())
        .await
    {
        Ok(reply) => reply,
        Err(error) => {
            tracing::error!(%error, "chat turn failed");
            let err = serde_json::json!({
                "error": "Sorry, something went wrong while answering. Please try again."
            });
            return (StatusCode::BAD_GATEWAY, Json(err));
        }
    };

    // Fire-and-forget: the visible chat turn never waits on report
    // generation. The completion channel is dropped here; outcomes are
    // logged by the orchestrator.
    let mut messages = chat_body.messages;
    messages.push(reply.clone());
    drop(state.orchestrator.spawn_report(ConversationHistory {
        messages,
        code: chat_body.code,
        timestamp: None,
    }));

    (StatusCode::OK, Json(serde_json::json!({ "message": reply })))
}

/// POST /report — synchronous report generation for the capture client.
pub(super) async fn handle_report(
    State(state): State<AppState>,
    body: Result<Json<ReportBody>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let Json(report_body) = match body {
        Ok(b) => b,
        Err(e) => {
            let err = serde_json::json!({
                "error": format!("Invalid JSON: {e}. Expected: {{\"history\": {{...}}}}")
            });
            return (StatusCode::BAD_REQUEST, Json(err));
        }
    };

    match state.orchestrator.generate_report(&report_body.history).await {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::json!({ "report": record })),
        ),
        Err(error) => {
            tracing::error!(%error, "report generation failed");
            let err = serde_json::json!({ "error": "Failed to generate the context report." });
            (StatusCode::BAD_GATEWAY, Json(err))
        }
    }
}

/// POST /storage — persist a captured report image under its code.
pub(super) async fn handle_storage_put(
    State(state): State<AppState>,
    body: Result<Json<StorageBody>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let Json(storage_body) = match body {
        Ok(b) => b,
        Err(e) => {
            let err = serde_json::json!({
                "error": format!("Invalid JSON: {e}. Expected: {{\"data_url\": \"...\", \"code\": \"...\"}}")
            });
            return (StatusCode::BAD_REQUEST, Json(err));
        }
    };

    let image = match decode_data_url(&storage_body.data_url) {
        Ok(bytes) => bytes,
        Err(error) => {
            let err = serde_json::json!({ "error": error.to_string() });
            return (StatusCode::BAD_REQUEST, Json(err));
        }
    };

    match state
        .orchestrator
        .store()
        .put(&storage_body.code, &image)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "code": storage_body.code })),
        ),
        Err(error) => storage_error_response(&error),
    }
}

/// GET /storage?code=... — resolve a submitted code to its stored image.
pub(super) async fn handle_storage_get(
    State(state): State<AppState>,
    Query(query): Query<StorageQuery>,
) -> impl IntoResponse {
    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        let err = serde_json::json!({ "error": "A code query parameter is required." });
        return (StatusCode::BAD_REQUEST, Json(err));
    };

    match state.orchestrator.submit_code(&code).await {
        Ok(image_url) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "code": code,
                "imageUrl": image_url
            })),
        ),
        Err(error) => storage_error_response(&error),
    }
}

fn storage_error_response(error: &StorageError) -> (StatusCode, Json<serde_json::Value>) {
    match error {
        StorageError::InvalidCode { .. } | StorageError::InvalidImage(_) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": error.to_string() })),
        ),
        StorageError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Invalid or unknown code." })),
        ),
        StorageError::Backend(_) => {
            tracing::error!(%error, "storage backend failure");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": "Storage request failed. Please try again." })),
            )
        }
    }
}
