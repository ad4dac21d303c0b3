//! API route handlers for the gateway.

use axum::extract::{Form, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use recurbot_core::error::RecurbotError;
use recurbot_core::types::NewTemplate;
use std::sync::Arc;

use super::server::AppState;

fn json_error(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (status, Json(serde_json::json!({"error": message.to_string()}))).into_response()
}

/// Serve the management page.
pub async fn dashboard_page() -> Html<&'static str> {
    Html(super::dashboard::dashboard_html())
}

/// Catch-all for unknown paths and methods.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// List all live templates.
pub async fn list_templates(State(state): State<Arc<AppState>>) -> Response {
    match state.registry.list().await {
        Ok(templates) => Json(templates).into_response(),
        Err(e) => {
            tracing::error!("List templates failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// Create a template from the browser form, then bounce back to `/`.
pub async fn create_template(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<NewTemplate>,
) -> Response {
    match state.registry.create(fields, Utc::now()).await {
        Ok(_) => (
            StatusCode::FOUND,
            [(header::LOCATION, "/")],
            "Template created",
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Create template failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error creating template: {e}"),
            )
                .into_response()
        }
    }
}

/// Delete a template. Unknown ids succeed.
pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.registry.delete(&id).await {
        Ok(()) => Json(serde_json::json!({"success": true})).into_response(),
        Err(e) => {
            tracing::error!("Delete template {id} failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// Send a template right now and return the gateway's raw answer.
pub async fn send_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.executor.send_now(&id, Utc::now()).await {
        Ok(result) => Json(result).into_response(),
        Err(RecurbotError::NotFound(_)) => {
            json_error(StatusCode::NOT_FOUND, "Template not found")
        }
        Err(e) => {
            tracing::error!("Manual send of {id} failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}
