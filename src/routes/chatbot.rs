use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::chat::{ChatReply, ChatRequest},
    error::AppResult,
    response::ApiResponse,
    services::chat_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(chatbot))
}

#[utoipa::path(
    post,
    path = "/api/chatbot",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ApiResponse<ChatReply>),
        (status = 400, description = "Empty message"),
        (status = 503, description = "Chat model unavailable or timed out"),
    ),
    tag = "Chatbot"
)]
pub async fn chatbot(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> AppResult<Json<ApiResponse<ChatReply>>> {
    Ok(Json(chat_service::chat(&state, payload).await?))
}
