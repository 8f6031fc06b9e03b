use crate::{
    chat,
    dto::chat::{ChatReply, ChatRequest},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Proxy one message to the chat model, forwarding at most the last
/// [`chat::HISTORY_WINDOW`] turns of prior conversation.
pub async fn chat(state: &AppState, payload: ChatRequest) -> AppResult<ApiResponse<ChatReply>> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".into()));
    }

    let history = chat::window(&payload.history);
    let reply = state
        .chat
        .complete(chat::SYSTEM_PROMPT, history, message)
        .await?;

    Ok(ApiResponse::success(
        "Ok",
        ChatReply { reply },
        Some(Meta::empty()),
    ))
}
