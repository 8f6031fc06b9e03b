use std::sync::Arc;

use crate::{
    chat::ChatModel,
    db::{DbPool, OrmConn},
    identity::TokenVerifier,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub verifier: Arc<dyn TokenVerifier>,
    pub chat: Arc<dyn ChatModel>,
}
