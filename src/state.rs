use std::sync::Arc;

use crate::chat::ChatClient;
use crate::config::Config;
use crate::store::UserStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: UserStore,
    pub chat: ChatClient,
}

impl AppState {
    pub fn new(config: Config, store: UserStore, chat: ChatClient) -> Self {
        Self {
            config: Arc::new(config),
            store,
            chat,
        }
    }
}
