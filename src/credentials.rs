// Bearer token access on top of the persistent key-value store.
use crate::storage::KeyValueStore;
use anyhow::Result;
use std::sync::Arc;

pub const TOKEN_KEY: &str = "authToken";

/// Reads go to the store every time; the token is never held in memory between calls.
#[derive(Clone, Debug)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// `None` means logged out. Unreadable storage is reported as logged out too.
    pub fn get_token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                log::warn!("Could not read stored token: {}", e);
                None
            }
        }
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.store.set(TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)
    }
}
