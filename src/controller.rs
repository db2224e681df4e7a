// File: src/controller.rs
//! Entry point for front ends.
//!
//! Bundles the auth gate and the shared journal cache, and implements the two entry
//! mutations (create, delete). Both go straight to the backend; the cache is then
//! refreshed so every consumer sees the server's view.
use crate::auth::{AuthGate, AuthState, RegisterForm};
use crate::cache::JournalCache;
use crate::client::{ApiClient, ApiError};
use crate::config::Config;
use crate::context::AppContext;
use crate::credentials::TokenStore;
use crate::model::{EntryId, JournalEntry, NewEntry};
use crate::notify::{Notice, SharedNotifier};
use crate::storage::{FileStore, KeyValueStore};
use anyhow::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct JournalController {
    pub gate: Arc<AuthGate>,
    pub cache: Arc<JournalCache>,
    notifier: SharedNotifier,
}

impl JournalController {
    pub fn new(gate: Arc<AuthGate>, cache: Arc<JournalCache>, notifier: SharedNotifier) -> Self {
        Self {
            gate,
            cache,
            notifier,
        }
    }

    /// Wires everything from a store, a config and a notice sink.
    pub fn with_store(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        notifier: SharedNotifier,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::from_config(config)?;
        let gate = Arc::new(AuthGate::new(
            api,
            TokenStore::new(store.clone()),
            notifier.clone(),
        ));
        let cache = Arc::new(JournalCache::new(gate.clone(), store, notifier.clone()));
        Ok(Self::new(gate, cache, notifier))
    }

    /// Same as `with_store`, backed by the on-disk store of `ctx`.
    pub fn open(ctx: &dyn AppContext, config: &Config, notifier: SharedNotifier) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(ctx)?);
        Ok(Self::with_store(config, store, notifier)?)
    }

    /// App start: validate the stored token, then populate the cache.
    pub async fn start(&self) -> AuthState {
        let state = self.gate.validate().await;
        self.cache.load(false).await;
        state
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.cache.get_entries()
    }

    fn require_token(&self) -> Result<String, ApiError> {
        self.gate.token().ok_or(ApiError::NotLoggedIn)
    }

    /// Creates an entry. Title and content are trimmed; both empty is rejected locally.
    pub async fn create_entry(
        &self,
        title: &str,
        content: &str,
    ) -> Result<Option<JournalEntry>, ApiError> {
        let entry = NewEntry {
            title: title.trim().to_string(),
            content: content.trim().to_string(),
        };
        if entry.title.is_empty() && entry.content.is_empty() {
            self.notifier.notify(Notice::error(
                "Empty Entry",
                "Please write something before saving.",
            ));
            return Err(ApiError::Invalid("entry is empty".to_string()));
        }

        let token = self.require_token()?;
        match self.gate.api().create_entry(&token, &entry).await {
            Ok(created) => {
                log::info!("Journal saved");
                self.notifier.notify(Notice::success(
                    "Journal Saved",
                    "Your journal entry has been saved successfully.",
                ));
                self.cache.refresh().await;
                Ok(created)
            }
            Err(e) => {
                log::error!("Error saving journal: {}", e);
                self.gate.handle_auth_error(&e);
                self.notifier
                    .notify(Notice::error("Error Saving Journal", e.user_message()));
                Err(e)
            }
        }
    }

    pub async fn delete_entry(&self, id: &EntryId) -> Result<(), ApiError> {
        let token = self.require_token()?;
        match self.gate.api().delete_entry(&token, id).await {
            Ok(()) => {
                self.notifier
                    .notify(Notice::success("Journal Deleted", format!("Entry {} removed.", id)));
                self.cache.refresh().await;
                Ok(())
            }
            Err(e) => {
                log::error!("Error deleting journal {}: {}", id, e);
                self.gate.handle_auth_error(&e);
                self.notifier
                    .notify(Notice::error("Error Deleting Journal", e.user_message()));
                Err(e)
            }
        }
    }

    /// Logs in. The persisted snapshot is not tied to an account, so whatever a previous
    /// session left behind is dropped before the new token is used.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        self.gate.login(email, password).await?;
        self.cache.clear();
        Ok(())
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<(), ApiError> {
        self.gate.register(form).await?;
        self.cache.clear();
        Ok(())
    }

    /// Ends the session and forgets the cached entries.
    pub async fn logout(&self) {
        self.gate.logout().await;
        self.cache.clear();
    }

    pub async fn delete_account(&self) -> Result<(), ApiError> {
        self.gate.delete_account().await?;
        self.cache.clear();
        Ok(())
    }
}
