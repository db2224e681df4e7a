// Shared setup for integration tests: an isolated on-disk store and a controller
// pointed at a mock server.
#![allow(dead_code)]

use daybook::cache::CACHE_KEY;
use daybook::config::Config;
use daybook::context::TestContext;
use daybook::controller::JournalController;
use daybook::credentials::TOKEN_KEY;
use daybook::model::JournalEntry;
use daybook::notify::{ChannelNotifier, Notice};
use daybook::storage::{FileStore, KeyValueStore};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Nothing listens on the discard port; connections are refused immediately.
pub const DEAD_URL: &str = "http://127.0.0.1:9";

pub struct Harness {
    pub ctx: TestContext,
    pub store: Arc<FileStore>,
    pub app: JournalController,
    pub notices: mpsc::Receiver<Notice>,
}

impl Harness {
    pub fn new(api_url: &str) -> Self {
        let ctx = TestContext::new();
        let store = Arc::new(FileStore::new(&ctx).expect("store"));
        let config = Config {
            api_url: api_url.to_string(),
            ..Config::default()
        };
        let (notifier, notices) = ChannelNotifier::channel(64);
        let app = JournalController::with_store(&config, store.clone(), Arc::new(notifier))
            .expect("controller");
        Self {
            ctx,
            store,
            app,
            notices,
        }
    }

    pub fn with_token(self, token: &str) -> Self {
        self.store.set(TOKEN_KEY, token).unwrap();
        self
    }

    pub fn with_cached(self, entries: &[JournalEntry]) -> Self {
        self.store
            .set(CACHE_KEY, &serde_json::to_string(entries).unwrap())
            .unwrap();
        self
    }

    /// Reads the persisted snapshot through a fresh store, as a restarted app would.
    pub fn persisted(&self) -> Option<Vec<JournalEntry>> {
        let reopened = FileStore::new(&self.ctx).unwrap();
        reopened
            .get(CACHE_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    pub fn stored_token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).unwrap()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(n) = self.notices.try_recv() {
            out.push(n);
        }
        out
    }
}

pub fn entry(id: i64, title: &str) -> JournalEntry {
    JournalEntry::new(id, title, "x", "2024-01-01T00:00:00Z")
}

pub fn body(entries: &[JournalEntry]) -> String {
    serde_json::to_string(entries).unwrap()
}
