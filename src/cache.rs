// Shared journal snapshot: fetch from the backend, persist, fall back to the last good copy.
//
// Policy for `load(false)`: publish the persisted snapshot first (if it holds anything),
// then always try the network. A successful fetch replaces the snapshot wholesale and
// overwrites the persisted copy; a failed one changes nothing. Concurrent loads are not
// deduplicated, the last one to finish wins.
use crate::auth::AuthGate;
use crate::model::JournalEntry;
use crate::notify::{Notice, SharedNotifier};
use crate::storage::KeyValueStore;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

pub const CACHE_KEY: &str = "@cached_journals";

#[derive(Debug, Default)]
struct Indicators {
    loading: AtomicBool,
    refreshing: AtomicBool,
}

/// Clears both indicators when the load ends, whichever way it ends.
struct LoadGuard<'a>(&'a Indicators);

impl<'a> LoadGuard<'a> {
    fn begin(ind: &'a Indicators, force_refresh: bool) -> Self {
        ind.loading.store(!force_refresh, Ordering::SeqCst);
        ind.refreshing.store(force_refresh, Ordering::SeqCst);
        Self(ind)
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.loading.store(false, Ordering::SeqCst);
        self.0.refreshing.store(false, Ordering::SeqCst);
    }
}

pub struct JournalCache {
    gate: Arc<AuthGate>,
    store: Arc<dyn KeyValueStore>,
    notifier: SharedNotifier,
    snapshot: RwLock<Vec<JournalEntry>>,
    indicators: Indicators,
}

impl JournalCache {
    pub fn new(
        gate: Arc<AuthGate>,
        store: Arc<dyn KeyValueStore>,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            gate,
            store,
            notifier,
            snapshot: RwLock::new(Vec::new()),
            indicators: Indicators::default(),
        }
    }

    /// Current snapshot. Empty until something has loaded.
    pub fn get_entries(&self) -> Vec<JournalEntry> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_loading(&self) -> bool {
        self.indicators.loading.load(Ordering::SeqCst)
    }

    pub fn is_refreshing(&self) -> bool {
        self.indicators.refreshing.load(Ordering::SeqCst)
    }

    fn publish(&self, entries: Vec<JournalEntry>) {
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = entries;
    }

    /// Reads the persisted snapshot. Missing or unparseable data reads as empty.
    pub fn load_persisted(&self) -> Vec<JournalEntry> {
        let raw = match self.store.get(CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::error!("Error loading journals from storage: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<JournalEntry>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Cached journals are corrupted, ignoring them: {}", e);
                Vec::new()
            }
        }
    }

    fn persist(&self, entries: &[JournalEntry]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.store.set(CACHE_KEY, &json)
    }

    /// Runs the fetch-or-cache protocol. Never fails; problems surface as notices.
    pub async fn load(&self, force_refresh: bool) {
        let _guard = LoadGuard::begin(&self.indicators, force_refresh);

        if !force_refresh {
            let cached = self.load_persisted();
            if !cached.is_empty() {
                log::debug!("Serving {} cached journals", cached.len());
                self.publish(cached);
                self.indicators.loading.store(false, Ordering::SeqCst);
            }
        }

        let Some(token) = self.gate.token() else {
            log::debug!("No auth token found; skipping journal fetch");
            return;
        };

        match self.gate.api().list_entries(&token).await {
            Ok(fetched) => {
                let fetched = dedup_by_id(fetched);
                let count = fetched.len();
                if let Err(e) = self.persist(&fetched) {
                    log::error!("Error saving journals to storage: {}", e);
                }
                self.publish(fetched);
                self.notifier.notify(Notice::success(
                    "Journals Updated",
                    format!("{} entries loaded", count),
                ));
            }
            Err(e) => {
                if e.is_transient() {
                    log::warn!("Error fetching journals, keeping cached copy: {}", e);
                } else {
                    log::error!("Error fetching journals: {}", e);
                }
                self.gate.handle_auth_error(&e);
                self.notifier
                    .notify(Notice::error("Could Not Load Journals", e.user_message()));
            }
        }
    }

    /// Pull-to-refresh.
    pub async fn refresh(&self) {
        self.load(true).await
    }

    /// Drops the in-memory and persisted snapshot (used on logout).
    pub fn clear(&self) {
        self.publish(Vec::new());
        if let Err(e) = self.store.remove(CACHE_KEY) {
            log::error!("Error clearing cached journals: {}", e);
        }
    }
}

/// Keeps the first occurrence of each id, preserving order.
fn dedup_by_id(entries: Vec<JournalEntry>) -> Vec<JournalEntry> {
    let mut seen = HashSet::new();
    let before = entries.len();
    let out: Vec<JournalEntry> = entries
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect();
    if out.len() != before {
        log::warn!("Server returned {} duplicate journal ids", before - out.len());
    }
    out
}
