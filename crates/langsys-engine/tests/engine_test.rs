//! End-to-end tests for the translation engine against a mock remote API

use async_trait::async_trait;
use langsys_api::TranslationApi;
use langsys_common::{
    LangsysError, LocaleInfo, MissingTokenRecord, Result, TranslationData, UNCATEGORIZED,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};

use langsys_engine::{DurableStore, EngineConfig, EngineOptions, TranslationEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitMode {
    Ok,
    NetworkError,
    Rejected,
}

/// Test double for the remote translation manager
struct MockApi {
    translations: Mutex<HashMap<String, TranslationData>>,
    fetch_calls: Mutex<Vec<String>>,
    submitted: Mutex<Vec<Vec<MissingTokenRecord>>>,
    submit_mode: Mutex<SubmitMode>,
    locales: Mutex<Vec<LocaleInfo>>,
    locale_calls: Mutex<usize>,
    // When set, submit_missing waits for a notification before returning
    submit_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockApi {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            translations: Mutex::new(HashMap::new()),
            fetch_calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            submit_mode: Mutex::new(SubmitMode::Ok),
            locales: Mutex::new(Vec::new()),
            locale_calls: Mutex::new(0),
            submit_gate: Mutex::new(None),
        })
    }

    fn set_translations(&self, locale: &str, data: TranslationData) {
        self.translations.lock().insert(locale.to_string(), data);
    }

    fn set_submit_mode(&self, mode: SubmitMode) {
        *self.submit_mode.lock() = mode;
    }

    fn fetch_count(&self) -> usize {
        self.fetch_calls.lock().len()
    }

    fn submitted_batches(&self) -> Vec<Vec<MissingTokenRecord>> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl TranslationApi for MockApi {
    async fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch_translations(&self, locale: &str) -> Result<TranslationData> {
        self.fetch_calls.lock().push(locale.to_string());
        self.translations
            .lock()
            .get(locale)
            .cloned()
            .ok_or_else(|| LangsysError::network("no route to server"))
    }

    async fn submit_missing(&self, records: &[MissingTokenRecord]) -> Result<()> {
        let gate = self.submit_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match *self.submit_mode.lock() {
            SubmitMode::Ok => {
                self.submitted.lock().push(records.to_vec());
                Ok(())
            }
            SubmitMode::NetworkError => Err(LangsysError::network("connection refused")),
            SubmitMode::Rejected => Err(LangsysError::validation_with_errors(
                "Server rejected request data",
                vec!["token must not be empty".to_string()],
            )),
        }
    }

    async fn list_locales_data(&self, _in_locale: &str) -> Result<Vec<LocaleInfo>> {
        *self.locale_calls.lock() += 1;
        Ok(self.locales.lock().clone())
    }
}

fn payload_fr() -> TranslationData {
    let mut uncategorized = HashMap::new();
    uncategorized.insert("Home".to_string(), Some("Accueil".to_string()));

    let mut menu = HashMap::new();
    menu.insert("Home".to_string(), Some("Accueil (menu)".to_string()));

    let mut data = TranslationData::new();
    data.insert(UNCATEGORIZED.to_string(), uncategorized);
    data.insert("Menu".to_string(), menu);
    data
}

async fn configured_engine(api: Arc<MockApi>) -> (TranslationEngine, watch::Sender<String>) {
    let store = DurableStore::temporary().unwrap();
    let engine = TranslationEngine::new(api, &store);
    let (tx, rx) = watch::channel(String::new());
    engine
        .setup(EngineConfig::new("proj-1", "key"), rx)
        .await
        .unwrap();
    (engine, tx)
}

#[tokio::test]
async fn resolved_tokens_come_from_cache_without_queueing() {
    let api = MockApi::new();
    api.set_translations("fr", payload_fr());
    let (engine, _tx) = configured_engine(Arc::clone(&api)).await;

    assert!(engine.on_locale_change("fr", false).await);

    assert_eq!(engine.resolve("Home"), "Accueil");
    assert_eq!(engine.resolve("{[Menu]} Home"), "Accueil (menu)");
    assert!(engine.queued_missing_tokens().is_empty());
}

#[tokio::test]
async fn unseen_token_queues_exactly_one_record() {
    let api = MockApi::new();
    let (engine, _tx) = configured_engine(api).await;

    assert_eq!(engine.resolve("{[UI]} Save"), "Save");
    assert_eq!(engine.resolve("{[UI]} Save"), "Save");
    assert_eq!(engine.resolve("Save"), "Save");

    let queued = engine.queued_missing_tokens();
    // Same token under different categories is two records; repeats are not
    assert_eq!(queued.len(), 2);
    assert!(queued
        .iter()
        .any(|r| r.category == "UI" && r.token == "Save"));
    assert!(queued.iter().any(|r| r.category.is_empty() && r.token == "Save"));
}

#[tokio::test]
async fn cooldown_allows_one_fetch_per_window() {
    let api = MockApi::new();
    api.set_translations("fr", payload_fr());
    let (engine, _tx) = configured_engine(Arc::clone(&api)).await;

    assert!(engine.on_locale_change("fr", false).await);
    assert!(!engine.on_locale_change("fr", false).await);
    assert_eq!(api.fetch_count(), 1);

    // force bypasses the window
    assert!(engine.on_locale_change("fr", true).await);
    assert_eq!(api.fetch_count(), 2);
}

#[tokio::test]
async fn empty_locale_and_failed_fetch_do_not_refresh() {
    let api = MockApi::new();
    api.set_translations("fr", payload_fr());
    let (engine, _tx) = configured_engine(Arc::clone(&api)).await;

    assert!(!engine.on_locale_change("", false).await);
    assert_eq!(api.fetch_count(), 0);

    // "de" is unknown to the mock, so the fetch fails
    assert!(engine.on_locale_change("fr", false).await);
    assert!(!engine.on_locale_change("de", false).await);

    // Previous cache survives a failed fetch
    assert_eq!(engine.resolve("Home"), "Accueil");

    // No success recorded for "de": the next attempt fetches again
    assert!(!engine.on_locale_change("de", false).await);
    assert_eq!(api.fetch_count(), 3);
}

#[tokio::test]
async fn locale_signal_drives_refresh() {
    let api = MockApi::new();
    api.set_translations("fr", payload_fr());
    let (engine, tx) = configured_engine(Arc::clone(&api)).await;

    tx.send("fr".to_string()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(api.fetch_count(), 1);
    assert_eq!(engine.active_locale(), "fr");
    assert_eq!(engine.resolve("Home"), "Accueil");
}

#[tokio::test]
async fn replace_guarantees_uncategorized_category() {
    let api = MockApi::new();
    let mut payload = TranslationData::new();
    let mut menu = HashMap::new();
    menu.insert("Home".to_string(), Some("Accueil".to_string()));
    payload.insert("Menu".to_string(), menu);
    api.set_translations("fr", payload);

    let (engine, _tx) = configured_engine(api).await;
    assert!(engine.on_locale_change("fr", false).await);

    let data = engine.subscribe().borrow().clone();
    assert!(data.contains_key(UNCATEGORIZED));
}

#[tokio::test]
async fn successful_flush_marks_pending_and_drains_snapshot() {
    let api = MockApi::new();
    let (engine, _tx) = configured_engine(Arc::clone(&api)).await;

    engine.resolve("Settings");
    engine.resolve("{[UI]} Save");
    assert_eq!(engine.queued_missing_tokens().len(), 2);

    engine.flush_once().await;

    assert!(engine.queued_missing_tokens().is_empty());
    let batches = api.submitted_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);

    // Pending entries suppress re-queueing until the next full refresh
    assert_eq!(engine.resolve("Settings"), "Settings");
    assert_eq!(engine.resolve("{[UI]} Save"), "Save");
    assert!(engine.queued_missing_tokens().is_empty());
}

#[tokio::test]
async fn records_enqueued_during_flight_survive_the_flush() {
    let api = MockApi::new();
    let gate = Arc::new(Notify::new());
    *api.submit_gate.lock() = Some(Arc::clone(&gate));

    let store = DurableStore::temporary().unwrap();
    let engine = Arc::new(TranslationEngine::new(
        Arc::clone(&api) as Arc<dyn TranslationApi>,
        &store,
    ));
    let (_tx, rx) = watch::channel(String::new());
    engine
        .setup(EngineConfig::new("proj-1", "key"), rx)
        .await
        .unwrap();

    engine.resolve("Settings");

    let flushing = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.flush_once().await })
    };

    // Arrives while the submission is in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    engine.resolve("Profile");

    gate.notify_one();
    flushing.await.unwrap();

    let remaining = engine.queued_missing_tokens();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].token, "Profile");
}

#[tokio::test]
async fn transport_failure_keeps_the_batch_queued() {
    let api = MockApi::new();
    api.set_submit_mode(SubmitMode::NetworkError);
    let (engine, _tx) = configured_engine(Arc::clone(&api)).await;

    engine.resolve("Settings");
    engine.flush_once().await;

    // Still queued for the next tick, and still not marked pending
    assert_eq!(engine.queued_missing_tokens().len(), 1);

    api.set_submit_mode(SubmitMode::Ok);
    engine.flush_once().await;
    assert!(engine.queued_missing_tokens().is_empty());
    assert_eq!(api.submitted_batches().len(), 1);
}

#[tokio::test]
async fn rejected_batch_is_dropped_not_retried_forever() {
    let api = MockApi::new();
    api.set_submit_mode(SubmitMode::Rejected);
    let (engine, _tx) = configured_engine(Arc::clone(&api)).await;

    engine.resolve("Settings");
    engine.flush_once().await;

    assert!(engine.queued_missing_tokens().is_empty());
    assert!(api.submitted_batches().is_empty());

    // Later legitimate tokens are not starved
    api.set_submit_mode(SubmitMode::Ok);
    engine.resolve("Profile");
    engine.flush_once().await;
    assert_eq!(api.submitted_batches().len(), 1);
    assert_eq!(api.submitted_batches()[0][0].token, "Profile");
}

#[tokio::test]
async fn retried_submission_cannot_fork_pending_state() {
    let api = MockApi::new();
    let (engine, _tx) = configured_engine(Arc::clone(&api)).await;

    engine.resolve("Settings");
    engine.flush_once().await;

    // A false-negative network error would make the engine resubmit; the
    // reconciliation must stay idempotent
    engine.resolve("Settings");
    engine.flush_once().await;

    let data = engine.subscribe().borrow().clone();
    let uncategorized = &data[UNCATEGORIZED];
    assert_eq!(
        uncategorized.iter().filter(|(k, _)| *k == "Settings").count(),
        1
    );
    assert_eq!(uncategorized["Settings"], None);
}

#[tokio::test]
async fn timer_flushes_without_explicit_calls() {
    let api = MockApi::new();
    let store = DurableStore::temporary().unwrap();
    let engine = TranslationEngine::with_options(
        Arc::clone(&api) as Arc<dyn TranslationApi>,
        &store,
        EngineOptions {
            flush_interval: Duration::from_millis(50),
            ..EngineOptions::default()
        },
    );
    let (_tx, rx) = watch::channel(String::new());
    engine
        .setup(EngineConfig::new("proj-1", "key"), rx)
        .await
        .unwrap();

    engine.resolve("Settings");
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(engine.queued_missing_tokens().is_empty());
    assert_eq!(api.submitted_batches().len(), 1);
}

#[tokio::test]
async fn refresh_bypasses_cooldown_for_current_locale() {
    let api = MockApi::new();
    api.set_translations("fr", payload_fr());
    let (engine, _tx) = configured_engine(Arc::clone(&api)).await;

    assert!(engine.on_locale_change("fr", false).await);
    assert!(engine.refresh().await);
    assert_eq!(api.fetch_count(), 2);
}

#[tokio::test]
async fn language_name_uses_cached_directory() {
    let api = MockApi::new();
    *api.locales.lock() = vec![
        LocaleInfo {
            code: "fr".to_string(),
            locale_name: "French (France)".to_string(),
            lang_name: "French".to_string(),
        },
        LocaleInfo {
            code: "de".to_string(),
            locale_name: "German (Germany)".to_string(),
            lang_name: "German".to_string(),
        },
    ];
    let (engine, _tx) = configured_engine(Arc::clone(&api)).await;

    assert_eq!(
        engine.language_name("fr", false).await.as_deref(),
        Some("French (France)")
    );
    assert_eq!(
        engine.language_name("fr", true).await.as_deref(),
        Some("French")
    );
    assert_eq!(engine.language_name("xx", false).await, None);
    assert_eq!(engine.language_name("", false).await, None);

    // Directory is fetched once and reused
    assert_eq!(*api.locale_calls.lock(), 1);
}

#[tokio::test]
async fn end_to_end_missing_token_lifecycle() {
    let api = MockApi::new();
    let mut uncategorized = HashMap::new();
    uncategorized.insert("Home".to_string(), Some("Accueil".to_string()));
    let mut payload = TranslationData::new();
    payload.insert(UNCATEGORIZED.to_string(), uncategorized);
    api.set_translations("fr", payload);

    let (engine, tx) = configured_engine(Arc::clone(&api)).await;

    tx.send("fr".to_string()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(engine.resolve("Home"), "Accueil");
    assert_eq!(engine.resolve("Settings"), "Settings");
    assert_eq!(engine.queued_missing_tokens().len(), 1);

    engine.flush_once().await;

    // Still the bare token, but no further reports until the next refresh
    assert_eq!(engine.resolve("Settings"), "Settings");
    assert!(engine.queued_missing_tokens().is_empty());

    // A full refresh with a translation resolves it for good
    let mut uncategorized = HashMap::new();
    uncategorized.insert("Home".to_string(), Some("Accueil".to_string()));
    uncategorized.insert("Settings".to_string(), Some("Paramètres".to_string()));
    let mut payload = TranslationData::new();
    payload.insert(UNCATEGORIZED.to_string(), uncategorized);
    api.set_translations("fr", payload);

    assert!(engine.on_locale_change("fr", true).await);
    assert_eq!(engine.resolve("Settings"), "Paramètres");
}

#[tokio::test]
async fn cache_survives_engine_restart() {
    let api = MockApi::new();
    api.set_translations("fr", payload_fr());
    let dir = tempfile::tempdir().unwrap();

    {
        let store = DurableStore::open(dir.path()).unwrap();
        let engine =
            TranslationEngine::new(Arc::clone(&api) as Arc<dyn TranslationApi>, &store);
        let (_tx, rx) = watch::channel(String::new());
        engine
            .setup(EngineConfig::new("proj-1", "key"), rx)
            .await
            .unwrap();
        assert!(engine.on_locale_change("fr", false).await);
    }

    // A fresh process serves the persisted cache before any fetch
    let store = DurableStore::open(dir.path()).unwrap();
    let engine = TranslationEngine::new(Arc::clone(&api) as Arc<dyn TranslationApi>, &store);
    let (_tx, rx) = watch::channel(String::new());
    engine
        .setup(EngineConfig::new("proj-1", "key"), rx)
        .await
        .unwrap();

    assert_eq!(engine.resolve("Home"), "Accueil");
    assert_eq!(api.fetch_count(), 1);
}
