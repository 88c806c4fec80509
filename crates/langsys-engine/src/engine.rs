//! The translation resolution and synchronization engine
//!
//! [`TranslationEngine`] owns the categorized cache, the missing-token
//! queue, and the background tasks that keep both in sync with the remote
//! translation manager. It is constructed explicitly with an injected
//! [`TranslationApi`] and durable store, and stays inert until `setup` is
//! called with a project id and API key.

use langsys_api::TranslationApi;
use langsys_common::{LangsysError, LocaleInfo, MissingTokenRecord, Result, TranslationData};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheEntry, TranslationCache};
use crate::queue::MissingTokenQueue;
use crate::resolver::ParsedToken;
use crate::store::DurableStore;
use crate::sync::{LocaleTracker, DEFAULT_COOLDOWN_SECS};

/// Default interval between missing-token flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(3);

/// Name of the persisted translation record
const TRANSLATIONS_CELL: &str = "translations";

/// Host-supplied engine configuration, provided exactly once via
/// [`TranslationEngine::setup`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The Langsys project created for this application
    pub project_id: String,
    /// API key associated with the configured project
    pub api_key: String,
    /// The locale the application's literal strings are written in
    pub base_locale: String,
    /// Raise engine event verbosity
    pub debug: bool,
}

impl EngineConfig {
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            base_locale: "en".to_string(),
            debug: false,
        }
    }

    /// Set the base locale (default "en")
    pub fn with_base_locale(mut self, base_locale: impl Into<String>) -> Self {
        self.base_locale = base_locale.into();
        self
    }

    /// Enable debug verbosity
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Tuning knobs for the engine's timers; defaults match production behavior
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Interval between missing-token flushes
    pub flush_interval: Duration,
    /// Per-locale refresh cooldown in seconds
    pub cooldown_secs: i64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
        }
    }
}

struct EngineInner {
    api: Arc<dyn TranslationApi>,
    cache: TranslationCache,
    queue: MissingTokenQueue,
    tracker: LocaleTracker,
    config: RwLock<Option<EngineConfig>>,
    active_locale: RwLock<String>,
    // Lazily fetched locale directory, cleared on refresh
    locales: Mutex<Option<Vec<LocaleInfo>>>,
    flush_interval: Duration,
}

/// The engine facade applications hold.
///
/// `resolve` is synchronous and total; everything that talks to the network
/// runs on background tasks or explicit async calls.
pub struct TranslationEngine {
    inner: Arc<EngineInner>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TranslationEngine {
    /// Create an engine with default timer options
    pub fn new(api: Arc<dyn TranslationApi>, store: &DurableStore) -> Self {
        Self::with_options(api, store, EngineOptions::default())
    }

    /// Create an engine with explicit timer options
    pub fn with_options(
        api: Arc<dyn TranslationApi>,
        store: &DurableStore,
        options: EngineOptions,
    ) -> Self {
        let cache = TranslationCache::new(store.cell(TRANSLATIONS_CELL));
        Self {
            inner: Arc::new(EngineInner {
                api,
                cache,
                queue: MissingTokenQueue::new(),
                tracker: LocaleTracker::new(chrono::Duration::seconds(options.cooldown_secs)),
                config: RwLock::new(None),
                active_locale: RwLock::new(String::new()),
                locales: Mutex::new(None),
                flush_interval: options.flush_interval,
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Configure the engine and start its background tasks.
    ///
    /// Subscribes to the host-owned active-locale signal (handling its
    /// current value immediately, then every change) and starts the
    /// missing-token flush timer. Calling `setup` again replaces both tasks
    /// rather than stacking them.
    ///
    /// Returns the outcome of validating the project id and API key against
    /// the server; this is the only operation that surfaces remote errors to
    /// the host directly.
    pub async fn setup(
        &self,
        config: EngineConfig,
        locale_signal: watch::Receiver<String>,
    ) -> Result<()> {
        if config.project_id.trim().is_empty() {
            return Err(LangsysError::config("Missing project id"));
        }
        if config.api_key.trim().is_empty() {
            return Err(LangsysError::config("Missing API key"));
        }

        info!(
            "Setting up translation engine for project {}",
            config.project_id
        );

        {
            *self.inner.active_locale.write() = config.base_locale.clone();
            *self.inner.config.write() = Some(config);
        }

        self.restart_tasks(locale_signal);

        self.inner.api.validate().await
    }

    /// Whether `setup` has completed with a project id and API key
    pub fn is_configured(&self) -> bool {
        self.inner.config.read().is_some()
    }

    /// The locale lookups currently resolve against
    pub fn active_locale(&self) -> String {
        self.inner.active_locale.read().clone()
    }

    /// Read-only reactive view of the translation cache
    pub fn subscribe(&self) -> watch::Receiver<TranslationData> {
        self.inner.cache.subscribe()
    }

    /// Snapshot of the missing-token queue, mainly useful for diagnostics
    pub fn queued_missing_tokens(&self) -> Vec<MissingTokenRecord> {
        self.inner.queue.snapshot()
    }

    /// Resolve a token to its display string.
    ///
    /// Synchronous and total: never blocks, never panics, always yields a
    /// displayable string. Cache misses are queued for the next flush; while
    /// the engine is unconfigured every lookup degrades to returning the
    /// bare token.
    pub fn resolve(&self, full_token: &str) -> String {
        let parsed = ParsedToken::parse(full_token);

        let config = self.inner.config.read();
        let Some(config) = config.as_ref() else {
            return parsed.token;
        };

        if parsed.is_reserved() {
            error!(
                "Token '{}' collides with a reserved structural marker and will not be queued",
                parsed.token
            );
            return parsed.token;
        }

        match self.inner.cache.get(&parsed.category, &parsed.token) {
            CacheEntry::Resolved(translation) => translation,
            CacheEntry::Pending => parsed.token,
            CacheEntry::Absent => {
                let record = MissingTokenRecord::new(
                    config.project_id.clone(),
                    parsed.category.clone(),
                    parsed.token.clone(),
                );
                if self.inner.queue.enqueue(record) {
                    if config.debug {
                        info!("Token missing: '{}'", full_token);
                    } else {
                        debug!("Token missing: '{}'", full_token);
                    }
                }
                parsed.token
            }
        }
    }

    /// React to a locale change, fetching the full translation set unless
    /// the per-locale cooldown suppresses it. Returns true when a refresh
    /// was performed and applied.
    pub async fn on_locale_change(&self, locale: &str, force: bool) -> bool {
        EngineInner::locale_change(&self.inner, locale, force).await
    }

    /// Force a re-fetch of the current locale, bypassing the cooldown, and
    /// drop the cached locale directory
    pub async fn refresh(&self) -> bool {
        let locale = self.active_locale();
        *self.inner.locales.lock() = None;
        self.on_locale_change(&locale, true).await
    }

    /// Run one missing-token flush immediately, outside the timer
    pub async fn flush_once(&self) {
        EngineInner::flush(&self.inner).await;
    }

    /// Display name for a locale code from the server's locale directory,
    /// fetched lazily and cached. `short` selects the language-only name.
    pub async fn language_name(&self, for_locale: &str, short: bool) -> Option<String> {
        if for_locale.is_empty() {
            return None;
        }

        let cached = self.inner.locales.lock().clone();
        let locales = match cached {
            Some(locales) => locales,
            None => {
                let in_locale = {
                    let active = self.inner.active_locale.read().clone();
                    if active.is_empty() {
                        "en".to_string()
                    } else {
                        active
                    }
                };
                match self.inner.api.list_locales_data(&in_locale).await {
                    Ok(locales) => {
                        *self.inner.locales.lock() = Some(locales.clone());
                        locales
                    }
                    Err(e) => {
                        warn!("Failed to fetch locale directory: {}", e);
                        return None;
                    }
                }
            }
        };

        let found = locales.iter().find(|locale| locale.code == for_locale);
        if found.is_none() {
            warn!("No locale directory entry matches '{}'", for_locale);
        }
        found.map(|locale| {
            if short {
                locale.lang_name.clone()
            } else {
                locale.locale_name.clone()
            }
        })
    }

    /// Abort and replace the background tasks
    fn restart_tasks(&self, mut locale_signal: watch::Receiver<String>) {
        let mut tasks = self.tasks.lock();
        for task in tasks.drain(..) {
            task.abort();
        }

        let inner = Arc::clone(&self.inner);
        let flush_interval = inner.flush_interval;
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so the first
            // flush happens one full interval after setup
            ticker.tick().await;
            loop {
                ticker.tick().await;
                EngineInner::flush(&inner).await;
            }
        }));

        let inner = Arc::clone(&self.inner);
        tasks.push(tokio::spawn(async move {
            loop {
                let locale = locale_signal.borrow_and_update().clone();
                EngineInner::locale_change(&inner, &locale, false).await;
                if locale_signal.changed().await.is_err() {
                    debug!("Locale signal closed, stopping listener");
                    break;
                }
            }
        }));
    }
}

impl Drop for TranslationEngine {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

impl EngineInner {
    /// Submit the queued missing tokens, reconciling the outcome into the
    /// cache. At-least-once: the snapshot stays queued on transport failure
    /// and is only dropped when the server rejects it as invalid.
    async fn flush(inner: &Arc<EngineInner>) {
        if inner.config.read().is_none() {
            return;
        }

        let snapshot = inner.queue.snapshot();
        if snapshot.is_empty() {
            return;
        }

        debug!("Flushing {} missing tokens", snapshot.len());
        match inner.api.submit_missing(&snapshot).await {
            Ok(()) => {
                for record in &snapshot {
                    inner.cache.mark_pending(&record.category, &record.token);
                }
                inner.queue.remove(&snapshot);
                debug!("Flushed {} missing tokens", snapshot.len());
            }
            Err(e @ LangsysError::Validation { .. }) => {
                // A poison batch would starve every later flush; drop it
                error!("Server rejected missing-token batch, dropping it: {}", e);
                inner.queue.remove(&snapshot);
            }
            Err(e) => {
                warn!(
                    "Failed to submit {} missing tokens, retrying next tick: {}",
                    snapshot.len(),
                    e
                );
            }
        }
    }

    /// The only path that performs a full cache replace
    async fn locale_change(inner: &Arc<EngineInner>, locale: &str, force: bool) -> bool {
        if locale.is_empty() {
            return false;
        }
        if inner.config.read().is_none() {
            debug!("Ignoring locale change while unconfigured");
            return false;
        }
        if !inner.tracker.should_refresh(locale, force) {
            debug!("Locale '{}' fetched recently, skipping refresh", locale);
            return false;
        }

        info!("Locale change detected: {}", locale);
        *inner.active_locale.write() = locale.to_string();

        match inner.api.fetch_translations(locale).await {
            Ok(payload) => {
                inner.cache.replace(payload);
                inner.tracker.record_success(locale);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to fetch translations for '{}', keeping previous cache: {}",
                    locale, e
                );
                false
            }
        }
    }
}
