//! Per-locale fetch cooldown tracking

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Default cooldown between full fetches of the same locale
pub const DEFAULT_COOLDOWN_SECS: i64 = 60;

/// Records when each locale was last successfully fetched and gates
/// refreshes behind a cooldown window, bounding remote load under rapid
/// locale toggling.
#[derive(Debug)]
pub struct LocaleTracker {
    last_loaded: Mutex<HashMap<String, DateTime<Utc>>>,
    cooldown: Duration,
}

impl Default for LocaleTracker {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS))
    }
}

impl LocaleTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_loaded: Mutex::new(HashMap::new()),
            cooldown,
        }
    }

    /// Whether a fetch for this locale is due. `force` bypasses the window.
    pub fn should_refresh(&self, locale: &str, force: bool) -> bool {
        if force {
            return true;
        }
        let last_loaded = self.last_loaded.lock();
        match last_loaded.get(locale) {
            Some(at) => Utc::now().signed_duration_since(*at) >= self.cooldown,
            None => true,
        }
    }

    /// Record a successful fetch for the locale at the current time
    pub fn record_success(&self, locale: &str) {
        self.last_loaded.lock().insert(locale.to_string(), Utc::now());
    }

    /// When the locale was last successfully fetched, if ever
    pub fn last_loaded(&self, locale: &str) -> Option<DateTime<Utc>> {
        self.last_loaded.lock().get(locale).copied()
    }
}
