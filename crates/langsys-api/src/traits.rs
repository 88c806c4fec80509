//! The engine-facing API surface
//!
//! The synchronization engine talks to the translation manager through this
//! trait rather than the concrete client, so tests can inject doubles.

use async_trait::async_trait;
use langsys_common::{LocaleInfo, MissingTokenRecord, Result, TranslationData};

use crate::client::LangsysClient;

/// Remote translation authority operations consumed by the engine.
///
/// All operations are idempotent from the caller's perspective: retrying the
/// same call with the same input is always safe.
#[async_trait]
pub trait TranslationApi: Send + Sync {
    /// Confirm the configured project id and API key are authorized
    async fn validate(&self) -> Result<()>;

    /// Retrieve the complete translation set for a locale
    async fn fetch_translations(&self, locale: &str) -> Result<TranslationData>;

    /// Report a batch of unresolved tokens
    async fn submit_missing(&self, records: &[MissingTokenRecord]) -> Result<()>;

    /// Fetch the locale directory with full and language-only names
    async fn list_locales_data(&self, in_locale: &str) -> Result<Vec<LocaleInfo>>;
}

#[async_trait]
impl TranslationApi for LangsysClient {
    async fn validate(&self) -> Result<()> {
        LangsysClient::validate(self).await
    }

    async fn fetch_translations(&self, locale: &str) -> Result<TranslationData> {
        LangsysClient::fetch_translations(self, locale).await
    }

    async fn submit_missing(&self, records: &[MissingTokenRecord]) -> Result<()> {
        LangsysClient::submit_missing(self, records).await
    }

    async fn list_locales_data(&self, in_locale: &str) -> Result<Vec<LocaleInfo>> {
        LangsysClient::list_locales_data(self, in_locale).await
    }
}
