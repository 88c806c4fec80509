//! Translation resolution and synchronization engine for the Langsys client
//!
//! The engine serves token lookups synchronously from a categorized,
//! persisted cache, reports tokens it cannot resolve to the Langsys
//! translation manager in deduplicated batches, and refetches the full
//! translation set when the host application's active locale changes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use langsys_api::LangsysClient;
//! use langsys_engine::{DurableStore, EngineConfig, TranslationEngine};
//! use tokio::sync::watch;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = Arc::new(LangsysClient::with_defaults("my-project", "my-key")?);
//! let store = DurableStore::open("langsys-cache")?;
//! let engine = TranslationEngine::new(client, &store);
//!
//! let (locale_tx, locale_rx) = watch::channel("en".to_string());
//! engine
//!     .setup(EngineConfig::new("my-project", "my-key"), locale_rx)
//!     .await?;
//!
//! // Synchronous, safe to call from rendering code
//! let title = engine.resolve("{[UI]} Welcome back");
//!
//! // Switching the locale triggers a full refetch (cooldown permitting)
//! locale_tx.send("fr".to_string())?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod engine;
pub mod queue;
pub mod resolver;
pub mod store;
pub mod sync;

pub use cache::{CacheEntry, TranslationCache};
pub use engine::{
    EngineConfig, EngineOptions, TranslationEngine, DEFAULT_FLUSH_INTERVAL,
};
pub use queue::MissingTokenQueue;
pub use resolver::ParsedToken;
pub use store::{DurableCell, DurableStore};
pub use sync::{LocaleTracker, DEFAULT_COOLDOWN_SECS};

// Re-export the pieces hosts commonly need alongside the engine
pub use langsys_api::{ApiConfig, LangsysClient, TranslationApi};
pub use langsys_common::{LangsysError, MissingTokenRecord, Result, TranslationData};
