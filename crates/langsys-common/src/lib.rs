//! Common utilities and types for the Langsys client

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{LangsysError, Result};
pub use logging::{init_default_logging, init_dev_logging, init_logging, LoggingConfig};
pub use types::{
    is_reserved_token, CategoryMap, LocaleDirectory, LocaleInfo, LocaleName, MissingTokenRecord,
    TranslationData, CATEGORY_KEY, RESERVED_TOKENS, UNCATEGORIZED,
};
