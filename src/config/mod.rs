//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → loader.rs (parse, resolve schema revision, decode with defaults)
//!     → Config (typed, immutable)
//!     → validation.rs (required fields per enabled backend)
//!     → list of invalid field paths, empty when deployable
//!
//! sample.rs renders the canonical template for new deployments.
//! ```
//!
//! # Design Decisions
//! - Config is immutable once decoded; a reload builds a new value
//! - Missing fields never fail decoding, only the validator reports them
//! - Schema revision is explicit (`schema_version`) or inferred, never mixed

pub mod loader;
pub mod sample;
pub mod schema;
pub mod validation;

pub use loader::{decode_config, load_config, read_config, ConfigError, DocumentFormat};
pub use sample::{generate_secret, get_sample_config, SampleConfig};
pub use schema::{
    BasicAuthSettings, BasicUser, Config, LdapSettings, Loose, PagesSettings, Passthrough,
    SchemaRevision, SessionSettings, DEFAULT_CONFIG_FILE, DEFAULT_GROUP_CACHE_MAX_AGE_SECS,
    DEFAULT_SECRET_LENGTH, DEFAULT_SESSION_MAX_AGE_SECS,
};
pub use validation::validate_config;
