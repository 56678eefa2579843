//! Authentication gateway configuration.
//!
//! Decodes the gateway's configuration document into a typed [`Config`],
//! reports invalid fields for the enabled auth backends, and renders a
//! sample document for new deployments.

pub mod config;
pub mod observability;

pub use config::{Config, ConfigError, SampleConfig, SchemaRevision};
