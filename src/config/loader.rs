//! Configuration decoding and loading from disk.
//!
//! Decoding is a pure transform from text to [`Config`]. It only fails when
//! the text is not a well-formed document or a max-age field cannot be read
//! as an integer; every missing field is left for the validator.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::schema::{
    AddressList, BasicAuthSettings, Config, LdapSettings, Loose, PagesSettings, Passthrough,
    RawDocument, SchemaRevision, SessionSettings,
};
use crate::config::validation::validate_config;

/// Error type for configuration decoding and loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text is not a well-formed configuration document.
    #[error("malformed configuration document: {0}")]
    MalformedDocument(String),

    /// A numeric field holds a value that is not a non-negative integer.
    #[error("cannot interpret {field} = {value} as a non-negative integer")]
    TypeCoercion { field: &'static str, value: String },

    /// The document decoded but failed the consistency check.
    #[error("invalid configuration fields: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

/// Serialization format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    Toml,
}

impl DocumentFormat {
    /// `.toml` files are TOML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

impl Config {
    /// Decode a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        decode_config(text, DocumentFormat::Json)
    }

    /// Decode a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        decode_config(text, DocumentFormat::Toml)
    }

    /// Run the consistency check and refuse configs with findings.
    pub fn into_validated(self) -> Result<Self, ConfigError> {
        let invalid = validate_config(&self);
        if invalid.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(invalid))
        }
    }
}

/// Decode a document of the given format into a [`Config`].
pub fn decode_config(text: &str, format: DocumentFormat) -> Result<Config, ConfigError> {
    let value: Value = match format {
        DocumentFormat::Json => serde_json::from_str(text)
            .map_err(|e| ConfigError::MalformedDocument(e.to_string()))?,
        DocumentFormat::Toml => {
            toml::from_str(text).map_err(|e| ConfigError::MalformedDocument(e.to_string()))?
        }
    };
    decode_value(value)
}

/// Decode an already parsed document tree.
pub fn decode_value(value: Value) -> Result<Config, ConfigError> {
    let Value::Object(map) = value else {
        return Err(ConfigError::MalformedDocument(
            "top-level value must be a mapping".into(),
        ));
    };
    let revision = resolve_revision(&map)?;
    let raw: RawDocument = serde_json::from_value(Value::Object(map))
        .map_err(|e| ConfigError::MalformedDocument(e.to_string()))?;

    let mut fields = FieldResolver::default();

    let basic = match revision {
        SchemaRevision::Legacy => raw.basic,
        SchemaRevision::Current => raw.basic_authentication,
    }
    .unwrap_or_default();
    let basic = BasicAuthSettings {
        enabled: fields.flag(&format!("{}.enabled", revision.basic_section()), basic.enabled),
        users: basic.users,
    };

    let ldap = LdapSettings {
        enabled: fields.flag("ldap.enabled", raw.ldap.enabled),
        host: fields.scalar("ldap.host", raw.ldap.host),
        port: fields.scalar("ldap.port", raw.ldap.port),
        username: fields.scalar("ldap.username", raw.ldap.username),
        password: fields.scalar("ldap.password", raw.ldap.password),
        user_attr: fields.scalar("ldap.user_attr", raw.ldap.user_attr),
        user_base_dn: fields.scalar("ldap.user_base_dn", raw.ldap.user_base_dn),
        group_base_dn: fields.scalar("ldap.group_base_dn", raw.ldap.group_base_dn),
        group_cache_max_age: coerce_seconds(
            "ldap.group_cache_max_age",
            raw.ldap.group_cache_max_age,
        )?,
    };

    let session = SessionSettings {
        cookie_session: fields.scalar("session.cookie_session", raw.session.cookie_session),
        cookie_redirect: fields.scalar("session.cookie_redirect", raw.session.cookie_redirect),
        cookie_domain: fields.scalar("session.cookie_domain", raw.session.cookie_domain),
        cookie_secret: fields.scalar("session.cookie_secret", raw.session.cookie_secret),
        cookie_max_age: coerce_seconds("session.cookie_max_age", raw.session.cookie_max_age)?
            .unwrap_or(0),
    };

    let pages = PagesSettings {
        login_template: fields.scalar("pages.login_template", raw.pages.login_template),
        noauth_template: fields.scalar("pages.noauth_template", raw.pages.noauth_template),
        static_root: fields.scalar("pages.static_root", raw.pages.static_root),
        fallback_redirect: fields.scalar("pages.fallback_redirect", raw.pages.fallback_redirect),
    };

    let passthrough = match revision {
        SchemaRevision::Legacy => {
            let section = raw.passthrough.unwrap_or_default();
            Passthrough::Legacy {
                ignored_ingress: fields.list("passthrough.ignored_ingress", section.ignored_ingress),
                ignored_remote: fields.list("passthrough.ignored_remote", section.ignored_remote),
            }
        }
        SchemaRevision::Current => Passthrough::Current {
            ignored_addresses: fields.list(
                "ingress.ignored_addresses",
                raw.ingress.unwrap_or_default().ignored_addresses,
            ),
        },
    };

    tracing::debug!(
        %revision,
        basic_enabled = basic.enabled,
        ldap_enabled = ldap.enabled,
        "Configuration decoded"
    );

    Ok(Config {
        revision,
        basic,
        ldap,
        session,
        pages,
        passthrough,
        ignored_fields: fields.ignored,
    })
}

/// Read and decode a configuration file without validating it.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_config(&content, DocumentFormat::from_path(path))
}

/// Load, decode and validate configuration from a file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?.into_validated()?;
    tracing::info!(path = %path.display(), revision = %config.revision, "Configuration loaded");
    Ok(config)
}

/// Pick the schema revision: an explicit `schema_version` wins, otherwise
/// infer it from revision-specific section keys. Documents mixing both
/// revisions are rejected.
fn resolve_revision(map: &serde_json::Map<String, Value>) -> Result<SchemaRevision, ConfigError> {
    let has_any = |revision: SchemaRevision| {
        revision
            .exclusive_keys()
            .into_iter()
            .find(|key| map.contains_key(*key))
    };

    if let Some(declared) = map.get("schema_version") {
        let declared: SchemaRevision = serde_json::from_value(declared.clone()).map_err(|_| {
            ConfigError::MalformedDocument(format!(
                "schema_version must be \"legacy\" or \"current\", got {declared}"
            ))
        })?;
        if let Some(key) = has_any(declared.other()) {
            return Err(ConfigError::MalformedDocument(format!(
                "section `{key}` belongs to the {} schema but schema_version is {declared}",
                declared.other()
            )));
        }
        return Ok(declared);
    }

    match (has_any(SchemaRevision::Legacy), has_any(SchemaRevision::Current)) {
        (Some(legacy), Some(current)) => Err(ConfigError::MalformedDocument(format!(
            "document mixes legacy section `{legacy}` with current section `{current}`"
        ))),
        (Some(_), None) => {
            tracing::warn!("schema_version not set, reading document as legacy revision");
            Ok(SchemaRevision::Legacy)
        }
        _ => Ok(SchemaRevision::Current),
    }
}

/// Resolves loosely typed leaves, remembering which ones had to be dropped.
#[derive(Default)]
struct FieldResolver {
    ignored: Vec<String>,
}

impl FieldResolver {
    fn ignore(&mut self, field: &str, value: &Value) {
        tracing::warn!(field, %value, "Ignoring configuration value of unexpected type");
        self.ignored.push(field.to_string());
    }

    /// Wrong types resolve to absent.
    fn scalar<T>(&mut self, field: &str, value: Option<Loose<T>>) -> Option<T> {
        match value? {
            Loose::Typed(value) => Some(value),
            Loose::Malformed(value) => {
                self.ignore(field, &value);
                None
            }
        }
    }

    /// Absent, `null` and non-boolean flags are off.
    fn flag(&mut self, field: &str, value: Option<Loose<bool>>) -> bool {
        self.scalar(field, value).unwrap_or(false)
    }

    /// Malformed lists are kept as written and contribute no entries.
    fn list(&mut self, field: &str, value: Option<AddressList>) -> AddressList {
        match value {
            None => Loose::Typed(Vec::new()),
            Some(Loose::Malformed(value)) => {
                self.ignore(field, &value);
                Loose::Malformed(value)
            }
            Some(list) => list,
        }
    }
}

/// Read a number of seconds. Accepts non-negative integers, finite
/// non-negative floats (truncated) and strings holding an integer.
fn coerce_seconds(field: &'static str, value: Option<Value>) -> Result<Option<u64>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let coerced = match &value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && *f < u64::MAX as f64)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    coerced.map(Some).ok_or_else(|| ConfigError::TypeCoercion {
        field,
        value: value.to_string(),
    })
}
