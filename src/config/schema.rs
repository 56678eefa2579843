//! Configuration schema definitions.
//!
//! Two layers live here:
//! - the *document* shape (`RawDocument` and friends), deserialized leniently
//!   so that missing or wrongly typed leaves never abort decoding;
//! - the resolved [`Config`] handed to the auth, session and page subsystems.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Length of a generated session-cookie secret.
pub const DEFAULT_SECRET_LENGTH: usize = 32;

/// Session lifetime used by the sample config (one day).
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 86_400;

/// TTL for cached LDAP group lookups used by the sample config (five minutes).
pub const DEFAULT_GROUP_CACHE_MAX_AGE_SECS: u64 = 300;

/// Schema revision a document was written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaRevision {
    /// `basic` and `passthrough { ignored_ingress, ignored_remote }`.
    Legacy,
    /// `basic_authentication` and `ingress { ignored_addresses }`.
    #[default]
    Current,
}

impl SchemaRevision {
    /// Top-level key of the basic-auth section in this revision.
    pub fn basic_section(self) -> &'static str {
        match self {
            SchemaRevision::Legacy => "basic",
            SchemaRevision::Current => "basic_authentication",
        }
    }

    /// Top-level key of the passthrough section in this revision.
    pub fn passthrough_section(self) -> &'static str {
        match self {
            SchemaRevision::Legacy => "passthrough",
            SchemaRevision::Current => "ingress",
        }
    }

    /// Top-level keys that only exist in this revision.
    pub(crate) fn exclusive_keys(self) -> [&'static str; 2] {
        [self.basic_section(), self.passthrough_section()]
    }

    pub(crate) fn other(self) -> Self {
        match self {
            SchemaRevision::Legacy => SchemaRevision::Current,
            SchemaRevision::Current => SchemaRevision::Legacy,
        }
    }
}

impl std::fmt::Display for SchemaRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaRevision::Legacy => f.write_str("legacy"),
            SchemaRevision::Current => f.write_str("current"),
        }
    }
}

/// A leaf whose type is only checked by the validator.
///
/// Deserialization never fails: a value of the wrong shape is kept verbatim
/// as `Malformed`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Loose<T> {
    Typed(T),
    Malformed(Value),
}

impl<T> Loose<T> {
    pub fn typed(&self) -> Option<&T> {
        match self {
            Loose::Typed(value) => Some(value),
            Loose::Malformed(_) => None,
        }
    }

    pub fn is_typed(&self) -> bool {
        matches!(self, Loose::Typed(_))
    }
}

/// One entry of the basic-auth user table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BasicUser {
    /// Pre-hashed password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Loose<String>>,

    /// Group memberships.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Loose<Vec<String>>>,
}

impl BasicUser {
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref()?.typed().map(String::as_str)
    }

    pub fn groups(&self) -> Option<&[String]> {
        self.groups.as_ref()?.typed().map(Vec::as_slice)
    }
}

/// Username → user record, as written in the document.
pub type UserTable = BTreeMap<String, Loose<BasicUser>>;

/// Exemption list as written in the document.
pub type AddressList = Loose<Vec<String>>;

// ---------------------------------------------------------------------------
// Document shape
// ---------------------------------------------------------------------------
//
// Deserialized from user documents and serialized for the sample config.

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub(crate) struct RawDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<SchemaRevision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic: Option<RawBasic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_authentication: Option<RawBasic>,
    pub ldap: RawLdap,
    pub session: RawSession,
    pub pages: RawPages,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passthrough: Option<RawPassthrough>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress: Option<RawIngress>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub(crate) struct RawBasic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Loose<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Loose<UserTable>>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub(crate) struct RawLdap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Loose<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<Loose<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_attr: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_base_dn: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_base_dn: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_cache_max_age: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub(crate) struct RawSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_session: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_redirect: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_domain: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_secret: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_max_age: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub(crate) struct RawPages {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_template: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noauth_template: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_root: Option<Loose<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_redirect: Option<Loose<String>>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub(crate) struct RawPassthrough {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_ingress: Option<AddressList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_remote: Option<AddressList>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub(crate) struct RawIngress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_addresses: Option<AddressList>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Resolved gateway configuration.
///
/// Built once per load by [`Config::from_json_str`] and friends, then shared
/// read-only. Missing keys are `None` here; whether that is acceptable is
/// decided by [`Config::check_consistency`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    /// Revision the document was written against.
    pub revision: SchemaRevision,

    pub basic: BasicAuthSettings,

    pub ldap: LdapSettings,

    pub session: SessionSettings,

    pub pages: PagesSettings,

    /// Addresses and hosts exempt from auth enforcement.
    pub passthrough: Passthrough,

    /// Paths whose values were present but of an unexpected type. Scalars
    /// listed here resolve to `None`; malformed exemption lists contribute
    /// no entries.
    pub ignored_fields: Vec<String>,
}

impl Config {
    /// Whether `path` was present in the document with an unexpected type.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored_fields.iter().any(|field| field == path)
    }
}

/// Static user table authentication.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicAuthSettings {
    pub enabled: bool,

    /// `None` when the key is absent.
    pub users: Option<Loose<UserTable>>,
}

impl BasicAuthSettings {
    /// The user table, if it is a mapping.
    pub fn user_table(&self) -> Option<&UserTable> {
        self.users.as_ref()?.typed()
    }
}

/// LDAP connection and query parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LdapSettings {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,

    /// Attribute used as the user's identity (e.g. `mail`).
    pub user_attr: Option<String>,
    pub user_base_dn: Option<String>,
    pub group_base_dn: Option<String>,

    /// Seconds to cache a user's group memberships. `None` when absent from
    /// the document.
    pub group_cache_max_age: Option<u64>,
}

impl LdapSettings {
    /// Group cache TTL in seconds, `0` when not configured.
    pub fn group_cache_max_age_secs(&self) -> u64 {
        self.group_cache_max_age.unwrap_or(0)
    }
}

/// Session cookie parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSettings {
    pub cookie_session: Option<String>,
    pub cookie_redirect: Option<String>,
    pub cookie_domain: Option<String>,
    pub cookie_secret: Option<String>,

    /// Session lifetime in seconds.
    pub cookie_max_age: u64,
}

/// Templates and static assets for the login and no-auth pages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PagesSettings {
    pub login_template: Option<String>,
    pub noauth_template: Option<String>,
    pub static_root: Option<String>,
    pub fallback_redirect: Option<String>,
}

/// Auth exemptions; the shape follows the schema revision.
#[derive(Debug, Clone, PartialEq)]
pub enum Passthrough {
    Legacy {
        ignored_ingress: AddressList,
        ignored_remote: AddressList,
    },
    Current {
        ignored_addresses: AddressList,
    },
}

impl Default for Passthrough {
    fn default() -> Self {
        Passthrough::Current {
            ignored_addresses: Loose::Typed(Vec::new()),
        }
    }
}

impl Passthrough {
    /// Every well-formed exemption entry, in document order.
    pub fn exempt_entries(&self) -> Vec<&str> {
        let lists: Vec<&AddressList> = match self {
            Passthrough::Legacy {
                ignored_ingress,
                ignored_remote,
            } => vec![ignored_ingress, ignored_remote],
            Passthrough::Current { ignored_addresses } => vec![ignored_addresses],
        };
        lists
            .into_iter()
            .filter_map(Loose::typed)
            .flatten()
            .map(String::as_str)
            .collect()
    }
}
