//! Sample configuration for operator bootstrapping.
//!
//! The template is written in the current schema revision. The session
//! secret is supplied by the caller, or generated from an injected RNG, so
//! rendering is deterministic whenever the caller wants it to be.

use std::collections::BTreeMap;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::config::schema::{
    BasicUser, Loose, RawBasic, RawDocument, RawIngress, RawLdap, RawPages, RawSession,
    SchemaRevision, DEFAULT_GROUP_CACHE_MAX_AGE_SECS, DEFAULT_SECRET_LENGTH,
    DEFAULT_SESSION_MAX_AGE_SECS,
};

/// Pre-hashed password of the sample user (`welcome`).
const SAMPLE_PASSWORD_HASH: &str =
    "/HDrxmQBj6Xl7/gl6UwrcZKq7fjjH1knVUAxwX0v/Yvb3zHET3+lfZ+tpAN/nYGp";

/// Generate a random secret of ASCII letters and digits.
pub fn generate_secret<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// Render the sample config with a freshly generated secret.
pub fn get_sample_config(indent: usize) -> Result<String, serde_json::Error> {
    SampleConfig::generate(&mut rand::thread_rng()).render(indent)
}

/// Canonical configuration template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleConfig {
    cookie_secret: String,
}

impl SampleConfig {
    pub fn with_secret(cookie_secret: impl Into<String>) -> Self {
        Self {
            cookie_secret: cookie_secret.into(),
        }
    }

    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_secret(generate_secret(rng, DEFAULT_SECRET_LENGTH))
    }

    pub fn cookie_secret(&self) -> &str {
        &self.cookie_secret
    }

    /// Render as JSON, `indent` spaces per nesting level.
    pub fn render(&self, indent: usize) -> Result<String, serde_json::Error> {
        let indent = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.template().serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn template(&self) -> RawDocument {
        let mut users = BTreeMap::new();
        users.insert(
            "sample_user".to_string(),
            Loose::Typed(BasicUser {
                password: set(SAMPLE_PASSWORD_HASH),
                groups: set(vec!["TestGroup".to_string()]),
            }),
        );

        RawDocument {
            schema_version: Some(SchemaRevision::Current),
            basic: None,
            basic_authentication: Some(RawBasic {
                enabled: set(false),
                users: set(users),
            }),
            ldap: RawLdap {
                enabled: set(true),
                host: set("ldap.example.com"),
                port: set(389u16),
                username: set("admin"),
                password: set("password"),
                user_attr: set("mail"),
                user_base_dn: set("ou=users,dc=example,dc=com"),
                group_base_dn: set("ou=groups,dc=example,dc=com"),
                group_cache_max_age: Some(Value::from(DEFAULT_GROUP_CACHE_MAX_AGE_SECS)),
            },
            session: RawSession {
                cookie_session: set("EXAMPLE_COM_SSO"),
                cookie_redirect: set("EXAMPLE_COM_REDIRECT"),
                cookie_domain: set(".example.com"),
                cookie_secret: set(self.cookie_secret.as_str()),
                cookie_max_age: Some(Value::from(DEFAULT_SESSION_MAX_AGE_SECS)),
            },
            pages: RawPages {
                login_template: set("./pages/templates/login.html.j2"),
                noauth_template: set("./pages/templates/noauth.html.j2"),
                static_root: set("./pages/static"),
                fallback_redirect: set("https://internal.example.com"),
            },
            passthrough: None,
            ingress: Some(RawIngress {
                ignored_addresses: Some(Loose::Typed(Vec::new())),
            }),
        }
    }
}

fn set<T, V: Into<T>>(value: V) -> Option<Loose<T>> {
    Some(Loose::Typed(value.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_secret() {
        let mut rng = StdRng::seed_from_u64(7);
        let secret = generate_secret(&mut rng, DEFAULT_SECRET_LENGTH);
        assert_eq!(secret.len(), DEFAULT_SECRET_LENGTH);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));

        let mut again = StdRng::seed_from_u64(7);
        assert_eq!(generate_secret(&mut again, DEFAULT_SECRET_LENGTH), secret);
        assert!(generate_secret(&mut rng, 0).is_empty());
    }

    #[test]
    fn test_render_is_deterministic_with_fixed_secret() {
        let sample = SampleConfig::with_secret("fixed");
        assert_eq!(sample.render(4).unwrap(), sample.render(4).unwrap());
        assert!(sample.render(2).unwrap().contains("\"cookie_secret\": \"fixed\""));
    }

    #[test]
    fn test_render_indent() {
        let sample = SampleConfig::with_secret("fixed");
        let two = sample.render(2).unwrap();
        assert!(two.starts_with("{\n  \"schema_version\": \"current\""));
        assert!(two.contains("\n    \"enabled\": false"));

        let zero = sample.render(0).unwrap();
        assert!(zero.starts_with("{\n\"schema_version\""));
    }

    #[test]
    fn test_render_key_order() {
        let text = SampleConfig::with_secret("fixed").render(2).unwrap();
        let positions: Vec<usize> = [
            "\"basic_authentication\"",
            "\"ldap\"",
            "\"session\"",
            "\"pages\"",
            "\"ingress\"",
        ]
        .iter()
        .map(|key| text.find(key).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
