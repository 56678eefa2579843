//! Configuration validation.
//!
//! # Responsibilities
//! - Report every required field that is missing for the enabled backends
//! - Check the shape of basic-auth user entries
//!
//! # Design Decisions
//! - Returns all findings, not just the first, as dotted paths (`ldap.host`)
//! - Fixed order: basic → ldap → session → pages
//! - Exemption lists are not checked; malformed ones are only recorded in
//!   `Config::ignored_fields`
//! - Never fails; whether findings are fatal is the caller's decision

use crate::config::schema::{Config, Loose};

impl Config {
    /// Dotted paths of every invalid field. Empty means deployable.
    pub fn check_consistency(&self) -> Vec<String> {
        validate_config(self)
    }
}

/// Validate a decoded configuration.
pub fn validate_config(config: &Config) -> Vec<String> {
    let mut invalid = Vec::new();

    check_basic(config, &mut invalid);
    check_ldap(config, &mut invalid);

    let session = &config.session;
    require(&mut invalid, "session.cookie_session", &session.cookie_session);
    require(&mut invalid, "session.cookie_redirect", &session.cookie_redirect);
    require(&mut invalid, "session.cookie_domain", &session.cookie_domain);
    require(&mut invalid, "session.cookie_secret", &session.cookie_secret);

    let pages = &config.pages;
    require(&mut invalid, "pages.login_template", &pages.login_template);
    require(&mut invalid, "pages.noauth_template", &pages.noauth_template);
    require(&mut invalid, "pages.static_root", &pages.static_root);
    require(&mut invalid, "pages.fallback_redirect", &pages.fallback_redirect);

    tracing::debug!(findings = invalid.len(), "Configuration consistency checked");
    invalid
}

fn check_basic(config: &Config, invalid: &mut Vec<String>) {
    if !config.basic.enabled {
        return;
    }
    let section = config.revision.basic_section();

    let users = match config.basic.users.as_ref() {
        Some(Loose::Typed(users)) if !users.is_empty() => users,
        _ => {
            invalid.push(format!("{section}.users"));
            return;
        }
    };

    for (name, entry) in users {
        let (password_ok, groups_ok) = match entry {
            Loose::Typed(user) => (user.password().is_some(), user.groups().is_some()),
            Loose::Malformed(_) => (false, false),
        };
        if !password_ok {
            invalid.push(format!("{section}.users.{name}.password"));
        }
        if !groups_ok {
            invalid.push(format!("{section}.users.{name}.groups"));
        }
    }
}

fn check_ldap(config: &Config, invalid: &mut Vec<String>) {
    let ldap = &config.ldap;
    if !ldap.enabled {
        return;
    }
    require(invalid, "ldap.host", &ldap.host);
    require(invalid, "ldap.port", &ldap.port);
    require(invalid, "ldap.username", &ldap.username);
    require(invalid, "ldap.password", &ldap.password);
    require(invalid, "ldap.user_attr", &ldap.user_attr);
    // user_base_dn is optional
    require(invalid, "ldap.group_base_dn", &ldap.group_base_dn);
    require(invalid, "ldap.group_cache_max_age", &ldap.group_cache_max_age);
}

fn require<T>(invalid: &mut Vec<String>, path: &str, value: &Option<T>) {
    if value.is_none() {
        invalid.push(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION_AND_PAGES: &str = r#"
        "session": {
            "cookie_session": "SSO",
            "cookie_redirect": "REDIRECT",
            "cookie_domain": ".example.com",
            "cookie_secret": "s3cr3t"
        },
        "pages": {
            "login_template": "login.html.j2",
            "noauth_template": "noauth.html.j2",
            "static_root": "./static",
            "fallback_redirect": "https://example.com"
        }
    "#;

    fn with_common(sections: &str) -> Config {
        let doc = if sections.is_empty() {
            format!("{{{SESSION_AND_PAGES}}}")
        } else {
            format!("{{{sections}, {SESSION_AND_PAGES}}}")
        };
        Config::from_json_str(&doc).unwrap()
    }

    #[test]
    fn test_minimal_valid() {
        assert!(with_common("").check_consistency().is_empty());
    }

    #[test]
    fn test_empty_document_requires_session_and_pages() {
        let invalid = Config::default().check_consistency();
        assert_eq!(
            invalid,
            vec![
                "session.cookie_session",
                "session.cookie_redirect",
                "session.cookie_domain",
                "session.cookie_secret",
                "pages.login_template",
                "pages.noauth_template",
                "pages.static_root",
                "pages.fallback_redirect",
            ]
        );
    }

    #[test]
    fn test_basic_users_missing_or_empty() {
        let config = with_common(r#""basic": {"enabled": true}"#);
        assert_eq!(config.check_consistency(), vec!["basic.users"]);

        let config = with_common(r#""basic": {"enabled": true, "users": {}}"#);
        assert_eq!(config.check_consistency(), vec!["basic.users"]);

        let config = with_common(r#""basic": {"enabled": true, "users": ["alice"]}"#);
        assert_eq!(config.check_consistency(), vec!["basic.users"]);
    }

    #[test]
    fn test_basic_user_fields() {
        let config = with_common(
            r#""basic_authentication": {"enabled": true, "users": {
                "carol": {"password": "hash", "groups": ["ops"]},
                "bob": {"password": 12, "groups": ["ops", 3]},
                "alice": "hash"
            }}"#,
        );
        assert_eq!(
            config.check_consistency(),
            vec![
                "basic_authentication.users.alice.password",
                "basic_authentication.users.alice.groups",
                "basic_authentication.users.bob.password",
                "basic_authentication.users.bob.groups",
            ]
        );
    }

    #[test]
    fn test_ldap_user_base_dn_optional() {
        let config = with_common(
            r#""ldap": {
                "enabled": true,
                "host": "ldap.example.com",
                "port": 389,
                "username": "admin",
                "password": "password",
                "user_attr": "mail",
                "group_base_dn": "ou=groups,dc=example,dc=com",
                "group_cache_max_age": 0
            }"#,
        );
        assert!(config.check_consistency().is_empty());
    }

    #[test]
    fn test_ldap_wrong_port_type_reported() {
        let config = with_common(
            r#""ldap": {
                "enabled": true,
                "host": "ldap.example.com",
                "port": 70000,
                "username": "admin",
                "password": "password",
                "user_attr": "mail",
                "group_base_dn": "ou=groups,dc=example,dc=com",
                "group_cache_max_age": 300
            }"#,
        );
        assert_eq!(config.check_consistency(), vec!["ldap.port"]);
        assert!(config.is_ignored("ldap.port"));
    }

    #[test]
    fn test_malformed_exemption_lists_still_deployable() {
        let config = with_common(r#""passthrough": {"ignored_ingress": "gw.example.com"}"#);
        assert!(config.check_consistency().is_empty());
        assert!(config.is_ignored("passthrough.ignored_ingress"));

        let config = with_common(r#""ingress": {"ignored_addresses": [1, 2]}"#);
        assert!(config.check_consistency().is_empty());
        assert!(config.passthrough.exempt_entries().is_empty());
    }

    #[test]
    fn test_null_enabled_skips_backend_checks() {
        let config = with_common(r#""ldap": {"enabled": null}, "basic": {"enabled": 1}"#);
        assert!(config.check_consistency().is_empty());
    }
}
