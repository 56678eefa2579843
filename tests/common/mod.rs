//! Shared utilities for integration tests.

use std::path::PathBuf;

/// Session and pages sections that satisfy the unconditional checks.
pub const SESSION_AND_PAGES: &str = r#"
    "session": {
        "cookie_session": "EXAMPLE_COM_SSO",
        "cookie_redirect": "EXAMPLE_COM_REDIRECT",
        "cookie_domain": ".example.com",
        "cookie_secret": "0123456789abcdef0123456789abcdef",
        "cookie_max_age": 86400
    },
    "pages": {
        "login_template": "./pages/templates/login.html.j2",
        "noauth_template": "./pages/templates/noauth.html.j2",
        "static_root": "./pages/static",
        "fallback_redirect": "https://internal.example.com"
    }
"#;

/// Build a JSON document from extra top-level sections plus valid session and pages.
pub fn document_with(sections: &str) -> String {
    if sections.trim().is_empty() {
        format!("{{{SESSION_AND_PAGES}}}")
    } else {
        format!("{{{sections}, {SESSION_AND_PAGES}}}")
    }
}

/// Write `contents` to a uniquely named file under the temp directory.
pub fn write_temp_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("auth-gateway-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}
