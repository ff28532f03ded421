use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn empty_environment_uses_defaults() {
    let config = SiteConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(config, SiteConfig::default());
    assert_eq!(config.port, 3000);
    assert_eq!(config.shared_cookie_domain, "ekgf.org");
    assert_eq!(config.delivery_timeout, Duration::from_secs(10));
    assert!(config.resend_api_key.is_none());
}

#[test]
fn explicit_values_override_defaults() {
    let config = SiteConfig::from_lookup(lookup_from(&[
        ("PORT", "8080"),
        ("SHARED_COOKIE_DOMAIN", ".Example.ORG"),
        ("COOKIE_SECURE", "yes"),
        ("CONTACT_TO", "team@example.org"),
        ("RESEND_API_KEY", "re_123"),
        ("CONTACT_DELIVERY_TIMEOUT_SECS", "3"),
        ("STATIC_DIR", "/srv/static"),
    ]))
    .unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.shared_cookie_domain, "example.org");
    assert!(config.cookie_secure);
    assert_eq!(config.contact_to, "team@example.org");
    assert_eq!(config.contact_from, DEFAULT_CONTACT_FROM);
    assert_eq!(config.resend_api_key.as_deref(), Some("re_123"));
    assert_eq!(config.delivery_timeout, Duration::from_secs(3));
    assert_eq!(config.static_dir, PathBuf::from("/srv/static"));
}

#[test]
fn blank_api_key_is_treated_as_unset() {
    let config = SiteConfig::from_lookup(lookup_from(&[("RESEND_API_KEY", "   ")])).unwrap();
    assert!(config.resend_api_key.is_none());
}

#[test]
fn malformed_port_is_rejected() {
    let err = SiteConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
}

#[test]
fn malformed_cookie_secure_is_rejected() {
    let err = SiteConfig::from_lookup(lookup_from(&[("COOKIE_SECURE", "maybe")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "COOKIE_SECURE", .. }));
}

#[test]
fn parse_bool_variants() {
    for val in ["1", "true", "YES", " On "] {
        assert_eq!(parse_bool(val), Some(true), "expected true for {val:?}");
    }
    for val in ["0", "false", "No", "off"] {
        assert_eq!(parse_bool(val), Some(false), "expected false for {val:?}");
    }
    assert_eq!(parse_bool(""), None);
    assert_eq!(parse_bool("maybe"), None);
}
