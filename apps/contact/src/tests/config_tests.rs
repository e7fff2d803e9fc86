use super::*;

use std::{
    collections::HashMap,
    env,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> (PathBuf, PathBuf) {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("contact_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("contact.toml");
    fs::write(&path, contents).expect("write config");
    (temp_root, path)
}

fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn missing_file_keeps_defaults_and_simulated_relay() {
    let mut settings = Settings::default();
    merge_file(&mut settings, Path::new("./definitely/not/here/contact.toml")).expect("merge");

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.relay_endpoint, DEFAULT_RELAY_ENDPOINT);
    assert!(settings.relay_config().expect("config").is_none());
    assert_eq!(settings.demo_delay(), DEFAULT_SIMULATED_DELAY);
}

#[test]
fn file_values_replace_defaults() {
    let (temp_root, path) = temp_config(
        r#"
relay_service_id = "service_abc"
relay_template_id = "template_abc"
relay_public_key = "pk_abc"
recipient_name = "Grace"
recipient_email = "grace@example.org"
demo_delay_ms = 150
"#,
    );

    let mut settings = Settings::default();
    merge_file(&mut settings, &path).expect("merge");

    assert_eq!(settings.recipient(), Recipient::new("Grace", "grace@example.org"));
    assert_eq!(settings.demo_delay(), Duration::from_millis(150));

    let relay = settings.relay_config().expect("config").expect("relay");
    assert_eq!(relay.service_id, "service_abc");
    assert_eq!(relay.template_id, "template_abc");
    assert_eq!(relay.public_key, "pk_abc");
    assert_eq!(relay.endpoint.as_str(), DEFAULT_RELAY_ENDPOINT);

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn malformed_file_is_an_error() {
    let (temp_root, path) = temp_config("relay_service_id = [unterminated");

    let mut settings = Settings::default();
    let err = merge_file(&mut settings, &path).expect_err("malformed");
    assert!(err.to_string().contains("failed to parse"), "{err}");

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        lookup_from(&[
            ("RELAY_SERVICE_ID", "plain_service"),
            ("APP__RELAY_SERVICE_ID", "prefixed_service"),
            ("RELAY_TEMPLATE_ID", "plain_template"),
            ("CONTACT_RECIPIENT_EMAIL", "me@example.net"),
            ("APP__DEMO_DELAY_MS", " 10 "),
        ]),
    )
    .expect("overrides");

    assert_eq!(settings.relay_service_id.as_deref(), Some("prefixed_service"));
    assert_eq!(settings.relay_template_id.as_deref(), Some("plain_template"));
    assert_eq!(settings.recipient_email, "me@example.net");
    assert_eq!(settings.demo_delay_ms, 10);
}

#[test]
fn quoted_demo_delay_in_file_is_rejected() {
    let (temp_root, path) = temp_config("demo_delay_ms = \"150\"\n");

    let mut settings = Settings::default();
    merge_file(&mut settings, &path).expect_err("demo_delay_ms must be an integer");
    assert_eq!(settings, Settings::default());

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn non_numeric_demo_delay_is_rejected() {
    let mut settings = Settings::default();
    assert!(
        apply_env_overrides(&mut settings, lookup_from(&[("APP__DEMO_DELAY_MS", "soon")]))
            .is_err()
    );
}

#[test]
fn partial_or_blank_credentials_do_not_enable_relay() {
    let settings = Settings {
        relay_service_id: Some("service".into()),
        relay_template_id: Some("template".into()),
        relay_public_key: Some("  ".into()),
        ..Settings::default()
    };
    assert!(settings.relay_config().expect("config").is_none());
}

#[test]
fn invalid_endpoint_is_reported_once_credentials_exist() {
    let settings = Settings {
        relay_endpoint: "::not-a-url".into(),
        relay_service_id: Some("service".into()),
        relay_template_id: Some("template".into()),
        relay_public_key: Some("key".into()),
        ..Settings::default()
    };
    assert!(settings.relay_config().is_err());
}
