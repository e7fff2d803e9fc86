use std::{fs, io::ErrorKind, path::Path, time::Duration};

use anyhow::{Context, Result};
use relay_integration::{RelayConfig, DEFAULT_RELAY_ENDPOINT, DEFAULT_SIMULATED_DELAY};
use serde::Deserialize;
use shared::domain::Recipient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub relay_endpoint: String,
    pub relay_service_id: Option<String>,
    pub relay_template_id: Option<String>,
    pub relay_public_key: Option<String>,
    pub recipient_name: String,
    pub recipient_email: String,
    pub demo_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            relay_endpoint: DEFAULT_RELAY_ENDPOINT.into(),
            relay_service_id: None,
            relay_template_id: None,
            relay_public_key: None,
            recipient_name: "Site Owner".into(),
            recipient_email: "owner@example.com".into(),
            demo_delay_ms: DEFAULT_SIMULATED_DELAY.as_millis() as u64,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    relay_endpoint: Option<String>,
    relay_service_id: Option<String>,
    relay_template_id: Option<String>,
    relay_public_key: Option<String>,
    recipient_name: Option<String>,
    recipient_email: Option<String>,
    demo_delay_ms: Option<u64>,
}

impl Settings {
    pub fn recipient(&self) -> Recipient {
        Recipient::new(self.recipient_name.clone(), self.recipient_email.clone())
    }

    pub fn demo_delay(&self) -> Duration {
        Duration::from_millis(self.demo_delay_ms)
    }

    /// `None` until service id, template id and public key are all set.
    pub fn relay_config(&self) -> Result<Option<RelayConfig>> {
        let (Some(service_id), Some(template_id), Some(public_key)) = (
            non_empty(&self.relay_service_id),
            non_empty(&self.relay_template_id),
            non_empty(&self.relay_public_key),
        ) else {
            return Ok(None);
        };

        RelayConfig::new(&self.relay_endpoint, service_id, template_id, public_key).map(Some)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings = Settings::default();
    merge_file(&mut settings, path)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn merge_file(settings: &mut Settings, path: &Path) -> Result<()> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };

    let file_cfg: FileSettings =
        toml::from_str(&raw).with_context(|| format!("failed to parse '{}'", path.display()))?;

    if let Some(v) = file_cfg.relay_endpoint {
        settings.relay_endpoint = v;
    }
    if let Some(v) = file_cfg.relay_service_id {
        settings.relay_service_id = Some(v);
    }
    if let Some(v) = file_cfg.relay_template_id {
        settings.relay_template_id = Some(v);
    }
    if let Some(v) = file_cfg.relay_public_key {
        settings.relay_public_key = Some(v);
    }
    if let Some(v) = file_cfg.recipient_name {
        settings.recipient_name = v;
    }
    if let Some(v) = file_cfg.recipient_email {
        settings.recipient_email = v;
    }
    if let Some(v) = file_cfg.demo_delay_ms {
        settings.demo_delay_ms = v;
    }

    Ok(())
}

// Plain names first, `APP__` names win when both are set.
pub fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let var = |plain: &str, prefixed: &str| lookup(prefixed).or_else(|| lookup(plain));

    if let Some(v) = var("RELAY_ENDPOINT", "APP__RELAY_ENDPOINT") {
        settings.relay_endpoint = v;
    }
    if let Some(v) = var("RELAY_SERVICE_ID", "APP__RELAY_SERVICE_ID") {
        settings.relay_service_id = Some(v);
    }
    if let Some(v) = var("RELAY_TEMPLATE_ID", "APP__RELAY_TEMPLATE_ID") {
        settings.relay_template_id = Some(v);
    }
    if let Some(v) = var("RELAY_PUBLIC_KEY", "APP__RELAY_PUBLIC_KEY") {
        settings.relay_public_key = Some(v);
    }
    if let Some(v) = var("CONTACT_RECIPIENT_NAME", "APP__RECIPIENT_NAME") {
        settings.recipient_name = v;
    }
    if let Some(v) = var("CONTACT_RECIPIENT_EMAIL", "APP__RECIPIENT_EMAIL") {
        settings.recipient_email = v;
    }
    if let Some(v) = lookup("APP__DEMO_DELAY_MS") {
        settings.demo_delay_ms = v
            .trim()
            .parse()
            .with_context(|| format!("APP__DEMO_DELAY_MS must be milliseconds, got '{v}'"))?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
