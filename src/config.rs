use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub emergency: EmergencySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Document,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub file: FileStorageSettings,
    pub document: Option<DocumentStorageSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileStorageSettings {
    #[serde(default = "default_data_path")]
    pub path: String,
    #[serde(default = "default_true")]
    pub seed_if_missing: bool,
}

impl Default for FileStorageSettings {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            seed_if_missing: true,
        }
    }
}

fn default_data_path() -> String { "data.json".to_string() }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentStorageSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    #[serde(default)]
    pub collections: CollectionSettings,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_doctors_collection")]
    pub doctors: String,
    #[serde(default = "default_patients_collection")]
    pub patients: String,
    #[serde(default = "default_appointments_collection")]
    pub appointments: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            doctors: default_doctors_collection(),
            patients: default_patients_collection(),
            appointments: default_appointments_collection(),
        }
    }
}

fn default_doctors_collection() -> String { "doctors".to_string() }
fn default_patients_collection() -> String { "patients".to_string() }
fn default_appointments_collection() -> String { "appointments".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub slack: SlackSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackSettings {
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
    #[serde(default = "default_slack_api_base")]
    pub api_base: String,
    pub timeout_secs: Option<u64>,
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel_id: None,
            api_base: default_slack_api_base(),
            timeout_secs: None,
        }
    }
}

impl SlackSettings {
    /// Token and channel, when both are set and non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let token = self.bot_token.as_deref().filter(|t| !t.trim().is_empty())?;
        let channel = self.channel_id.as_deref().filter(|c| !c.trim().is_empty())?;
        Some((token, channel))
    }
}

fn default_slack_api_base() -> String { "https://slack.com/api".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct EmergencySettings {
    #[serde(default = "default_nearest_limit")]
    pub nearest_limit: usize,
}

impl Default for EmergencySettings {
    fn default() -> Self {
        Self {
            nearest_limit: default_nearest_limit(),
        }
    }
}

fn default_nearest_limit() -> usize { crate::core::NEAREST_LIMIT }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MYDOCTOR__)
    /// 5. SLACK_BOT_TOKEN / SLACK_CHANNEL_ID
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MYDOCTOR__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("MYDOCTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_legacy_env(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MYDOCTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_legacy_env(settings)?.try_deserialize()
    }
}

/// Honour the Slack variables existing deployments already export
fn apply_legacy_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(token) = env::var("SLACK_BOT_TOKEN") {
        builder = builder.set_override("notifications.slack.bot_token", token)?;
    }
    if let Ok(channel) = env::var("SLACK_CHANNEL_ID") {
        builder = builder.set_override("notifications.slack.channel_id", channel)?;
    }

    builder.build()
}
