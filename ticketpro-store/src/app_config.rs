use serde::Deserialize;
use std::env;
use ticketpro_ops::{BackupFrequency, BackupSettings};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub backup: BackupConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Without a URL the service keeps everything in memory
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    /// Seeded as the first admin user when the user list is empty
    #[serde(default = "default_admin_name")]
    pub bootstrap_admin_name: String,
    #[serde(default = "default_admin_email")]
    pub bootstrap_admin_email: String,
}

fn default_admin_name() -> String {
    "Ahmed Rahman".to_string()
}

fn default_admin_email() -> String {
    "admin@bdticketpro.com".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BusinessRules {
    pub lock_hold_hours: i64,
    pub expiry_warning_hours: i64,
    pub expiry_alert_hours: i64,
    /// Cosmetic "processing" delay before a booking is applied
    pub booking_delay_ms: u64,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            lock_hold_hours: 24,
            expiry_warning_hours: 24,
            expiry_alert_hours: 2,
            booking_delay_ms: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackupConfig {
    #[serde(default)]
    pub frequency: BackupFrequency,
    #[serde(default = "default_true")]
    pub auto_enabled: bool,
    #[serde(default = "default_step_delay")]
    pub step_delay_ms: u64,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
}

fn default_true() -> bool {
    true
}

fn default_step_delay() -> u64 {
    500
}

fn default_check_interval() -> u64 {
    1800
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            frequency: BackupFrequency::Daily,
            auto_enabled: true,
            step_delay_ms: default_step_delay(),
            check_interval_seconds: default_check_interval(),
        }
    }
}

impl BackupConfig {
    pub fn settings(&self) -> BackupSettings {
        BackupSettings {
            auto_enabled: self.auto_enabled,
            frequency: self.frequency,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `TICKETPRO__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("TICKETPRO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
