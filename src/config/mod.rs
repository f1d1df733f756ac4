#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::{anthropic, elevenlabs};
use crate::core::notification::HubSettings;
use crate::core::DatasetPaths;
use crate::utils::error::{Result, SourceBotError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_INVENTORY_FILE: &str =
    "data/Retail/retail_inventory_snapshot_30_10_25_cleaned.csv";
pub const DEFAULT_SALES_FILE: &str =
    "data/Retail/retail_sales_data_01_09_2023_to_31_10_2025_cleaned.csv";

/// Everything both services need, resolved from defaults, TOML, env and CLI.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub anthropic: AnthropicConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub data: DataConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub notification_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            notification_port: 5001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: anthropic::DEFAULT_MODEL.to_string(),
            base_url: anthropic::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevenLabsConfig {
    pub api_key: Option<String>,
    pub voice_id: String,
    pub model_id: String,
    pub base_url: String,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            voice_id: elevenlabs::DEFAULT_VOICE_ID.to_string(),
            model_id: elevenlabs::DEFAULT_MODEL_ID.to_string(),
            base_url: elevenlabs::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub inventory_file: String,
    pub sales_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            inventory_file: DEFAULT_INVENTORY_FILE.to_string(),
            sales_file: DEFAULT_SALES_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub auto_approval: bool,
    pub voice_enabled: bool,
    pub keepalive_seconds: u64,
    /// Informational only; logged at startup.
    pub agent_platform_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            auto_approval: false,
            voice_enabled: true,
            keepalive_seconds: 30,
            agent_platform_url: "http://localhost:8000".to_string(),
        }
    }
}

/// 讀取 `api.env`，找不到時退回 `.env`。兩者都不存在並非錯誤。
pub fn load_env_file() -> Option<std::path::PathBuf> {
    dotenv::from_filename("api.env")
        .or_else(|_| dotenv::dotenv())
        .ok()
}

/// Only `true` (any case) switches a flag on; every other value reads as off.
fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

impl ServiceConfig {
    /// Overlay environment variables. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = Some(key);
        }
        if let Some(model) = lookup("CLAUDE_MODEL") {
            self.anthropic.model = model;
        }
        if let Some(url) = lookup("ANTHROPIC_BASE_URL") {
            self.anthropic.base_url = url;
        }
        if let Some(key) = lookup("ELEVENLABS_API_KEY") {
            self.elevenlabs.api_key = Some(key);
        }
        if let Some(voice) = lookup("ELEVENLABS_VOICE_ID") {
            self.elevenlabs.voice_id = voice;
        }
        if let Some(url) = lookup("ELEVENLABS_BASE_URL") {
            self.elevenlabs.base_url = url;
        }
        if let Some(path) = lookup("INVENTORY_FILE") {
            self.data.inventory_file = path;
        }
        if let Some(path) = lookup("SALES_FILE") {
            self.data.sales_file = path;
        }
        if let Some(url) = lookup("AGENT_PLATFORM_URL") {
            self.notifications.agent_platform_url = url;
        }

        for (name, target) in [
            ("ENABLE_AUTO_APPROVAL", &mut self.notifications.auto_approval),
            ("ENABLE_VOICE_NOTIFICATIONS", &mut self.notifications.voice_enabled),
        ] {
            if let Some(raw) = lookup(name) {
                *target = parse_flag(&raw);
            }
        }
    }

    pub fn dataset_paths(&self) -> DatasetPaths {
        DatasetPaths::new(&self.data.inventory_file, &self.data.sales_file)
    }

    pub fn hub_settings(&self) -> HubSettings {
        HubSettings {
            auto_approval: self.notifications.auto_approval,
            voice_enabled: self.notifications.voice_enabled,
            keepalive_interval: Duration::from_secs(self.notifications.keepalive_seconds),
            ..HubSettings::default()
        }
    }

    /// Keys are optional at startup; the affected endpoints fail later.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.anthropic.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            missing.push("ANTHROPIC_API_KEY");
        }
        if self.elevenlabs.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            missing.push("ELEVENLABS_API_KEY");
        }
        missing
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_range("server.port", self.server.port, 1, u16::MAX)?;
        validate_range(
            "server.notification_port",
            self.server.notification_port,
            1,
            u16::MAX,
        )?;
        if self.server.port == self.server.notification_port {
            return Err(SourceBotError::InvalidConfigValueError {
                field: "server.notification_port".to_string(),
                value: self.server.notification_port.to_string(),
                reason: "Must differ from server.port".to_string(),
            });
        }

        validate_non_empty_string("anthropic.model", &self.anthropic.model)?;
        validate_url("anthropic.base_url", &self.anthropic.base_url)?;
        validate_non_empty_string("elevenlabs.voice_id", &self.elevenlabs.voice_id)?;
        validate_non_empty_string("elevenlabs.model_id", &self.elevenlabs.model_id)?;
        validate_url("elevenlabs.base_url", &self.elevenlabs.base_url)?;

        validate_path("data.inventory_file", &self.data.inventory_file)?;
        validate_path("data.sales_file", &self.data.sales_file)?;

        validate_range(
            "notifications.keepalive_seconds",
            self.notifications.keepalive_seconds,
            1,
            3600,
        )?;
        Ok(())
    }
}
