use super::ServiceConfig;
use crate::utils::error::{Result, SourceBotError};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，未列出的欄位沿用預設值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content, |name| std::env::var(name).ok());

        let mut config: Self =
            toml::from_str(&processed).map_err(|e| SourceBotError::InvalidConfigValueError {
                field: "toml_parsing".to_string(),
                value: String::new(),
                reason: format!("TOML parsing error: {}", e),
            })?;

        // 未解析的 ${VAR} 金鑰視為未設定
        for key in [&mut config.anthropic.api_key, &mut config.elevenlabs.api_key] {
            if key.as_deref().is_some_and(|k| k.starts_with("${")) {
                *key = None;
            }
        }
        Ok(config)
    }
}

/// 替換環境變數 (例如 ${ANTHROPIC_API_KEY})；未設定的變數原樣保留
pub fn substitute_env_vars<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    placeholder()
        .replace_all(content, |caps: &Captures| {
            let name = &caps[1];
            lookup(name).unwrap_or_else(|| format!("${{{}}}", name))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_partial_toml_config() {
        let toml_content = r#"
[server]
port = 8080

[anthropic]
model = "claude-haiku"

[notifications]
auto_approval = true
"#;

        let config = ServiceConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.notification_port, 5001);
        assert_eq!(config.anthropic.model, "claude-haiku");
        assert!(config.notifications.auto_approval);
        assert!(config.notifications.voice_enabled);
    }

    #[test]
    fn test_env_var_substitution() {
        let content = r#"api_key = "${SOURCEBOT_TEST_KEY}" other = "${SOURCEBOT_UNSET}""#;
        let replaced = substitute_env_vars(content, |name| {
            (name == "SOURCEBOT_TEST_KEY").then(|| "sk-live".to_string())
        });
        assert_eq!(replaced, r#"api_key = "sk-live" other = "${SOURCEBOT_UNSET}""#);
    }

    #[test]
    fn test_unresolved_key_placeholder_is_dropped() {
        let config = ServiceConfig::from_toml_str(
            r#"
[anthropic]
api_key = "${SOURCEBOT_TEST_NEVER_SET_KEY}"
"#,
        )
        .unwrap();
        assert!(config.anthropic.api_key.is_none());
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[elevenlabs]
base_url = "invalid-url"
"#;

        let config = ServiceConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = ServiceConfig::from_toml_str("[server\nport = ").unwrap_err();
        assert!(err.to_string().contains("TOML parsing error"));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[data]
inventory_file = "fixtures/inventory.csv"
sales_file = "fixtures/sales.csv"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = ServiceConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.data.inventory_file, "fixtures/inventory.csv");
        assert_eq!(config.data.sales_file, "fixtures/sales.csv");
    }
}
