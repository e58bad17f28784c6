use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::DigestError;
use crate::summary::RetryPolicy;

/// `--init` で書き出すプレースホルダの接頭辞。検証時に未設定として扱う。
const PLACEHOLDER_PREFIX: &str = "YOUR_";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub notion: NotionConfig,
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NotionConfig {
    pub token: String,
    /// 行動ログのデータベース ID
    pub log_database_id: String,
    /// サマリーを保存するデータベース ID
    pub summary_database_id: String,
    /// ページタイトルの日付の後ろに付ける文字列 (例: " Summary")
    #[serde(default)]
    pub title_suffix: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: "YOUR_NOTION_TOKEN".to_string(),
            log_database_id: "YOUR_LOG_DATABASE_ID".to_string(),
            summary_database_id: "YOUR_SUMMARY_DATABASE_ID".to_string(),
            title_suffix: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "YOUR_GEMINI_API_KEY".to_string(),
            model: default_model(),
            timeout: default_timeout(),
            retry: RetryPolicy::default(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Config {
    /// 必須の認証情報とデータベース ID が設定されているか確認する。
    pub fn validate(&self) -> Result<(), DigestError> {
        let required = [
            ("notion.token", &self.notion.token),
            ("notion.log_database_id", &self.notion.log_database_id),
            ("notion.summary_database_id", &self.notion.summary_database_id),
            ("gemini.api_key", &self.gemini.api_key),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| {
                let value = value.trim();
                value.is_empty() || value.starts_with(PLACEHOLDER_PREFIX)
            })
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(DigestError::Configuration(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }
        if let Some(reason) = self.gemini.retry.invalid_multiplier() {
            return Err(DigestError::Configuration(reason));
        }
        Ok(())
    }
}

pub fn open_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
    let config: Config = toml::from_str(&content).context("Failed to parse configuration file")?;
    Ok(config)
}

pub fn write_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let config = Config::default();
    let content = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_example_config() {
        let content = include_str!("../../../config.example.toml");
        let config: Config = toml::from_str(content).expect("Failed to parse config.example.toml");

        let expected = Config {
            notion: NotionConfig {
                token: "YOUR_NOTION_TOKEN".to_string(),
                log_database_id: "YOUR_LOG_DATABASE_ID".to_string(),
                summary_database_id: "YOUR_SUMMARY_DATABASE_ID".to_string(),
                title_suffix: String::new(),
            },
            gemini: GeminiConfig {
                api_key: "YOUR_GEMINI_API_KEY".to_string(),
                model: "gemini-1.5-flash-latest".to_string(),
                timeout: Duration::from_secs(60),
                retry: RetryPolicy {
                    max_retries: 3,
                    base_delay: Duration::from_secs(1),
                    multiplier: 2.0,
                    max_delay: Duration::from_secs(30),
                },
            },
            server: ServerConfig {
                listen: "0.0.0.0:8080".parse().unwrap(),
            },
        };

        assert_eq!(config, expected);
    }

    #[test]
    fn optional_sections_use_defaults() {
        let content = r#"
            [notion]
            token = "secret_abc"
            log_database_id = "log"
            summary_database_id = "summary"
            title_suffix = " Summary"

            [gemini]
            api_key = "key"
        "#;
        let config: Config = toml::from_str(content).unwrap();

        assert_eq!(config.notion.title_suffix, " Summary");
        assert_eq!(config.gemini.model, "gemini-1.5-flash-latest");
        assert_eq!(config.gemini.retry, RetryPolicy::default());
        assert_eq!(config.server, ServerConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn placeholders_fail_validation() {
        let err = Config::default().validate().unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, DigestError::Configuration(_)));
        assert!(message.contains("notion.token"));
        assert!(message.contains("gemini.api_key"));
    }

    #[test]
    fn empty_values_fail_validation() {
        let mut config = Config {
            notion: NotionConfig {
                token: "secret".into(),
                log_database_id: "log".into(),
                summary_database_id: " ".into(),
                title_suffix: String::new(),
            },
            ..Default::default()
        };
        config.gemini.api_key = "key".into();

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("notion.summary_database_id"));
        assert!(!message.contains("notion.token"));
    }

    #[test]
    fn retry_multiplier_is_validated() {
        let content = r#"
            [notion]
            token = "secret_abc"
            log_database_id = "log"
            summary_database_id = "summary"

            [gemini]
            api_key = "key"

            [gemini.retry]
            max_retries = 100
            multiplier = inf
        "#;
        let config: Config = toml::from_str(content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DigestError::Configuration(_)));
        assert!(err.to_string().contains("gemini.retry.multiplier"));

        let mut config = config;
        config.gemini.retry.multiplier = 0.0;
        assert!(config.validate().is_err());
        config.gemini.retry.multiplier = 1.5;
        assert!(config.validate().is_ok());
        assert_eq!(config.gemini.retry.delay_for(70), config.gemini.retry.max_delay);
    }

    #[test]
    fn default_config_round_trips() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        write_default_config(temp.path()).unwrap();
        let config = open_config(temp.path()).unwrap();
        assert_eq!(config, Config::default());
    }
}
