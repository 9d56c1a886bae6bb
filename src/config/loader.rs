//! 配置文件加载
//!
//! 读取 TOML 配置，展开 `${VAR}` 环境变量引用后反序列化并校验

use crate::config::types::{validate_config, Config};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};

/// 配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 读取并校验配置文件
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 解析并校验配置内容
    async fn load_from_string(&self, content: &str) -> Result<Config>;

    fn validate(&self, config: &Config) -> Result<()>;
}

/// TOML 配置加载器
///
/// 服务令牌一般通过 `service_token = "${STACKSTATE_SERVICE_TOKEN}"` 从环境变量注入
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    enable_env_substitution: bool,
}

impl TomlConfigLoader {
    /// 创建加载器
    ///
    /// # 参数
    /// * `enable_env_substitution` - 是否展开 `${VAR}` 环境变量引用
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 展开环境变量引用，第一个未定义的变量会导致失败
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("环境变量匹配规则无效: {}", e)))?;

        let mut missing: Option<String> = None;
        let expanded = pattern.replace_all(content, |captures: &Captures| {
            let name = &captures[1];
            std::env::var(name).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            })
        });

        match missing {
            Some(var) => Err(ConfigError::EnvVarError { var }.into()),
            None => Ok(expanded.into_owned()),
        }
    }

    fn parse(&self, content: &str) -> Result<Config> {
        let expanded = self.substitute_env_vars(content)?;
        let config = toml::from_str::<Config>(&expanded)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?;
        self.validate(&config)?;
        Ok(config)
    }
}

impl Default for TomlConfigLoader {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => {
                return Err(ConfigError::ParseError(format!(
                    "读取配置文件 {} 失败: {}",
                    path.display(),
                    e
                ))
                .into());
            }
        };

        let config = self.parse(&content)?;

        log::info!("已加载配置文件: {}", path.display());
        log::debug!(
            "StackState API地址: {}, 发现排除属性: {:?}",
            config.stackstate.api_base_url,
            config.stackstate.discovery_attribute_excludes
        );

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<Config> {
        self.parse(content)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

/// 获取默认配置文件路径
///
/// 当前目录存在 `config.toml` 时优先使用，否则使用
/// `<config_dir>/stackstate-extension/config.toml`
pub fn get_default_config_path() -> PathBuf {
    if Path::new("config.toml").exists() {
        return PathBuf::from("config.toml");
    }

    dirs::config_dir()
        .map(|config_dir| config_dir.join(crate::APP_NAME).join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    const TEST_CONFIG_TOML: &str = r#"
[global]
log_level = "debug"
request_timeout_seconds = 5

[stackstate]
api_base_url = "https://stackstate.example.com/api"
service_token = "secret"
discovery_attribute_excludes = ["k8s.namespace"]
"#;

    const TEST_CONFIG_WITH_ENV_VARS: &str = r#"
[stackstate]
api_base_url = "${STACKSTATE_TEST_URL}"
service_token = "${STACKSTATE_TEST_TOKEN}"
"#;

    #[tokio::test]
    async fn test_toml_parsing() {
        let loader = TomlConfigLoader::new(false);
        let config = loader.load_from_string(TEST_CONFIG_TOML).await.unwrap();

        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.global.request_timeout_seconds, 5);
        assert_eq!(config.global.discovery_interval_seconds, 60);
        assert_eq!(config.global.check_interval_millis, 1000);
        assert_eq!(config.stackstate.service_token, "secret");
        assert_eq!(
            config.stackstate.discovery_attribute_excludes,
            vec!["k8s.namespace".to_string()]
        );
        assert_eq!(config.web.port, 8083);
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution() {
        env::set_var("STACKSTATE_TEST_URL", "http://localhost:7070/api");
        env::set_var("STACKSTATE_TEST_TOKEN", "token-123");

        let loader = TomlConfigLoader::new(true);
        let config = loader
            .load_from_string(TEST_CONFIG_WITH_ENV_VARS)
            .await
            .unwrap();

        assert_eq!(config.stackstate.api_base_url, "http://localhost:7070/api");
        assert_eq!(config.stackstate.service_token, "token-123");

        env::remove_var("STACKSTATE_TEST_URL");
        env::remove_var("STACKSTATE_TEST_TOKEN");
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution_missing_var() {
        env::remove_var("STACKSTATE_TEST_URL");

        let loader = TomlConfigLoader::new(true);
        let result = loader.load_from_string(TEST_CONFIG_WITH_ENV_VARS).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("STACKSTATE_TEST_URL"));
    }

    #[tokio::test]
    async fn test_missing_required_section() {
        let loader = TomlConfigLoader::new(false);
        let result = loader
            .load_from_string("[global]\nlog_level = \"info\"\n")
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEST_CONFIG_TOML.as_bytes()).unwrap();

        let loader = TomlConfigLoader::new(false);
        let config = loader.load_from_file(file.path()).await.unwrap();
        assert_eq!(config.stackstate.service_token, "secret");
    }

    #[tokio::test]
    async fn test_load_from_missing_file() {
        let loader = TomlConfigLoader::new(false);
        let result = loader.load_from_file("/nonexistent/stackstate.toml").await;

        assert!(result.unwrap_err().to_string().contains("配置文件不存在"));
    }

    #[test]
    fn test_env_substitution_disabled_keeps_references() {
        let loader = TomlConfigLoader::new(false);
        let content = "service_token = \"${STACKSTATE_SERVICE_TOKEN}\"";
        assert_eq!(loader.substitute_env_vars(content).unwrap(), content);
    }

    #[test]
    #[serial]
    fn test_env_substitution_repeated_reference() {
        env::set_var("STACKSTATE_TEST_HOST", "stackstate.local");

        let loader = TomlConfigLoader::new(true);
        let result = loader
            .substitute_env_vars("a = \"${STACKSTATE_TEST_HOST}\"\nb = \"${STACKSTATE_TEST_HOST}\"")
            .unwrap();
        assert_eq!(result, "a = \"stackstate.local\"\nb = \"stackstate.local\"");

        env::remove_var("STACKSTATE_TEST_HOST");
    }

    #[test]
    fn test_get_default_config_path() {
        let path = get_default_config_path();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
