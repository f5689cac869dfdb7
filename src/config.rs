use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置
///
/// 优先级：默认值 < TOML 配置文件 < 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 补全服务配置 ---
    /// 为空时进入降级模式
    pub provider_api_key: String,
    pub provider_endpoint: String,
    pub provider_model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 存储配置 ---
    /// 会话日志所在目录
    pub data_dir: String,
    /// 会话日志文件名
    pub log_file_name: String,
    /// 系统提示词文件
    pub prompts_path: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_api_key: String::new(),
            provider_endpoint: "https://api.mistral.ai/v1/chat/completions".to_string(),
            provider_model: "mistral-small-latest".to_string(),
            temperature: 0.8,
            top_p: 0.9,
            max_tokens: 64,
            request_timeout_secs: 15,
            data_dir: "data".to_string(),
            log_file_name: "QR.txt".to_string(),
            prompts_path: "prompts.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 先读取 TOML 文件（如果提供），再用环境变量覆盖
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match config_file {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileUnreadable {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::FileInvalid {
            path: path.display().to_string(),
            source,
        })
    }

    fn with_env_overrides(self) -> Self {
        Self {
            provider_api_key: env("MISTRAL_API_KEY").unwrap_or(self.provider_api_key),
            provider_endpoint: env("PROVIDER_ENDPOINT").unwrap_or(self.provider_endpoint),
            provider_model: env("PROVIDER_MODEL").unwrap_or(self.provider_model),
            temperature: parsed("PROVIDER_TEMPERATURE").unwrap_or(self.temperature),
            top_p: parsed("PROVIDER_TOP_P").unwrap_or(self.top_p),
            max_tokens: parsed("PROVIDER_MAX_TOKENS").unwrap_or(self.max_tokens),
            request_timeout_secs: parsed("PROVIDER_TIMEOUT_SECS").unwrap_or(self.request_timeout_secs),
            data_dir: env("DATA_DIR").unwrap_or(self.data_dir),
            log_file_name: env("LOG_FILE_NAME").unwrap_or(self.log_file_name),
            prompts_path: env("PROMPTS_PATH").unwrap_or(self.prompts_path),
            verbose_logging: parsed("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    /// 是否配置了补全服务的凭证（任意非空字符串）
    pub fn has_provider_credential(&self) -> bool {
        !self.provider_api_key.is_empty()
    }

    /// 会话日志文件的完整路径
    pub fn log_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.log_file_name)
    }
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// 读取并解析环境变量，无法解析时视为未设置
fn parsed<T: FromStr>(name: &str) -> Option<T> {
    env(name).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_start_in_degraded_mode() {
        let config = Config::default();
        assert!(!config.has_provider_credential());
        assert_eq!(config.log_path(), Path::new("data").join("QR.txt"));
        assert_eq!(config.max_tokens, 64);
    }

    #[test]
    fn toml_file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_dir = \"/tmp/interviews\"\nmax_tokens = 32").unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.data_dir, "/tmp/interviews");
        assert_eq!(config.max_tokens, 32);
        assert_eq!(config.provider_model, "mistral-small-latest");
    }

    #[test]
    fn invalid_toml_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tokens = \"many\"").unwrap();

        let err = Config::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::FileInvalid { .. }));
    }

    #[test]
    fn any_non_empty_key_is_a_credential() {
        let config = Config {
            provider_api_key: "   ".to_string(),
            ..Config::default()
        };
        assert!(config.has_provider_credential());
    }

    #[test]
    fn unparsable_env_value_is_ignored() {
        std::env::set_var("GUIDED_INTERVIEW_TEST_MAX_TOKENS", "many");
        std::env::set_var("GUIDED_INTERVIEW_TEST_TOP_P", " 0.5 ");

        assert_eq!(parsed::<u32>("GUIDED_INTERVIEW_TEST_MAX_TOKENS"), None);
        assert_eq!(parsed::<f32>("GUIDED_INTERVIEW_TEST_TOP_P"), Some(0.5));
        assert_eq!(parsed::<u64>("GUIDED_INTERVIEW_TEST_UNSET"), None);
    }
}
