use serde::{Deserialize, Serialize};
use std::fs;
use lettre::message::Mailbox;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::error::{AppResult, ConfigError};
use crate::models::{FilterField, FilterRange, Selectors};

/// 未指定 `--config` 时尝试读取的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "archive_dispatch.toml";

/// 发送方式，一次运行只使用其中一种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// 在查看器中填写邮箱并点击 Verstuur
    #[default]
    Form,
    /// 读取分享链接，通过 SMTP 直接发信
    Mail,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "form" | "site" => Ok(DispatchMode::Form),
            "mail" | "email" | "smtp" => Ok(DispatchMode::Mail),
            other => Err(format!("未知的发送方式: {}", other)),
        }
    }
}

/// SMTP 配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// 发件人地址
    pub from: String,
    /// 587 端口一般使用 STARTTLS，465 端口使用隐式 TLS
    pub starttls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            starttls: true,
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 目录列表页面
    pub start_url: String,
    /// 过滤范围
    pub filter: FilterRange,
    /// 接收邮箱
    pub email_to: String,
    /// 是否无头模式
    pub headless: bool,
    /// 每个浏览器动作之后的延迟（毫秒）
    pub slow_mo_ms: u64,
    /// 两个条目之间的停顿（毫秒）
    pub pause_between_ms: u64,
    /// 试运行：不点击发送按钮，也不真正发信
    pub dry_run: bool,
    /// 发送方式
    pub dispatch_mode: DispatchMode,
    /// 状态文件
    pub state_file: String,
    /// 浏览器调试端口；设置后连接已有浏览器，否则启动新浏览器
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 页面加载超时（毫秒）
    pub navigation_timeout_ms: u64,
    /// 点击超时（毫秒）
    pub click_timeout_ms: u64,
    /// 等待分享按钮 / 邮箱输入框的超时（毫秒）
    pub share_timeout_ms: u64,
    /// 点击发送后的等待时间（毫秒）
    pub settle_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    pub smtp: SmtpConfig,
    pub selectors: Selectors,
    /// 实际读取的配置文件
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_url: "https://hetutrechtsarchief.nl/collectie/609C5BCE05EA4642E0534701000A17FD"
                .to_string(),
            filter: FilterRange::default(),
            email_to: String::new(),
            headless: false,
            slow_mo_ms: 200,
            pause_between_ms: 1200,
            dry_run: true,
            dispatch_mode: DispatchMode::Form,
            state_file: "processed_ids.json".to_string(),
            browser_debug_port: None,
            chrome_executable: None,
            navigation_timeout_ms: 30_000,
            click_timeout_ms: 10_000,
            share_timeout_ms: 8_000,
            settle_ms: 1200,
            verbose_logging: false,
            smtp: SmtpConfig::default(),
            selectors: Selectors::default(),
            source: None,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → 配置文件 → 环境变量
    ///
    /// 显式指定的配置文件必须存在；未指定时只在 `archive_dispatch.toml` 存在时读取
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config = Self::from_toml_str(&content, &path.display().to_string())?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| {
            ConfigError::TomlParseFailed {
                path: origin.to_string(),
                source: e,
            }
            .into()
        })
    }

    /// 使用环境变量覆盖配置
    pub fn apply_env(&mut self) -> AppResult<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// 使用给定的变量来源覆盖配置（便于测试）
    pub fn apply_vars<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = EnvVars { lookup: &lookup };

        if let Some(v) = vars.string("START_URL") {
            self.start_url = v;
        }
        if let Some(v) = vars.string("FILTER_FIELD") {
            self.filter.field = v
                .parse::<FilterField>()
                .map_err(|_| parse_failed("FILTER_FIELD", &v, "number|year"))?;
        }
        if let Some(v) = vars.parse("MIN_NUMBER")? {
            self.filter.min = v;
        }
        if let Some(v) = vars.parse("MAX_NUMBER")? {
            self.filter.max = v;
        }
        if let Some(v) = vars.string("EMAIL_TO") {
            self.email_to = v;
        }
        if let Some(v) = vars.flag("HEADLESS")? {
            self.headless = v;
        }
        if let Some(v) = vars.parse("SLOW_MO_MS")? {
            self.slow_mo_ms = v;
        }
        if let Some(v) = vars.parse("PAUSE_BETWEEN_MS")? {
            self.pause_between_ms = v;
        }
        if let Some(v) = vars.flag("DRY_RUN")? {
            self.dry_run = v;
        }
        if let Some(v) = vars.string("DISPATCH_MODE") {
            self.dispatch_mode = v
                .parse()
                .map_err(|_| parse_failed("DISPATCH_MODE", &v, "form|mail"))?;
        }
        if let Some(v) = vars.string("STATE_FILE") {
            self.state_file = v;
        }
        if let Some(v) = vars.parse("BROWSER_DEBUG_PORT")? {
            self.browser_debug_port = Some(v);
        }
        if let Some(v) = vars.string("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }
        if let Some(v) = vars.parse("NAVIGATION_TIMEOUT_MS")? {
            self.navigation_timeout_ms = v;
        }
        if let Some(v) = vars.parse("CLICK_TIMEOUT_MS")? {
            self.click_timeout_ms = v;
        }
        if let Some(v) = vars.parse("SHARE_TIMEOUT_MS")? {
            self.share_timeout_ms = v;
        }
        if let Some(v) = vars.parse("SETTLE_MS")? {
            self.settle_ms = v;
        }
        if let Some(v) = vars.flag("VERBOSE_LOGGING")? {
            self.verbose_logging = v;
        }

        // --- SMTP ---
        if let Some(v) = vars.string("SMTP_HOST") {
            self.smtp.host = v;
        }
        if let Some(v) = vars.parse("SMTP_PORT")? {
            self.smtp.port = v;
        }
        if let Some(v) = vars.string("SMTP_USERNAME") {
            self.smtp.username = v;
        }
        if let Some(v) = vars.string("SMTP_PASSWORD") {
            self.smtp.password = v;
        }
        if let Some(v) = vars.string("SMTP_FROM") {
            self.smtp.from = v;
        }
        if let Some(v) = vars.flag("SMTP_STARTTLS")? {
            self.smtp.starttls = v;
        }

        Ok(())
    }

    /// 检查配置是否可以运行
    pub fn validate(&self) -> AppResult<()> {
        if self.start_url.trim().is_empty() {
            return Err(ConfigError::Missing("start_url").into());
        }
        if self.filter.min > self.filter.max {
            return Err(ConfigError::Invalid {
                field: "filter",
                reason: format!("min ({}) 大于 max ({})", self.filter.min, self.filter.max),
            }
            .into());
        }
        if self.email_to.trim().is_empty() {
            return Err(ConfigError::Missing("email_to").into());
        }
        if self.selectors.list.is_empty() {
            return Err(ConfigError::Missing("selectors.list").into());
        }
        if self.dispatch_mode == DispatchMode::Mail {
            if self.smtp.host.trim().is_empty() {
                return Err(ConfigError::Missing("smtp.host").into());
            }
            if self.smtp.from.trim().is_empty() {
                return Err(ConfigError::Missing("smtp.from").into());
            }
            for (field, address) in [("smtp.from", &self.smtp.from), ("email_to", &self.email_to)] {
                address
                    .trim()
                    .parse::<Mailbox>()
                    .map_err(|e| ConfigError::Invalid {
                        field,
                        reason: format!("'{}' 不是有效的邮件地址: {}", address, e),
                    })?;
            }
        }
        debug!("配置检查通过: {:?}", self.filter);
        Ok(())
    }
}

struct EnvVars<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> EnvVars<'_, F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, name: &str) -> AppResult<Option<T>> {
        match self.string(name) {
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| parse_failed(name, &v, std::any::type_name::<T>()).into()),
            None => Ok(None),
        }
    }

    fn flag(&self, name: &str) -> AppResult<Option<bool>> {
        match self.string(name) {
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(parse_failed(name, &v, "bool").into()),
            },
            None => Ok(None),
        }
    }
}

fn parse_failed(var_name: &str, value: &str, expected_type: &str) -> ConfigError {
    ConfigError::EnvVarParseFailed {
        var_name: var_name.to_string(),
        value: value.to_string(),
        expected_type: expected_type.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_defaults() {
        let env = vars(&[
            ("MIN_NUMBER", "1877"),
            ("MAX_NUMBER", "1900"),
            ("FILTER_FIELD", "year"),
            ("DRY_RUN", "false"),
            ("HEADLESS", "TRUE"),
            ("DISPATCH_MODE", "mail"),
            ("EMAIL_TO", "archief@example.org"),
        ]);
        let mut config = Config::default();
        config.apply_vars(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.filter, FilterRange::new(FilterField::Year, 1877, 1900));
        assert!(!config.dry_run);
        assert!(config.headless);
        assert_eq!(config.dispatch_mode, DispatchMode::Mail);
        assert_eq!(config.email_to, "archief@example.org");
        // 未设置的保持默认
        assert_eq!(config.state_file, "processed_ids.json");
    }

    #[test]
    fn test_env_parse_failure_is_reported() {
        let env = vars(&[("MIN_NUMBER", "abc")]);
        let mut config = Config::default();
        let err = config.apply_vars(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::EnvVarParseFailed { ref var_name, .. }) if var_name == "MIN_NUMBER"
        ));
    }

    #[test]
    fn test_toml_partial_config() {
        let config = Config::from_toml_str(
            r#"
            email_to = "archief@example.org"
            dispatch_mode = "mail"

            [filter]
            min = 10
            max = 20

            [smtp]
            from = "sender@example.org"
            "#,
            "test.toml",
        )
        .unwrap();

        assert_eq!(config.filter.min, 10);
        assert_eq!(config.filter.field, FilterField::Number);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.from, "sender@example.org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = Config {
            email_to: "archief@example.org".to_string(),
            ..Default::default()
        };
        config.filter = FilterRange::new(FilterField::Number, 500, 400);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_recipient() {
        assert!(matches!(
            Config::default().validate(),
            Err(AppError::Config(ConfigError::Missing("email_to")))
        ));
    }

    #[test]
    fn test_mail_mode_requires_sender() {
        let config = Config {
            email_to: "archief@example.org".to_string(),
            dispatch_mode: DispatchMode::Mail,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(ConfigError::Missing("smtp.from")))
        ));
    }

    #[test]
    fn test_mail_mode_rejects_unparsable_addresses() {
        let mut config = Config {
            email_to: "archief@example.org".to_string(),
            dispatch_mode: DispatchMode::Mail,
            ..Default::default()
        };
        config.smtp.from = "geen adres".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(ConfigError::Invalid { field: "smtp.from", .. }))
        ));

        config.smtp.from = "sender@example.org".to_string();
        config.email_to = "archief at example".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(ConfigError::Invalid { field: "email_to", .. }))
        ));
    }

    #[test]
    fn test_form_mode_does_not_parse_addresses() {
        let config = Config {
            email_to: "archief@example.org".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_records_config_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("archive_dispatch.toml");
        fs::write(&path, "email_to = \"archief@example.org\"\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert_eq!(config.email_to, "archief@example.org");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::FileReadFailed { .. })));
    }
}
