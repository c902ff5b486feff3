use thiserror::Error;

/// 应用程序错误类型
///
/// 每一类错误对应一种恢复策略：
/// - `Timeout` / `Navigation` / `Dispatch`：跳过当前条目，继续下一个
/// - `StateIo`：记录错误，继续运行（下次运行会重试该条目）
/// - `Config` / `Browser`（启动阶段）：终止运行
#[derive(Debug, Error)]
pub enum AppError {
    /// 等待超时
    #[error("等待超时: {what} ({after_ms} ms)")]
    Timeout { what: String, after_ms: u64 },

    /// 导航或点击失败
    #[error("导航失败 ({target}): {reason}")]
    Navigation { target: String, reason: String },

    /// 发送失败
    #[error("发送失败: {0}")]
    Dispatch(#[from] DispatchError),

    /// 状态文件读写失败
    #[error("状态文件写入失败 ({path}): {source}")]
    StateIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),

    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    /// 脚本返回值无法解析
    #[error("脚本返回值解析失败: {source}")]
    ResultParseFailed {
        #[source]
        source: serde_json::Error,
    },
}

/// 发送错误（表单或邮件）
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 表单提交失败
    #[error("表单提交失败: {0}")]
    FormSubmitFailed(String),

    /// 分享链接为空
    #[error("分享链接为空: {title}")]
    EmptyLink { title: String },

    /// 邮件地址无效
    #[error("邮件地址无效 ({address}): {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// 邮件构建失败
    #[error("邮件构建失败: {0}")]
    MessageBuildFailed(#[from] lettre::error::Error),

    /// 邮件发送失败
    #[error("邮件发送失败: {0}")]
    TransportFailed(#[from] lettre::transport::smtp::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// 缺少必填项
    #[error("缺少必填配置项: {0}")]
    Missing(&'static str),

    /// 配置项取值无效
    #[error("配置项 {field} 无效: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed { source: err })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::ResultParseFailed { source: err })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建超时错误
    pub fn timeout(what: impl Into<String>, after_ms: u64) -> Self {
        AppError::Timeout {
            what: what.into(),
            after_ms,
        }
    }

    /// 创建导航失败错误
    pub fn navigation(target: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Navigation {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// 是否可以跳过当前条目继续运行
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Timeout { .. }
            | AppError::Navigation { .. }
            | AppError::Dispatch(_)
            | AppError::StateIo { .. } => true,
            AppError::Browser(BrowserError::ScriptExecutionFailed { .. })
            | AppError::Browser(BrowserError::ResultParseFailed { .. }) => true,
            AppError::Browser(_) | AppError::Config(_) => false,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
