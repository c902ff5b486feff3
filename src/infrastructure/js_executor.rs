//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"和"有限时间内等待 JS 条件成立"的能力

use async_trait::async_trait;
use chromiumoxide::Page;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 执行页面脚本的能力
///
/// `JsExecutor` 是真实实现；业务层只依赖这个 trait
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// 打开页面
    async fn goto(&self, url: &str) -> AppResult<()>;

    /// 执行 JS 代码并返回 JSON 结果，脚本没有返回值时得到 `Null`
    async fn eval(&self, js_code: String) -> AppResult<JsonValue>;

    /// 反复执行 JS 代码，直到结果可用或超时
    ///
    /// 执行过程中的脚本错误（例如页面正在跳转）不会中断等待
    async fn wait_until(&self, what: &str, js_code: &str, limit: Duration) -> AppResult<JsonValue> {
        let deadline = Instant::now() + limit;
        loop {
            match self.eval(js_code.to_string()).await {
                Ok(value) if is_truthy(&value) => return Ok(value),
                Ok(_) => {}
                Err(e) => debug!("等待 {} 时脚本出错: {}", what, e),
            }
            if Instant::now() >= deadline {
                return Err(AppError::timeout(what, limit.as_millis() as u64));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() / wait_until() 能力
/// - 不认识目录条目
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
    eval_timeout: Duration,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page, eval_timeout: Duration) -> Self {
        Self { page, eval_timeout }
    }
}

#[async_trait]
impl ScriptRunner for JsExecutor {
    async fn goto(&self, url: &str) -> AppResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AppError::navigation(url, e.to_string()))?;
        Ok(())
    }

    async fn eval(&self, js_code: String) -> AppResult<JsonValue> {
        let result = timeout(self.eval_timeout, self.page.evaluate(js_code))
            .await
            .map_err(|_| AppError::timeout("脚本执行", self.eval_timeout.as_millis() as u64))??;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }
}

/// 等待类脚本的结果是否可用
///
/// 与 JS 的真值规则一致，只有空数组例外：列表尚未渲染时脚本返回 `[]`
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(_) => true,
    }
}
