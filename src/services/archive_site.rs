//! 档案馆网站 - 业务能力层
//!
//! `CatalogPage` 的真实实现：通过 `ScriptRunner`（浏览器中即 `JsExecutor`）
//! 在页面中执行脚本完成点击、填写和读取

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::{Config, DispatchMode};
use crate::error::{AppError, AppResult, DispatchError};
use crate::infrastructure::dom_scripts;
use crate::infrastructure::{JsExecutor, ScriptRunner};
use crate::models::{ElementSelector, Selectors};
use crate::services::CatalogPage;
use crate::utils::logging::truncate_text;

/// 关闭按钮、Cookie 横幅等可有可无的元素只等这么久
const OPTIONAL_WAIT: Duration = Duration::from_millis(1500);

/// 等待目录列表渲染出至少一个条目
const LISTING_WAIT: Duration = Duration::from_secs(15);

/// 启动时预览的条目数
const PREVIEW_COUNT: usize = 15;

/// 各类等待时间
#[derive(Debug, Clone, Copy)]
pub struct SiteTimeouts {
    pub navigation: Duration,
    pub click: Duration,
    pub share: Duration,
    pub settle: Duration,
    pub slow_mo: Duration,
}

impl SiteTimeouts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            navigation: Duration::from_millis(config.navigation_timeout_ms),
            click: Duration::from_millis(config.click_timeout_ms),
            share: Duration::from_millis(config.share_timeout_ms),
            settle: Duration::from_millis(config.settle_ms),
            slow_mo: Duration::from_millis(config.slow_mo_ms),
        }
    }
}

/// 档案馆网站
pub struct ArchiveSite<R: ScriptRunner = JsExecutor> {
    runner: R,
    selectors: Selectors,
    mode: DispatchMode,
    timeouts: SiteTimeouts,
}

impl<R: ScriptRunner> ArchiveSite<R> {
    pub fn new(runner: R, config: &Config) -> Self {
        Self {
            runner,
            selectors: config.selectors.clone(),
            mode: config.dispatch_mode,
            timeouts: SiteTimeouts::from_config(config),
        }
    }

    /// 打开目录列表页面，返回条目数
    ///
    /// 打开失败是致命错误；等不到任何条目时返回 0，由调用方决定如何处理
    pub async fn open_listing(&self, url: &str) -> AppResult<usize> {
        info!("📂 正在打开目录: {}", url);

        timeout(self.timeouts.navigation, self.runner.goto(url))
            .await
            .map_err(|_| AppError::timeout(format!("打开 {}", url), millis(self.timeouts.navigation)))??;
        self.wait_ready(self.timeouts.navigation).await?;

        self.dismiss_cookie_banner().await;

        // 空列表不算就绪，一直等到出现条目或超时
        let list_js = dom_scripts::list_texts(&self.selectors.list);
        let texts = match self.runner.wait_until("目录列表", &list_js, LISTING_WAIT).await {
            Ok(value) => serde_json::from_value::<Vec<String>>(value)?,
            Err(e) => {
                warn!("⚠️ 未找到目录列表，请检查 URL 或页面结构: {}", e);
                return Ok(0);
            }
        };

        info!("✓ 找到 {} 个条目，前几条:", texts.len());
        for text in texts.iter().take(PREVIEW_COUNT) {
            info!("  - {}", truncate_text(text, 80));
        }

        Ok(texts.len())
    }

    async fn dismiss_cookie_banner(&self) {
        let js = dom_scripts::click_in_viewer(None, &self.selectors.cookie_banner);
        match self.runner.wait_until("Cookie 横幅", &js, OPTIONAL_WAIT).await {
            Ok(_) => info!("✓ 已关闭 Cookie 横幅"),
            Err(_) => debug!("没有 Cookie 横幅"),
        }
    }

    /// 等待 document.readyState 变为 complete
    async fn wait_ready(&self, limit: Duration) -> AppResult<()> {
        self.runner
            .wait_until("页面加载", &dom_scripts::ready_state(), limit)
            .await?;
        Ok(())
    }

    async fn eval_as<T: DeserializeOwned>(&self, js: String) -> AppResult<T> {
        let value = self.runner.eval(js).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// 每个动作之后的固定延迟
    async fn slow_mo(&self) {
        if !self.timeouts.slow_mo.is_zero() {
            sleep(self.timeouts.slow_mo).await;
        }
    }

    fn frame(&self) -> Option<&str> {
        self.selectors.viewer_frame.as_deref()
    }

    /// 在查看器中点击元素，在 `limit` 内没有出现则超时
    async fn click_viewer(
        &self,
        what: &str,
        targets: &[ElementSelector],
        limit: Duration,
    ) -> AppResult<()> {
        let js = dom_scripts::click_in_viewer(self.frame(), targets);
        let value = self.runner.wait_until(what, &js, limit).await?;
        click_outcome(what, &value)?;
        self.slow_mo().await;
        Ok(())
    }

    async fn viewer_has(&self, targets: &[ElementSelector]) -> bool {
        let js = dom_scripts::exists_in_viewer(self.frame(), targets);
        matches!(self.eval_as::<bool>(js).await, Ok(true))
    }

    /// Download 面板未打开时点击左侧的 Download 标签
    async fn ensure_download_panel(&self) {
        let panel = std::slice::from_ref(&self.selectors.download_panel);
        if self.viewer_has(panel).await {
            return;
        }

        debug!("Download 面板未打开，尝试点击 Download 标签");
        if let Err(e) = self
            .click_viewer("Download 标签", &self.selectors.download_tab, OPTIONAL_WAIT)
            .await
        {
            debug!("未点击到 Download 标签: {}", e);
        }
    }
}

#[async_trait]
impl<R: ScriptRunner> CatalogPage for ArchiveSite<R> {
    async fn entry_texts(&self) -> AppResult<Vec<String>> {
        self.eval_as(dom_scripts::list_texts(&self.selectors.list))
            .await
    }

    async fn open_entry(&self, index: usize) -> AppResult<()> {
        let target = format!("条目 #{}", index + 1);
        let value = timeout(
            self.timeouts.click,
            self.runner
                .eval(dom_scripts::click_entry(&self.selectors.list, index)),
        )
        .await
        .map_err(|_| AppError::timeout(target.clone(), millis(self.timeouts.click)))??;
        click_outcome(&target, &value)?;

        self.wait_ready(self.timeouts.navigation).await?;
        self.slow_mo().await;
        Ok(())
    }

    async fn open_share(&self, index: usize) -> AppResult<()> {
        let js = dom_scripts::click_in_container(
            &self.selectors.list,
            index,
            &self.selectors.container,
            share_targets(&self.selectors, self.mode),
        );
        let value = self
            .runner
            .wait_until("分享 / 下载入口", &js, self.timeouts.share)
            .await?;
        click_outcome("分享 / 下载入口", &value)?;
        self.slow_mo().await;

        match self.mode {
            DispatchMode::Form => {
                self.ensure_download_panel().await;
                let js = dom_scripts::exists_in_viewer(self.frame(), &self.selectors.email_input);
                self.runner
                    .wait_until("邮箱输入框", &js, self.timeouts.share)
                    .await?;
            }
            DispatchMode::Mail => {
                let js = dom_scripts::read_in_viewer(self.frame(), &self.selectors.link_box);
                self.runner
                    .wait_until("分享链接", &js, self.timeouts.share)
                    .await?;
            }
        }
        Ok(())
    }

    async fn submit_email(&self, email: &str, dry_run: bool) -> AppResult<()> {
        let js = dom_scripts::fill_in_viewer(self.frame(), &self.selectors.email_input, email);
        let value = self
            .runner
            .wait_until("邮箱输入框", &js, self.timeouts.share)
            .await?;
        fill_outcome(&value)?;
        self.slow_mo().await;

        if dry_run {
            debug!("[DRY RUN] 跳过点击发送按钮");
            return Ok(());
        }

        self.click_viewer("发送按钮", &self.selectors.submit, self.timeouts.click)
            .await
            .map_err(submit_error)?;
        sleep(self.timeouts.settle).await;
        Ok(())
    }

    async fn read_durable_link(&self) -> AppResult<String> {
        let js = dom_scripts::read_in_viewer(self.frame(), &self.selectors.link_box);
        let value = self
            .runner
            .wait_until("分享链接", &js, self.timeouts.share)
            .await?;
        Ok(link_text(&value))
    }

    async fn close_view(&self) -> AppResult<()> {
        match self
            .click_viewer("关闭按钮", &self.selectors.close, OPTIONAL_WAIT)
            .await
        {
            Ok(()) => {
                if let Err(e) = self.wait_ready(Duration::from_secs(6)).await {
                    debug!("关闭查看器后页面未稳定: {}", e);
                }
            }
            Err(e) => {
                debug!("未找到关闭按钮 ({})，改为按 Escape", e);
                self.runner
                    .eval(dom_scripts::press_escape(self.frame()))
                    .await?;
                sleep(Duration::from_millis(300)).await;
            }
        }
        Ok(())
    }
}

/// 查看器打开入口：表单模式点缩略图，邮件模式点分享按钮
fn share_targets(selectors: &Selectors, mode: DispatchMode) -> &[ElementSelector] {
    match mode {
        DispatchMode::Form => &selectors.viewer_thumbnail,
        DispatchMode::Mail => &selectors.share_button,
    }
}

/// 点击脚本返回 `{ ok: false }` 时视为导航失败
fn click_outcome(what: &str, value: &JsonValue) -> AppResult<()> {
    match dom_scripts::failure_reason(value) {
        Some(reason) => Err(AppError::navigation(what, reason)),
        None => Ok(()),
    }
}

/// 输入框的值必须与邮箱一致
fn fill_outcome(value: &JsonValue) -> AppResult<()> {
    if value.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        return Ok(());
    }
    let reason =
        dom_scripts::failure_reason(value).unwrap_or_else(|| "邮箱未能写入输入框".to_string());
    Err(DispatchError::FormSubmitFailed(reason).into())
}

/// 发送按钮点不到属于发送失败；超时保持原样
fn submit_error(err: AppError) -> AppError {
    match err {
        AppError::Navigation { reason, .. } => DispatchError::FormSubmitFailed(reason).into(),
        other => other,
    }
}

fn link_text(value: &JsonValue) -> String {
    value.as_str().unwrap_or_default().trim().to_string()
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
