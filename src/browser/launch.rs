use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use tracing::{debug, error, info};

use crate::browser::spawn_handler;
use crate::config::Config;
use crate::error::{AppResult, BrowserError};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/124.0.0.0 Safari/537.36";

/// 启动浏览器（无头或有界面）
pub async fn launch_browser(config: &Config) -> AppResult<(Browser, Page)> {
    info!(
        "🚀 启动浏览器 ({})...",
        if config.headless { "无头模式" } else { "有界面" }
    );

    let mut builder = BrowserConfig::builder()
        .viewport(None)
        .window_size(1400, 920)
        .args(vec![
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            format!("--user-agent={}", USER_AGENT),
        ]);
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = &config.chrome_executable {
        debug!("浏览器路径: {}", path);
        builder = builder.chrome_executable(Path::new(path));
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        BrowserError::LaunchFailed(e)
    })?;

    let (browser, handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        BrowserError::LaunchFailed(e.to_string())
    })?;
    debug!("浏览器启动成功");

    spawn_handler(handler).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        BrowserError::PageCreationFailed { source: e }
    })?;

    Ok((browser, page))
}
