use chromiumoxide::{Browser, Page};
use tracing::{debug, error, info};

use crate::browser::spawn_handler;
use crate::error::{AppResult, BrowserError};

/// 连接到已经打开调试端口的浏览器并获取页面
///
/// 如果已有页面的 URL 以 `target_url` 开头则直接复用，否则新建空白页面
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: Option<&str>,
) -> AppResult<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {:?}", target_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        BrowserError::ConnectionFailed { port, source: e }
    })?;
    debug!("浏览器连接成功");

    spawn_handler(handler).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    if let Some(url) = target_url {
        for p in pages.iter() {
            if let Ok(Some(page_url)) = p.url().await {
                debug!("检查页面: {}", page_url);
                if page_url.starts_with(url) {
                    info!("✓ 找到目标页面: {}", page_url);
                    return Ok((browser, p.clone()));
                }
            }
        }
        debug!("未找到匹配的页面，将创建新页面");
    }

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建空白页面失败: {}", e);
        BrowserError::PageCreationFailed { source: e }
    })?;

    Ok((browser, page))
}
