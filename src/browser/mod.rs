pub mod connection;
pub mod launch;

pub use connection::connect_to_browser_and_page;
pub use launch::launch_browser;

use chromiumoxide::{Browser, Handler, Page};
use futures::StreamExt;
use tokio::time::{sleep, Duration};

use crate::config::Config;
use crate::error::AppResult;

/// 浏览器会话：设置了调试端口时连接已有浏览器，否则启动新浏览器
pub struct BrowserSession {
    pub browser: Browser,
    pub page: Page,
    /// 浏览器是否由本程序启动（决定退出时是否关闭）
    pub launched: bool,
}

impl BrowserSession {
    pub async fn open(config: &Config) -> AppResult<Self> {
        match config.browser_debug_port {
            Some(port) => {
                let (browser, page) = connect_to_browser_and_page(port, Some(&config.start_url)).await?;
                Ok(Self {
                    browser,
                    page,
                    launched: false,
                })
            }
            None => {
                let (browser, page) = launch_browser(config).await?;
                Ok(Self {
                    browser,
                    page,
                    launched: true,
                })
            }
        }
    }
}

/// 在后台处理浏览器事件
pub(crate) async fn spawn_handler(mut handler: Handler) {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;
}
