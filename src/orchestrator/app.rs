//! 应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：检查配置、创建发送流程、启动或连接浏览器、创建 ArchiveSite
//! 2. **资源管理**：持有 Browser，确保生命周期正确
//! 3. **流程调度**：打开目录、读取状态、委托 catalog_processor 遍历条目
//! 4. **全局统计**：输出本次运行的结果

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::browser::BrowserSession;
use crate::config::{Config, DispatchMode};
use crate::error::AppResult;
use crate::infrastructure::JsExecutor;
use crate::orchestrator::catalog_processor::{process_catalog, Pacing, RunStats};
use crate::services::{ArchiveSite, Dispatcher, Navigator, SmtpMailer, StateStore};
use crate::utils::logging;
use crate::workflow::ItemFlow;

/// 应用主结构
pub struct App {
    config: Config,
    flow: ItemFlow,
    session: BrowserSession,
    site: ArchiveSite,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;
        logging::log_startup(&config);

        // 邮件发送器在启动浏览器之前创建，地址或 SMTP 配置有误时尽早失败
        let flow = ItemFlow::new(dispatcher(&config)?);

        let session = BrowserSession::open(&config).await?;

        // 单次脚本执行的上限，等待类操作另有各自的超时
        let eval_timeout = Duration::from_millis(config.click_timeout_ms.max(5_000));
        let executor = JsExecutor::new(session.page.clone(), eval_timeout);
        let site = ArchiveSite::new(executor, &config);

        Ok(Self {
            config,
            flow,
            session,
            site,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> AppResult<RunStats> {
        let result = self.process().await;
        self.shutdown().await;
        result
    }

    async fn process(&self) -> AppResult<RunStats> {
        let mut state = StateStore::load(&self.config.state_file);

        let count = self.site.open_listing(&self.config.start_url).await?;
        if count == 0 {
            warn!("⚠️ 目录列表为空，程序结束");
            return Ok(RunStats::default());
        }

        let navigator = Navigator::new(self.config.filter);
        let pacing = Pacing {
            pause_between: Duration::from_millis(self.config.pause_between_ms),
            requery_delay: Duration::from_millis(self.config.settle_ms),
        };

        let stats = process_catalog(&self.site, &navigator, &mut state, &self.flow, pacing).await?;

        logging::print_final_stats(&stats, state.path());
        Ok(stats)
    }

    /// 关闭由本程序启动的浏览器；连接的浏览器保持打开
    async fn shutdown(mut self) {
        if !self.session.launched {
            debug!("浏览器由外部启动，保持打开");
            return;
        }

        info!("正在关闭浏览器...");
        if let Err(e) = self.session.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
            return;
        }
        if let Err(e) = self.session.browser.wait().await {
            debug!("等待浏览器退出失败: {}", e);
        }
    }
}

fn dispatcher(config: &Config) -> AppResult<Dispatcher> {
    match config.dispatch_mode {
        DispatchMode::Form => Ok(Dispatcher::form(&config.email_to, config.dry_run)),
        DispatchMode::Mail => {
            let mailer = SmtpMailer::new(&config.smtp, &config.email_to)?;
            Ok(Dispatcher::mail(Box::new(mailer), config.dry_run))
        }
    }
}
