//! 条目处理流程 - 流程层
//!
//! 核心职责：定义"一个条目"的完整处理流程
//!
//! 状态顺序：
//! 1. List → DetailOpen：点击条目（失败则跳过，无需关闭）
//! 2. DetailOpen → ShareOpen：打开卡片内的分享 / 下载入口
//! 3. ShareOpen → Dispatched：填写邮箱并发送，或读取链接并发信
//! 4. → List：无论成功与否都关闭查看器

use tracing::{debug, error, info, warn};

use crate::services::{CatalogPage, DispatchOutcome, Dispatcher};
use crate::workflow::ItemCtx;

/// 单个条目在页面上的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// 停留在目录列表
    List,
    /// 条目卡片已打开
    DetailOpen,
    /// 分享 / 下载入口已打开
    ShareOpen,
    /// 已发送
    Dispatched,
}

/// 条目处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// 发送成功（包括试运行）
    Dispatched(DispatchOutcome),
    /// 条目没能打开，页面仍在列表
    Skipped,
    /// 打开后失败，已尝试关闭查看器
    Failed,
}

/// 条目处理流程
///
/// - 编排单个条目的状态转换
/// - 不持有页面资源
/// - 不读写状态文件
pub struct ItemFlow {
    dispatcher: Dispatcher,
}

impl ItemFlow {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn run(&self, page: &dyn CatalogPage, ctx: &ItemCtx) -> ProcessResult {
        let mut state = ItemState::List;

        // ========== List → DetailOpen ==========
        if let Err(e) = page.open_entry(ctx.entry.index).await {
            warn!("{}  ⚠ 无法打开条目，跳过: {}", ctx, e);
            return ProcessResult::Skipped;
        }
        transition(ctx, &mut state, ItemState::DetailOpen);

        let result = self.open_and_dispatch(page, ctx, &mut state).await;

        // ========== → List ==========
        if let Err(e) = page.close_view().await {
            error!("{}  关闭查看器失败: {}", ctx, e);
        }
        transition(ctx, &mut state, ItemState::List);

        result
    }

    async fn open_and_dispatch(
        &self,
        page: &dyn CatalogPage,
        ctx: &ItemCtx,
        state: &mut ItemState,
    ) -> ProcessResult {
        // ========== DetailOpen → ShareOpen ==========
        if let Err(e) = page.open_share(ctx.entry.index).await {
            error!("{}  ❌ 无法打开分享 / 下载入口 ({}): {}", ctx, ctx.entry, e);
            return ProcessResult::Failed;
        }
        transition(ctx, state, ItemState::ShareOpen);

        // ========== ShareOpen → Dispatched ==========
        match self.dispatcher.dispatch(page, &ctx.entry).await {
            Ok(outcome) => {
                transition(ctx, state, ItemState::Dispatched);
                match &outcome {
                    DispatchOutcome::Submitted => info!("{}  ✅ 已提交 ({})", ctx, ctx.entry),
                    DispatchOutcome::Mailed { url } => {
                        info!("{}  ✅ 已发送链接 ({}): {}", ctx, ctx.entry, url)
                    }
                    DispatchOutcome::Simulated => info!("{}  [DRY RUN] 模拟发送 ({})", ctx, ctx.entry),
                }
                ProcessResult::Dispatched(outcome)
            }
            Err(e) => {
                error!("{}  ❌ 发送失败 ({}): {}", ctx, ctx.entry, e);
                ProcessResult::Failed
            }
        }
    }
}

fn transition(ctx: &ItemCtx, state: &mut ItemState, next: ItemState) {
    debug!("{} {:?} → {:?}", ctx, state, next);
    *state = next;
}
