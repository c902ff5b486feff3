//! 目录处理器 - 编排层
//!
//! ## 职责
//!
//! 遍历目录中所有在范围内的条目，跳过已处理的，委托 `ItemFlow` 处理其余条目，
//! 并在每次成功发送后立即写回状态文件。
//!
//! 状态文件写入失败不会中断运行：该条目下次运行时会被重试。
//! 两个条目之间重新读取列表失败时，有限次重试；仍然失败则提前结束并保留已有统计。

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::AppResult;
use crate::services::{CatalogPage, Candidate, DispatchOutcome, Navigator, StateStore};
use crate::utils::logging;
use crate::workflow::{ItemCtx, ItemFlow, ProcessResult};

/// 重新读取列表的最多尝试次数
const REQUERY_ATTEMPTS: usize = 3;

/// 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// 在范围内的条目数
    pub matched: usize,
    /// 之前已处理、本次跳过的条目数
    pub already_done: usize,
    /// 本次发送成功的条目数
    pub dispatched: usize,
    /// 试运行中模拟发送的条目数
    pub simulated: usize,
    /// 无法打开的条目数
    pub skipped: usize,
    /// 打开后失败的条目数
    pub failed: usize,
    /// 本次发送成功的标识
    pub dispatched_ids: Vec<String>,
    /// 列表多次读取失败，没有遍历完
    pub interrupted: bool,
}

impl RunStats {
    /// 本次尝试处理的条目数
    pub fn attempted(&self) -> usize {
        self.dispatched + self.simulated + self.skipped + self.failed
    }
}

/// 处理节奏
#[derive(Debug, Default, Clone, Copy)]
pub struct Pacing {
    /// 两个条目之间的停顿
    pub pause_between: Duration,
    /// 重新读取列表失败后，下一次尝试之前的等待
    pub requery_delay: Duration,
}

/// 处理整个目录
///
/// # 参数
/// - `page`: 目录页面
/// - `navigator`: 过滤范围
/// - `state`: 处理状态
/// - `flow`: 单个条目的处理流程
/// - `pacing`: 停顿与重试等待
///
/// 只有不可恢复的错误会返回 `Err`，返回前先输出已有统计
pub async fn process_catalog(
    page: &dyn CatalogPage,
    navigator: &Navigator,
    state: &mut StateStore,
    flow: &ItemFlow,
    pacing: Pacing,
) -> AppResult<RunStats> {
    let dispatcher = flow.dispatcher();
    debug!(
        "开始遍历: {} | 方式: {:?} | DRY_RUN={} | 已处理 {} 条",
        navigator.range(),
        dispatcher.mode(),
        dispatcher.is_dry_run(),
        state.len()
    );

    let mut stats = RunStats::default();
    let mut next_index = 0;

    loop {
        let candidate = match requery(page, navigator, next_index, pacing.requery_delay).await {
            Ok(Some(candidate)) => candidate,
            Ok(None) => break,
            Err(e) if e.is_recoverable() => {
                error!("❌ 目录列表多次读取失败，提前结束本次运行: {}", e);
                stats.interrupted = true;
                break;
            }
            Err(e) => {
                error!("❌ 目录列表不可用: {}", e);
                logging::print_final_stats(&stats, state.path());
                return Err(e);
            }
        };
        next_index = candidate.entry.index + 1;
        stats.matched += 1;

        let ctx = ItemCtx::new(candidate.entry, candidate.total);
        let key = ctx.key();

        if state.is_done(&key) {
            info!("{} {} 已处理，跳过", ctx, ctx.entry);
            stats.already_done += 1;
            continue;
        }

        info!("{} 正在处理 {}", ctx, ctx.entry);

        match flow.run(page, &ctx).await {
            ProcessResult::Dispatched(DispatchOutcome::Simulated) => {
                stats.simulated += 1;
            }
            ProcessResult::Dispatched(_) => {
                stats.dispatched += 1;
                stats.dispatched_ids.push(key.clone());
                if let Err(e) = state.mark_done(&key) {
                    error!("{}  状态未能保存，下次运行将重试: {}", ctx, e);
                }
            }
            ProcessResult::Skipped => stats.skipped += 1,
            ProcessResult::Failed => stats.failed += 1,
        }

        if !pacing.pause_between.is_zero() {
            sleep(pacing.pause_between).await;
        }
    }

    Ok(stats)
}

/// 重新读取列表并找到下一个条目，可恢复的错误最多重试 `REQUERY_ATTEMPTS` 次
async fn requery(
    page: &dyn CatalogPage,
    navigator: &Navigator,
    from_index: usize,
    delay: Duration,
) -> AppResult<Option<Candidate>> {
    let mut attempt = 1;
    loop {
        match navigator.next_candidate(page, from_index).await {
            Err(e) if e.is_recoverable() && attempt < REQUERY_ATTEMPTS => {
                warn!(
                    "⚠️ 读取目录失败 (第 {}/{} 次)，稍后重试: {}",
                    attempt, REQUERY_ATTEMPTS, e
                );
                attempt += 1;
                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
            result => return result,
        }
    }
}
