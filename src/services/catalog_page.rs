//! 目录页面能力 - 业务能力层
//!
//! 流程层只通过这个 trait 操作页面，真实实现是 `ArchiveSite`

use async_trait::async_trait;

use crate::error::AppResult;

/// 目录页面
///
/// 所有按索引的操作都会重新查询列表，不持有任何元素句柄
#[async_trait]
pub trait CatalogPage: Send + Sync {
    /// 重新查询列表，返回全部条目的显示文本
    async fn entry_texts(&self) -> AppResult<Vec<String>>;

    /// 点击第 `index` 个条目，打开卡片
    async fn open_entry(&self, index: usize) -> AppResult<()>;

    /// 在第 `index` 个条目的卡片内打开分享 / 下载入口，并等待其就绪
    async fn open_share(&self, index: usize) -> AppResult<()>;

    /// 填写邮箱；`dry_run` 时不点击发送
    async fn submit_email(&self, email: &str, dry_run: bool) -> AppResult<()>;

    /// 读取只读文本框中的永久链接
    async fn read_durable_link(&self) -> AppResult<String>;

    /// 关闭查看器 / 分享框，回到列表
    async fn close_view(&self) -> AppResult<()>;
}
