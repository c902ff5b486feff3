//! 条目处理上下文
//!
//! 封装"我正在处理列表中第几个条目"这一信息

use std::fmt::Display;

use crate::models::CatalogEntry;

/// 条目处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    pub entry: CatalogEntry,

    /// 查询时列表中的条目总数（仅用于日志显示）
    pub total: usize,
}

impl ItemCtx {
    pub fn new(entry: CatalogEntry, total: usize) -> Self {
        Self { entry, total }
    }

    /// 状态文件中的标识
    pub fn key(&self) -> String {
        self.entry.identifier()
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}]", self.entry.index + 1, self.total)
    }
}
