//! 目录导航 - 业务能力层
//!
//! 只负责"找到下一个在范围内的条目"，不打开、不发送

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{CatalogEntry, FilterRange};
use crate::services::CatalogPage;

/// 下一个待处理的条目
#[derive(Debug, Clone)]
pub struct Candidate {
    pub entry: CatalogEntry,
    /// 查询时列表中的条目总数
    pub total: usize,
}

/// 目录导航
pub struct Navigator {
    range: FilterRange,
}

impl Navigator {
    pub fn new(range: FilterRange) -> Self {
        Self { range }
    }

    pub fn range(&self) -> &FilterRange {
        &self.range
    }

    /// 从 `from_index` 开始查找下一个在范围内的条目
    ///
    /// 每次调用都重新查询整个列表：导航之后旧的元素句柄不再可靠。
    /// 读到的条目少于 `from_index` 时返回 `Navigation` 错误，由调用方重试
    pub async fn next_candidate(
        &self,
        page: &dyn CatalogPage,
        from_index: usize,
    ) -> AppResult<Option<Candidate>> {
        let texts = page.entry_texts().await?;
        let total = texts.len();

        // 列表比上次短，说明页面还在重新渲染
        if total < from_index {
            return Err(AppError::navigation(
                "目录列表",
                format!("只读到 {} 个条目，上次处理到第 {} 个", total, from_index),
            ));
        }

        for (index, text) in texts.iter().enumerate().skip(from_index) {
            let entry = CatalogEntry::parse(index, text);
            if self.range.contains(&entry) {
                return Ok(Some(Candidate { entry, total }));
            }
            debug!("跳过不在范围内的条目 #{}: {}", index + 1, entry.text);
        }

        Ok(None)
    }
}
