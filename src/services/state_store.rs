//! 处理状态存储 - 业务能力层
//!
//! 标识 → 是否已处理。启动时读取一次，每次成功发送后整体重写。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// 处理状态存储
///
/// 单写者；文件内容是格式化的 JSON 对象，可以在两次运行之间手工编辑
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: BTreeMap<String, bool>,
}

impl StateStore {
    /// 读取状态文件
    ///
    /// 文件不存在、无法读取或内容损坏时都从空状态开始
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, bool>>(&content) {
                Ok(state) => {
                    info!("✓ 已读取状态文件 {}: {} 条记录", path.display(), state.len());
                    state
                }
                Err(e) => {
                    warn!("⚠️ 状态文件 {} 已损坏，从空状态开始: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("状态文件 {} 不存在，从空状态开始", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                warn!("⚠️ 无法读取状态文件 {}，从空状态开始: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_done(&self, id: &str) -> bool {
        self.state.get(id).copied().unwrap_or(false)
    }

    /// 标记为已处理并立即写回文件
    pub fn mark_done(&mut self, id: &str) -> AppResult<()> {
        self.state.insert(id.to_string(), true);
        self.save()
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<String, bool> {
        &self.state
    }

    fn save(&self) -> AppResult<()> {
        let io_err = |source| AppError::StateIo {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.path, content).map_err(io_err)?;
        debug!("状态已保存: {} 条记录", self.state.len());
        Ok(())
    }
}
