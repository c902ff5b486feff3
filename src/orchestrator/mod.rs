//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用
//! - 管理应用生命周期（初始化、运行、清理）
//! - 管理浏览器资源（Browser、ArchiveSite）
//! - 输出全局统计信息
//!
//! ### `catalog_processor` - 目录处理器
//! - 逐个查找范围内的条目（Navigator）
//! - 跳过已处理的条目（StateStore）
//! - 委托 ItemFlow 处理单个条目
//! - 成功后写回状态
//! - 列表暂时读不到时有限次重试
//!
//! ## 层次关系
//!
//! ```text
//! app (浏览器 + 配置)
//!     ↓
//! catalog_processor (遍历条目)
//!     ↓
//! workflow::ItemFlow (处理单个条目)
//!     ↓
//! services (能力层：navigator / dispatch / state_store / mailer)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```

pub mod app;
pub mod catalog_processor;

pub use app::App;
pub use catalog_processor::{process_catalog, Pacing, RunStats};
