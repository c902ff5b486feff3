//! # Archive Dispatch
//!
//! 一个用于批量请求档案馆数字化文件的 Rust 应用程序：
//! 遍历目录列表，按编号或年份过滤，把每个条目的下载链接发送到邮箱，
//! 并记录已处理的条目，中断后可以安全地重新运行。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() / wait_until() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ArchiveSite` - 点击、填写、读取页面（实现 `CatalogPage`）
//! - `Navigator` - 查找范围内的下一个条目
//! - `StateStore` - 读写 processed_ids.json
//! - `Dispatcher` / `SmtpMailer` - 表单发送或邮件发送
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个条目"的完整处理流程
//! - `ItemFlow` - 状态转换（List → DetailOpen → ShareOpen → Dispatched → List）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用生命周期和浏览器资源
//! - `orchestrator/catalog_processor` - 遍历目录、跳过已处理条目、写回状态

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::BrowserSession;
pub use config::{Config, DispatchMode};
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, ScriptRunner};
pub use models::{CatalogEntry, FilterField, FilterRange};
pub use orchestrator::{process_catalog, App, Pacing, RunStats};
pub use services::{CatalogPage, Dispatcher, Navigator, StateStore};
pub use workflow::{ItemCtx, ItemFlow, ProcessResult};
