//! 命令行参数
//!
//! 没有子命令；参数覆盖配置文件和环境变量中的同名配置

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, DispatchMode};
use crate::models::FilterField;

#[derive(Debug, Parser)]
#[command(
    name = "archive_dispatch",
    version,
    about = "按编号或年份批量请求档案馆数字化文件，并把下载链接发送到邮箱"
)]
pub struct Cli {
    /// 配置文件（TOML）
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// 范围下限（包含）
    #[arg(long)]
    pub min: Option<i64>,

    /// 范围上限（包含）
    #[arg(long)]
    pub max: Option<i64>,

    /// 按年份而不是开头的编号过滤
    #[arg(long)]
    pub by_year: bool,

    /// 试运行：不点击发送，也不发信
    #[arg(long, conflicts_with = "send")]
    pub dry_run: bool,

    /// 真正发送（关闭试运行）
    #[arg(long)]
    pub send: bool,

    /// 无头模式
    #[arg(long)]
    pub headless: bool,

    /// 发送方式
    #[arg(long, value_name = "form|mail")]
    pub mode: Option<DispatchMode>,

    /// 状态文件
    #[arg(long, value_name = "PATH")]
    pub state_file: Option<String>,

    /// 显示详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 把命令行参数叠加到配置上
    pub fn apply(&self, config: &mut Config) {
        if let Some(min) = self.min {
            config.filter.min = min;
        }
        if let Some(max) = self.max {
            config.filter.max = max;
        }
        if self.by_year {
            config.filter.field = FilterField::Year;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.send {
            config.dry_run = false;
        }
        if self.headless {
            config.headless = true;
        }
        if let Some(mode) = self.mode {
            config.dispatch_mode = mode;
        }
        if let Some(path) = &self.state_file {
            config.state_file = path.clone();
        }
        if self.verbose {
            config.verbose_logging = true;
        }
    }
}
