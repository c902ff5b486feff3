//! 发送服务 - 业务能力层
//!
//! 两种互斥的发送方式：
//! - 表单：在查看器中填写邮箱并点击发送，由档案馆网站发信
//! - 邮件：读取永久链接，自己通过 SMTP 发信

use tracing::info;

use crate::config::DispatchMode;
use crate::error::{AppResult, DispatchError};
use crate::models::CatalogEntry;
use crate::services::{CatalogPage, MailSender};

/// 一次发送的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 表单已提交
    Submitted,
    /// 链接已通过邮件发送
    Mailed { url: String },
    /// 试运行，没有真正发送
    Simulated,
}

enum Strategy {
    Form {
        email_to: String,
    },
    Mail {
        mailer: Box<dyn MailSender>,
    },
}

/// 发送服务
pub struct Dispatcher {
    strategy: Strategy,
    dry_run: bool,
}

impl Dispatcher {
    /// 通过网站表单发送
    pub fn form(email_to: impl Into<String>, dry_run: bool) -> Self {
        Self {
            strategy: Strategy::Form {
                email_to: email_to.into(),
            },
            dry_run,
        }
    }

    /// 通过邮件直接发送
    pub fn mail(mailer: Box<dyn MailSender>, dry_run: bool) -> Self {
        Self {
            strategy: Strategy::Mail { mailer },
            dry_run,
        }
    }

    pub fn mode(&self) -> DispatchMode {
        match self.strategy {
            Strategy::Form { .. } => DispatchMode::Form,
            Strategy::Mail { .. } => DispatchMode::Mail,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// 发送当前打开的条目
    ///
    /// 调用前分享 / 下载入口必须已经打开
    pub async fn dispatch(
        &self,
        page: &dyn CatalogPage,
        entry: &CatalogEntry,
    ) -> AppResult<DispatchOutcome> {
        match &self.strategy {
            Strategy::Form { email_to } => {
                page.submit_email(email_to, self.dry_run).await?;
                if self.dry_run {
                    Ok(DispatchOutcome::Simulated)
                } else {
                    Ok(DispatchOutcome::Submitted)
                }
            }
            Strategy::Mail { mailer } => {
                let url = page.read_durable_link().await?;
                if url.trim().is_empty() {
                    return Err(DispatchError::EmptyLink {
                        title: entry.text.clone(),
                    }
                    .into());
                }

                let body = mail_body(&entry.text, &url);
                if self.dry_run {
                    info!("[DRY RUN] 邮件未发送: {} → {}", entry.text, url);
                    return Ok(DispatchOutcome::Simulated);
                }

                mailer.send(&entry.text, &body).await?;
                Ok(DispatchOutcome::Mailed { url })
            }
        }
    }
}

/// 邮件正文：标题 + 空行 + 链接
pub fn mail_body(title: &str, url: &str) -> String {
    format!("{}\n\n{}", title, url.trim())
}
