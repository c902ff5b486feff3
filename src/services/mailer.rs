//! 邮件发送服务 - 业务能力层
//!
//! 只负责"把一封纯文本邮件发给配置的收件人"

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::config::SmtpConfig;
use crate::error::{AppResult, DispatchError};

/// 邮件发送能力
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> AppResult<()>;
}

/// 通过 SMTP 发送
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, to: &str) -> AppResult<Self> {
        let from = parse_mailbox(&config.from)?;
        let to = parse_mailbox(to)?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        }
        .map_err(DispatchError::TransportFailed)?;

        let mut builder = builder.port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        debug!("SMTP: {}:{} (STARTTLS: {})", config.host, config.port, config.starttls);
        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, subject: &str, body: &str) -> AppResult<()> {
        let message = build_message(&self.from, &self.to, subject, body)?;
        self.transport
            .send(message)
            .await
            .map_err(DispatchError::TransportFailed)?;
        info!("📧 邮件已发送至 {}", self.to);
        Ok(())
    }
}

/// 构建纯文本邮件
pub fn build_message(from: &Mailbox, to: &Mailbox, subject: &str, body: &str) -> AppResult<Message> {
    let message = Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(DispatchError::MessageBuildFailed)?;
    Ok(message)
}

pub fn parse_mailbox(address: &str) -> AppResult<Mailbox> {
    address.trim().parse::<Mailbox>().map_err(|e| {
        DispatchError::InvalidAddress {
            address: address.to_string(),
            source: e,
        }
        .into()
    })
}
