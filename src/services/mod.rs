pub mod archive_site;
pub mod catalog_page;
pub mod dispatch;
pub mod mailer;
pub mod navigator;
pub mod state_store;

pub use archive_site::ArchiveSite;
pub use catalog_page::CatalogPage;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use mailer::{MailSender, SmtpMailer};
pub use navigator::{Candidate, Navigator};
pub use state_store::StateStore;
