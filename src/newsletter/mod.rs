//! Newsletter module for HNTLDR.
//!
//! Renders the weekly top-stories email and delivers it to every active
//! subscriber, each copy carrying the recipient's own unsubscribe link.

mod job;
mod mailer;
mod template;

pub use job::{clean_subject, NewsletterJob, NewsletterReport, MAX_SUBJECT_CHARS};
pub use mailer::{Mailer, SmtpMailer};
pub use template::{personalize, render_newsletter, UNSUBSCRIBE_PLACEHOLDER};
