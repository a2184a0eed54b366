//! Weekly newsletter job.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::mailer::Mailer;
use super::template::{personalize, render_newsletter};
use crate::config::{DigestConfig, GenerationConfig, MailConfig};
use crate::datetime::week_number;
use crate::db::Database;
use crate::digest::{resolve_stories, strip_quotes, CompletionRequest, DigestStory, TextGenerator};
use crate::ranking::{RankingRepository, StorySource, TimeWindow};
use crate::subscriber::SubscriberRepository;
use crate::{HntldrError, Result};

/// Maximum subject line length, in characters, before the issue prefix.
pub const MAX_SUBJECT_CHARS: usize = 50;

/// Outcome of one newsletter send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterReport {
    pub week_number: u32,
    /// Full subject line as sent.
    pub subject: String,
    /// Active subscribers at send time.
    pub recipients: usize,
    /// Sends that failed.
    pub failures: usize,
}

/// Sends the weekly top stories to every active subscriber.
pub struct NewsletterJob {
    db: Arc<Database>,
    source: Arc<dyn StorySource>,
    generator: Arc<dyn TextGenerator>,
    mailer: Arc<dyn Mailer>,
    edit_model: String,
    site_url: String,
    timezone: String,
    story_count: usize,
}

impl NewsletterJob {
    /// Create a job from its collaborators.
    pub fn new(
        db: Arc<Database>,
        source: Arc<dyn StorySource>,
        generator: Arc<dyn TextGenerator>,
        mailer: Arc<dyn Mailer>,
        generation: &GenerationConfig,
        digest: &DigestConfig,
        mail: &MailConfig,
    ) -> Self {
        Self {
            db,
            source,
            generator,
            mailer,
            edit_model: generation.edit_model.clone(),
            site_url: mail.site_url.clone(),
            timezone: digest.timezone.clone(),
            story_count: digest.weekly_story_count,
        }
    }

    /// Send the newsletter covering `window`.
    ///
    /// Individual delivery failures are logged and counted, not fatal.
    pub async fn run(&self, window: TimeWindow) -> Result<NewsletterReport> {
        let candidates = RankingRepository::new(self.db.pool())
            .select_top(&window, self.story_count)
            .await?;
        if candidates.is_empty() {
            return Err(HntldrError::Validation(
                "no ranked stories in window".to_string(),
            ));
        }

        let stories = resolve_stories(self.source.as_ref(), &candidates).await?;
        let week = week_number(&window.start, &self.timezone);
        let subject = format!(
            "HNTLDR Weekly #{}: {}",
            week,
            self.generate_subject(&stories).await?
        );

        let html = render_newsletter(&stories, &window, &self.site_url, &self.timezone);
        let subscribers = SubscriberRepository::new(self.db.pool())
            .list_active()
            .await?;

        info!(
            week,
            recipients = subscribers.len(),
            "Sending newsletter \"{}\"",
            subject
        );

        let mut failures = 0;
        for subscriber in &subscribers {
            let body = personalize(&html, &subscriber.id);
            if let Err(e) = self.mailer.send(&subscriber.email, &subject, &body).await {
                warn!("Newsletter delivery to {} failed: {}", subscriber.email, e);
                failures += 1;
            }
        }

        let report = NewsletterReport {
            week_number: week,
            subject,
            recipients: subscribers.len(),
            failures,
        };
        info!(
            "Newsletter #{} sent to {} of {} subscribers",
            report.week_number,
            report.recipients - report.failures,
            report.recipients
        );
        Ok(report)
    }

    async fn generate_subject(&self, stories: &[DigestStory]) -> Result<String> {
        let listing = stories
            .iter()
            .map(|s| format!("{} ({} points, {} comments)", s.title, s.score, s.descendants))
            .collect::<Vec<_>>()
            .join("\n");

        let raw = self
            .generator
            .complete(
                CompletionRequest::new(
                    &self.edit_model,
                    format!(
                        "You write newsletter subject lines. Write one short, engaging subject \
                         line (at most {MAX_SUBJECT_CHARS} characters) capturing the most \
                         interesting theme of this week's top Hacker News stories. Reply with \
                         the subject line only."
                    ),
                    format!("This week's top stories:\n{listing}"),
                )
                .with_max_tokens(50)
                .with_temperature(0.7),
            )
            .await?;

        Ok(clean_subject(&raw))
    }
}

/// Remove quotes and cap the subject length.
pub fn clean_subject(raw: &str) -> String {
    let unquoted: String = strip_quotes(raw).chars().filter(|&c| c != '"').collect();
    let trimmed = unquoted.trim();
    if trimmed.chars().count() <= MAX_SUBJECT_CHARS {
        return trimmed.to_string();
    }
    trimmed
        .chars()
        .take(MAX_SUBJECT_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_subject_strips_quotes() {
        assert_eq!(clean_subject("\"AI Everywhere\""), "AI Everywhere");
        assert_eq!(clean_subject("The \"Rust\" Week"), "The Rust Week");
    }

    #[test]
    fn test_clean_subject_caps_length() {
        let long = "word ".repeat(30);
        let subject = clean_subject(&long);
        assert!(subject.chars().count() <= MAX_SUBJECT_CHARS);
        assert!(!subject.ends_with(' '));
    }
}
