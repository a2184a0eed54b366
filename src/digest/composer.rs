//! Digest composition.
//!
//! Turns the ranked candidate list into a narration script, a title and the
//! structured list of cited stories.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use serde::Serialize;
use tracing::{debug, info};

use super::generator::{CompletionRequest, TextGenerator};
use super::scraper::ContentScraper;
use crate::config::{DigestConfig, GenerationConfig};
use crate::episode::{EpisodeType, NewEpisodeSource};
use crate::ranking::{StorySource, WindowedStory};
use crate::Result;

/// Stand-in text when scraping is turned off.
const SCRAPING_DISABLED: &str = "Content scraping disabled";

/// Token limit for the script and its cleanup.
const SCRIPT_MAX_TOKENS: u32 = 1500;

/// Token limit for titles.
const TITLE_MAX_TOKENS: u32 = 50;

/// A cited story with the metadata needed for narration and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestStory {
    pub story_id: i64,
    pub title: String,
    /// External link, or the discussion page for text posts.
    pub url: String,
    pub discussion_url: String,
    /// Best score observed in the window.
    pub score: i64,
    pub by: String,
    /// Comment count.
    pub descendants: i64,
}

impl DigestStory {
    /// Convert into an episode source row.
    pub fn to_source(&self) -> NewEpisodeSource {
        NewEpisodeSource {
            story_id: Some(self.story_id),
            url: self.url.clone(),
            title: self.title.clone(),
            points: self.score,
            comments_count: self.descendants,
        }
    }
}

/// Output of a composition: what gets narrated and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDigest {
    /// Teleprompter-ready narration script.
    pub summary: String,
    pub title: String,
    pub stories: Vec<DigestStory>,
}

/// Fetch full metadata for every candidate, keeping candidate order.
///
/// Fails if any single lookup fails.
pub async fn resolve_stories(
    source: &dyn StorySource,
    candidates: &[WindowedStory],
) -> Result<Vec<DigestStory>> {
    let items = try_join_all(candidates.iter().map(|c| source.story(c.story_id))).await?;

    Ok(candidates
        .iter()
        .zip(items)
        .map(|(candidate, item)| DigestStory {
            story_id: candidate.story_id,
            title: item.display_title(),
            url: item.link(),
            discussion_url: item.discussion_url(),
            score: candidate.score,
            by: item.by.clone().unwrap_or_else(|| "anonymous".to_string()),
            descendants: item.descendants,
        })
        .collect())
}

/// Strip surrounding whitespace and quote characters from generated text.
pub fn strip_quotes(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’') || c.is_whitespace())
        .to_string()
}

/// Builds narration scripts from ranked stories.
pub struct DigestComposer {
    source: Arc<dyn StorySource>,
    generator: Arc<dyn TextGenerator>,
    scraper: Option<ContentScraper>,
    script_model: String,
    edit_model: String,
    host_name: String,
}

impl DigestComposer {
    /// Create a composer. Scraping is skipped when `scraper` is `None`.
    pub fn new(
        source: Arc<dyn StorySource>,
        generator: Arc<dyn TextGenerator>,
        scraper: Option<ContentScraper>,
        generation: &GenerationConfig,
        digest: &DigestConfig,
    ) -> Self {
        Self {
            source,
            generator,
            scraper,
            script_model: generation.script_model.clone(),
            edit_model: generation.edit_model.clone(),
            host_name: digest.host_name.clone(),
        }
    }

    /// Compose a digest for the candidates, in their given order.
    pub async fn compose(
        &self,
        episode_type: EpisodeType,
        candidates: &[WindowedStory],
    ) -> Result<ComposedDigest> {
        let stories = resolve_stories(self.source.as_ref(), candidates).await?;
        debug!("Resolved metadata for {} stories", stories.len());

        let contents = match &self.scraper {
            Some(scraper) => join_all(stories.iter().map(|s| scraper.scrape(&s.url))).await,
            None => vec![SCRAPING_DISABLED.to_string(); stories.len()],
        };

        let period = period_label(episode_type);
        let script = self
            .generator
            .complete(
                CompletionRequest::new(
                    &self.script_model,
                    script_system_prompt(&self.host_name, period),
                    script_user_prompt(&stories, &contents, period),
                )
                .with_max_tokens(SCRIPT_MAX_TOKENS),
            )
            .await?;

        let summary = self
            .generator
            .complete(
                CompletionRequest::new(
                    &self.edit_model,
                    format!(
                        "Reduce the text to exactly what {} says out loud, as it would appear \
                         on a teleprompter. Drop headings, stage directions, speaker labels and \
                         any commentary around the speech.",
                        self.host_name
                    ),
                    format!("### Speech\n{}", script),
                )
                .with_max_tokens(SCRIPT_MAX_TOKENS),
            )
            .await?;

        let title = self
            .generator
            .complete(
                CompletionRequest::new(
                    &self.edit_model,
                    format!(
                        "Write a short, catchy title for this {} Hacker News digest. \
                         Reflect its main themes in under 10 words. Reply with the title only.",
                        episode_type
                    ),
                    summary.clone(),
                )
                .with_max_tokens(TITLE_MAX_TOKENS),
            )
            .await?;
        let title = strip_quotes(&title);

        info!(title = %title, stories = stories.len(), "Composed {} digest", episode_type);

        Ok(ComposedDigest {
            summary,
            title,
            stories,
        })
    }
}

fn period_label(episode_type: EpisodeType) -> &'static str {
    match episode_type {
        EpisodeType::Daily => "the past 24 hours",
        EpisodeType::Weekly => "the past week",
    }
}

fn script_system_prompt(host_name: &str, period: &str) -> String {
    format!(
        "You host HNTLDR, a short podcast covering the top Hacker News stories of {period}. \
         Write a ready-to-read script in a friendly, conversational voice. Open with: \
         \"Hey everyone, welcome to HNTLDR, the podcast that gives you the top stories from \
         Hacker News, fast. I'm {host_name}.\" Give a quick overview, then walk through each \
         story with context and why it matters, using smooth transitions. Close with a short \
         recap and a sign-off."
    )
}

fn script_user_prompt(stories: &[DigestStory], contents: &[String], period: &str) -> String {
    let mut prompt = format!("Here are the top Hacker News stories of {period}:\n\n");
    for (i, (story, content)) in stories.iter().zip(contents).enumerate() {
        prompt.push_str(&format!(
            "## {}. {} ({} points, by {})\nURL: {}\nHN Discussion: {}\n\n### Content\n{}\n\n",
            i + 1,
            story.title,
            story.score,
            story.by,
            story.url,
            story.discussion_url,
            content
        ));
    }
    prompt.push_str("Write the podcast script covering these stories in this order.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::StoryItem;
    use crate::HntldrError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    struct FakeSource;

    #[async_trait]
    impl StorySource for FakeSource {
        async fn top_story_ids(&self) -> Result<Vec<i64>> {
            Ok(vec![])
        }

        async fn story(&self, id: i64) -> Result<StoryItem> {
            if id == 404 {
                return Err(HntldrError::Upstream("story 404 returned null".to_string()));
            }
            Ok(StoryItem {
                id,
                score: 1,
                time: 0,
                title: Some(format!("Story {id}")),
                url: if id % 2 == 0 {
                    Some(format!("https://example.com/{id}"))
                } else {
                    None
                },
                by: if id == 3 { None } else { Some("alice".to_string()) },
                descendants: id * 10,
            })
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            let mut requests = self.requests.lock().unwrap();
            let reply = match requests.len() {
                0 => "SCRIPT: Hey everyone...".to_string(),
                1 => "Hey everyone...".to_string(),
                _ => "  \"Rust Takes Over\"  ".to_string(),
            };
            requests.push(request);
            Ok(reply)
        }
    }

    fn candidate(story_id: i64, score: i64) -> WindowedStory {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        WindowedStory {
            story_id,
            score,
            rank: 1,
            story_time: at,
            fetched_at: at,
        }
    }

    fn composer(generator: Arc<RecordingGenerator>) -> DigestComposer {
        DigestComposer::new(
            Arc::new(FakeSource),
            generator,
            None,
            &GenerationConfig::default(),
            &DigestConfig::default(),
        )
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("  \"Hello\" "), "Hello");
        assert_eq!(strip_quotes("'Hi'"), "Hi");
        assert_eq!(strip_quotes("“Curly”"), "Curly");
        assert_eq!(strip_quotes("It's fine"), "It's fine");
    }

    #[tokio::test]
    async fn test_resolve_stories_keeps_order_and_window_score() {
        let stories = resolve_stories(&FakeSource, &[candidate(2, 300), candidate(3, 200)])
            .await
            .unwrap();

        assert_eq!(stories[0].story_id, 2);
        assert_eq!(stories[0].score, 300);
        assert_eq!(stories[0].url, "https://example.com/2");
        assert_eq!(stories[1].url, "https://news.ycombinator.com/item?id=3");
        assert_eq!(stories[1].by, "anonymous");
        assert_eq!(stories[1].descendants, 30);
    }

    #[tokio::test]
    async fn test_resolve_stories_fails_fast() {
        let result = resolve_stories(&FakeSource, &[candidate(2, 1), candidate(404, 1)]).await;
        assert!(matches!(result, Err(HntldrError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_compose_calls_generator_three_times() {
        let generator = Arc::new(RecordingGenerator::default());
        let digest = composer(generator.clone())
            .compose(EpisodeType::Daily, &[candidate(2, 300), candidate(4, 200)])
            .await
            .unwrap();

        assert_eq!(digest.summary, "Hey everyone...");
        assert_eq!(digest.title, "Rust Takes Over");
        assert_eq!(digest.stories.len(), 2);

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].model, "gpt-4o");
        assert!(requests[0].user.contains("## 1. Story 2 (300 points, by alice)"));
        assert!(requests[0].user.contains(SCRAPING_DISABLED));
        assert!(requests[0].system.contains("the past 24 hours"));
        assert_eq!(requests[1].model, "gpt-4o-mini");
        assert!(requests[1].user.contains("SCRIPT: Hey everyone..."));
        assert_eq!(requests[2].max_tokens, TITLE_MAX_TOKENS);
    }

    #[test]
    fn test_to_source() {
        let story = DigestStory {
            story_id: 1,
            title: "T".to_string(),
            url: "https://example.com".to_string(),
            discussion_url: "https://news.ycombinator.com/item?id=1".to_string(),
            score: 99,
            by: "bob".to_string(),
            descendants: 12,
        };
        let source = story.to_source();
        assert_eq!(source.points, 99);
        assert_eq!(source.comments_count, 12);
        assert_eq!(source.story_id, Some(1));
    }
}
