//! Weekly newsletter HTML.

use chrono::Duration;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::datetime::format_utc_datetime;
use crate::digest::DigestStory;
use crate::ranking::TimeWindow;

/// Placeholder replaced with each recipient's subscriber ID.
pub const UNSUBSCRIBE_PLACEHOLDER: &str = "{{unsubscribe_id}}";

const DATE_FORMAT: &str = "%b %-d, %Y";

/// Render the newsletter body for `stories`.
///
/// The unsubscribe link carries [`UNSUBSCRIBE_PLACEHOLDER`]; fill it per
/// recipient with [`personalize`].
pub fn render_newsletter(
    stories: &[DigestStory],
    window: &TimeWindow,
    site_url: &str,
    timezone: &str,
) -> String {
    let site_url = site_url.trim_end_matches('/');
    let start = format_utc_datetime(&window.start, timezone, DATE_FORMAT);
    // The window end is exclusive; show the last day it covers.
    let last = window.end - Duration::milliseconds(1);
    let end = format_utc_datetime(&last.max(window.start), timezone, DATE_FORMAT);

    let story_rows: String = stories.iter().map(render_story).collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html dir="ltr" lang="en">
  <head>
    <meta content="text/html; charset=UTF-8" http-equiv="Content-Type" />
  </head>
  <body style="background-color:#f6f6f6;font-family:-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif">
    <div style="display:none;overflow:hidden;max-height:0">Top stories from Hacker News for the week of {start} - {end}</div>
    <table align="center" width="100%" border="0" cellPadding="0" cellSpacing="0" role="presentation" style="max-width:600px;margin:0 auto;padding:20px 0 48px;background-color:#ffffff">
      <tbody>
        <tr>
          <td>
            <h1 style="font-size:32px;font-weight:700;text-align:center;color:#000;margin:32px 0 4px">HNTLDR</h1>
            <p style="font-size:16px;margin:0 0 32px;text-align:center;color:#666666">Weekly Top Stories from Hacker News</p>
            <p style="text-align:center;margin:32px 0"><a href="{latest}" style="background-color:#f97316;border-radius:4px;color:#fff;font-size:16px;font-weight:600;text-decoration:none;padding:12px 24px;display:inline-block" target="_blank">&#9654; LISTEN TO AUDIO SUMMARY</a></p>
            <hr style="border:none;border-top:1px dashed #cccccc;margin:32px 0" />
            <h2 style="font-size:24px;font-weight:600;color:#000;margin:24px 0 16px;padding:0 24px">Top Stories This Week</h2>
{story_rows}            <hr style="border:none;border-top:1px dashed #cccccc;margin:32px 0" />
            <p style="font-size:14px;margin:8px 0;color:#666666;text-align:center">You received this email because you subscribed to HNTLDR updates.</p>
            <p style="text-align:center"><a href="{unsubscribe}" style="color:#666666;text-decoration:underline;font-size:14px" target="_blank">Unsubscribe</a></p>
          </td>
        </tr>
      </tbody>
    </table>
  </body>
</html>
"#,
        start = encode_text(&start),
        end = encode_text(&end),
        latest = encode_double_quoted_attribute(&format!("{site_url}/latest")),
        unsubscribe = format!(
            "{}?id={}",
            encode_double_quoted_attribute(&format!("{site_url}/unsubscribe")),
            UNSUBSCRIBE_PLACEHOLDER
        ),
    );
    html
}

fn render_story(story: &DigestStory) -> String {
    let row = format!(
        r#"            <div style="padding:0 24px;margin:0 0 24px">
              <a href="{url}" style="color:#000;text-decoration:none;font-size:18px;font-weight:600;display:block" target="_blank">{title}</a>
              <p style="font-size:14px;margin:8px 0 0;color:#666666">{score} points &#8226; {comments} comments</p>
              <p style="font-size:14px;margin:4px 0 0"><a href="{discussion}" style="color:#666666" target="_blank">View Discussion</a></p>
            </div>
"#,
        url = encode_double_quoted_attribute(&story.url),
        title = encode_text(&story.title),
        score = story.score,
        comments = story.descendants,
        discussion = encode_double_quoted_attribute(&story.discussion_url),
    );
    row
}

/// Fill in a recipient's unsubscribe ID.
pub fn personalize(html: &str, subscriber_id: &str) -> String {
    html.replace(
        UNSUBSCRIBE_PLACEHOLDER,
        &urlencoding::encode(subscriber_id),
    )
}
