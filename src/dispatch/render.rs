//! Turning a devlog into a Slack message.

use chrono::{DateTime, FixedOffset, Utc};

use crate::models::{Devlog, ProjectId};
use crate::sink::Message;

/// Public page for a project.
const PROJECT_URL: &str = "https://flavortown.hackclub.com/projects";

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Spell out a duration as days, hours and minutes, omitting zero parts.
///
/// Leftover seconds are dropped, so anything under a minute renders as an
/// empty string.
pub fn humanize_duration(seconds: u64) -> String {
    let parts = [
        (seconds / DAY, "day"),
        ((seconds % DAY) / HOUR, "hour"),
        ((seconds % HOUR) / MINUTE, "minute"),
    ];

    parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| {
            if *n == 1 {
                format!("{} {}", n, unit)
            } else {
                format!("{} {}s", n, unit)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Short US-style date and time, e.g. `1/5/25, 3:04 PM`, in the given zone.
pub fn format_timestamp(at: DateTime<Utc>, offset: &FixedOffset) -> String {
    at.with_timezone(offset)
        .format("%-m/%-d/%y, %-I:%M %p")
        .to_string()
}

/// Build the Block Kit notification for one devlog.
pub fn render_devlog(
    project_id: ProjectId,
    title: &str,
    devlog: &Devlog,
    offset: &FixedOffset,
) -> Message {
    let title = escape_mrkdwn(title);
    let header = format!(
        ":shipitparrot: <{}/{}|{}> got a new devlog posted! :shipitparrot:",
        PROJECT_URL, project_id, title
    );
    let context = format!(
        "Devlog created at {} and took {}.",
        format_timestamp(devlog.created_at, offset),
        humanize_duration(devlog.duration_seconds)
    );

    let blocks = serde_json::json!([
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": header }
        },
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": quote(&escape_mrkdwn(&devlog.body)) }
        },
        { "type": "divider" },
        {
            "type": "context",
            "elements": [{ "type": "mrkdwn", "text": context }]
        }
    ]);

    Message {
        text: format!("{} got a new devlog posted!", title),
        blocks,
    }
}

/// Escape the three characters Slack treats as control characters in mrkdwn.
pub fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Quote every line so multi-line bodies stay inside the blockquote.
fn quote(body: &str) -> String {
    if body.is_empty() {
        return ">".to_string();
    }
    body.lines()
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}
