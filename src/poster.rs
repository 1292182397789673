use std::collections::BTreeSet;

use tracing::{debug, info, instrument, warn};

use crate::pr::{diff, ChangedFile, PullRequestClient};
use crate::review::ReviewComment;

/// GitHub rejects comment bodies longer than this many characters.
pub const MAX_COMMENT_CHARS: usize = 65_536;

const TRUNCATION_NOTE: &str = "\n\n[response truncated]";

/// What happened when a file's review was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// The response was not a JSON array; the raw text was posted as a PR comment.
    Fallback,
    /// The response was not a JSON array and the fallback comment was rejected.
    FallbackFailed,
    /// The model returned `[]`.
    NoComments,
    /// Line comments were attempted; `failed` of them were rejected.
    Posted { posted: usize, failed: usize },
}

/// PR comment carrying a response that could not be parsed.
/// The raw text is cut so the body stays within [`MAX_COMMENT_CHARS`].
pub fn fallback_message(filename: &str, raw: &str) -> String {
    let header = format!(
        "Error: the AI did not return valid JSON for file {}. Raw response:\n\n",
        filename
    );
    let header_chars = header.chars().count();
    let mut body = header;

    if header_chars + raw.chars().count() <= MAX_COMMENT_CHARS {
        body.push_str(raw);
        return body;
    }

    let budget = MAX_COMMENT_CHARS
        .saturating_sub(header_chars)
        .saturating_sub(TRUNCATION_NOTE.chars().count());
    let cut = raw.char_indices().nth(budget).map_or(raw.len(), |(i, _)| i);
    body.push_str(&raw[..cut]);
    body.push_str(TRUNCATION_NOTE);
    body
}

/// Publish the model's review of `file` on the pull request.
///
/// Each entry of the JSON array becomes one line comment at the head commit.
/// Every post is best effort: a rejected comment, including the fallback
/// comment, is logged and reported in the outcome, never returned as an error.
#[instrument(skip(client, file, raw), fields(file = %file.filename))]
pub async fn post_review<C>(client: &C, file: &ChangedFile, raw: &str) -> PostOutcome
where
    C: PullRequestClient + ?Sized,
{
    let entries = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "model response is not a JSON array, posting raw text");
            let message = fallback_message(&file.filename, raw);
            return match client.post_comment(&message).await {
                Ok(()) => PostOutcome::Fallback,
                Err(err) => {
                    warn!(error = %err, "failed to post fallback comment");
                    PostOutcome::FallbackFailed
                }
            };
        }
    };

    if entries.is_empty() {
        info!("no comments for this file");
        return PostOutcome::NoComments;
    }

    let commentable = match file.patch.as_deref().map(diff::commentable_lines) {
        Some(Ok(lines)) => Some(lines),
        Some(Err(err)) => {
            warn!(error = %err, "could not parse patch, line numbers will not be checked");
            None
        }
        None => Some(BTreeSet::new()),
    };

    let commit_id = client.head_sha();
    let mut posted = 0;
    let mut failed = 0;

    for (index, entry) in entries.into_iter().enumerate() {
        let comment = match serde_json::from_value::<ReviewComment>(entry) {
            Ok(comment) => comment,
            Err(err) => {
                warn!(index, error = %err, "skipping malformed review entry");
                failed += 1;
                continue;
            }
        };

        let in_diff = commentable
            .as_ref()
            .map_or(true, |lines| lines.contains(&comment.line_number));
        if !in_diff {
            warn!(
                line = comment.line_number,
                "line is outside the commentable range of the diff, skipping"
            );
            failed += 1;
            continue;
        }

        match client
            .post_line_comment(&file.filename, commit_id, comment.line_number, &comment.comment)
            .await
        {
            Ok(()) => {
                info!(line = comment.line_number, critical = comment.is_critical, "posted comment");
                posted += 1;
            }
            Err(err) => {
                warn!(line = comment.line_number, error = %err, "failed to post comment");
                failed += 1;
            }
        }
    }

    debug!(posted, failed, "finished posting file review");
    PostOutcome::Posted { posted, failed }
}
