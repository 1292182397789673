use tracing::{debug, info, info_span, warn, Instrument};

use crate::poster::{self, PostOutcome};
use crate::pr::{ChangedFile, PrError, PullRequestClient};
use crate::report::{FileOutcome, FileReport};
use crate::review::{self, ReviewModel};

pub const NO_FILES_MESSAGE: &str =
    "The code review bot found no relevant code files to analyze in this pull request.";

pub const SUMMARY_MESSAGE: &str =
    "✅ Interactive code review by Gemini complete. Please check the inline comments for feedback.";

/// Review every reviewable file of the pull request, one after the other.
///
/// Per-file model failures and rejected posts (line comments or the fallback
/// comment) are recorded in the returned outcomes and never stop the run.
/// Listing files and posting the closing comment are the only failures that
/// propagate.
///
/// An empty result means no file matched the allow-list; in that case the
/// explanatory comment is posted and no summary follows.
pub async fn run<C, M>(client: &C, model: &M) -> Result<Vec<FileReport>, PrError>
where
    C: PullRequestClient + ?Sized,
    M: ReviewModel + ?Sized,
{
    let files = client.list_changed_files().await?;
    if files.is_empty() {
        info!("no reviewable files found");
        client.post_comment(NO_FILES_MESSAGE).await?;
        return Ok(Vec::new());
    }
    info!(files = files.len(), "reviewing changed files");

    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        let span = info_span!("file", name = %file.filename, status = %file.status);
        let outcome = review_file(client, model, file).instrument(span).await;
        reports.push(FileReport {
            filename: file.filename.clone(),
            outcome,
        });
    }

    client.post_comment(SUMMARY_MESSAGE).await?;
    info!("review complete");
    Ok(reports)
}

async fn review_file<C, M>(client: &C, model: &M, file: &ChangedFile) -> FileOutcome
where
    C: PullRequestClient + ?Sized,
    M: ReviewModel + ?Sized,
{
    if file.patch.as_deref().map_or(true, |p| p.trim().is_empty()) {
        warn!("file has no patch, skipping");
        return FileOutcome::Skipped;
    }

    info!("analyzing file");
    debug!(raw_url = %file.raw_url, "sending patch to model");
    let raw = match review::request_review(model, file).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "model review failed, skipping file");
            return FileOutcome::ReviewFailed(err.to_string());
        }
    };

    match poster::post_review(client, file, &raw).await {
        PostOutcome::Fallback => FileOutcome::Fallback,
        PostOutcome::FallbackFailed => FileOutcome::FallbackFailed,
        PostOutcome::NoComments => FileOutcome::NoComments,
        PostOutcome::Posted { posted, failed } => FileOutcome::Commented { posted, failed },
    }
}
