/// How a single changed file was handled during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// No patch text (binary or oversized file); not sent to the model
    Skipped,
    /// The model call failed; nothing was posted for this file
    ReviewFailed(String),
    /// The response was not valid JSON and was posted as a PR comment
    Fallback,
    /// The response was not valid JSON and posting it as a PR comment failed
    FallbackFailed,
    /// The model had no feedback
    NoComments,
    /// Line comments were attempted
    Commented { posted: usize, failed: usize },
}

impl std::fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOutcome::Skipped => write!(f, "skipped (no patch)"),
            FileOutcome::ReviewFailed(reason) => write!(f, "review failed: {}", reason),
            FileOutcome::Fallback => write!(f, "invalid JSON, raw response posted"),
            FileOutcome::FallbackFailed => write!(f, "invalid JSON, raw response could not be posted"),
            FileOutcome::NoComments => write!(f, "no comments"),
            FileOutcome::Commented { posted, failed } => {
                write!(f, "{} posted, {} failed", posted, failed)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub filename: String,
    pub outcome: FileOutcome,
}

/// Summary of one review run.
#[derive(Debug)]
pub struct RunReport {
    /// "owner/repo"
    pub repo: String,
    pub pr_number: u64,
    /// One entry per reviewable file, in review order
    pub files: Vec<FileReport>,
    /// Line comments posted across all files
    pub posted: usize,
    /// Line comments rejected or skipped across all files
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(FileOutcome::NoComments.to_string(), "no comments");
        assert_eq!(
            FileOutcome::Commented { posted: 2, failed: 1 }.to_string(),
            "2 posted, 1 failed"
        );
        assert_eq!(
            FileOutcome::ReviewFailed("timeout".to_string()).to_string(),
            "review failed: timeout"
        );
    }
}
