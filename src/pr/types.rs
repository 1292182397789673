use serde::Deserialize;

/// A file changed by the pull request, as reported by
/// `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root (e.g., "app/views.py")
    pub filename: String,
    /// Unified diff of this file. Absent for binary or oversized files.
    #[serde(default)]
    pub patch: Option<String>,
    pub status: FileStatus,
    #[serde(default)]
    pub raw_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    /// copied, changed, unchanged
    #[serde(other)]
    Other,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Removed => write!(f, "removed"),
            FileStatus::Renamed => write!(f, "renamed"),
            FileStatus::Other => write!(f, "other"),
        }
    }
}

/// Repository coordinates parsed from `REPO_FULL_NAME`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_file_from_github_json() {
        let json = r#"{
            "sha": "bbcd538c8e72b8c175046e27cc8f907076331401",
            "filename": "app/views.py",
            "status": "modified",
            "additions": 3,
            "deletions": 1,
            "raw_url": "https://github.com/octo/widgets/raw/abc/app/views.py",
            "patch": "@@ -1,2 +1,4 @@\n import os\n+import sys\n"
        }"#;
        let file: ChangedFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.filename, "app/views.py");
        assert_eq!(file.status, FileStatus::Modified);
        assert!(file.patch.as_deref().unwrap().contains("+import sys"));
    }

    #[test]
    fn test_binary_file_has_no_patch() {
        let json = r#"{"filename": "logo.png", "status": "added", "raw_url": ""}"#;
        let file: ChangedFile = serde_json::from_str(json).unwrap();
        assert!(file.patch.is_none());
        assert_eq!(file.status, FileStatus::Added);
    }

    #[test]
    fn test_unknown_status_maps_to_other() {
        let json = r#"{"filename": "a.md", "status": "copied"}"#;
        let file: ChangedFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.status, FileStatus::Other);
    }

    #[test]
    fn test_repo_ref_display() {
        let repo = RepoRef {
            owner: "octo".to_string(),
            repo: "widgets".to_string(),
        };
        assert_eq!(repo.to_string(), "octo/widgets");
    }
}
