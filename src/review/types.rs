use serde::Deserialize;

/// One inline remark returned by the model for a file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewComment {
    /// Review text, posted verbatim as the comment body
    pub comment: String,
    /// Line in the head version of the file the comment belongs to
    pub line_number: u32,
    /// Blocking bug or security issue
    #[serde(default)]
    pub is_critical: bool,
}
