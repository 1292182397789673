use std::collections::BTreeSet;

use super::PrError;

/// A contiguous region of changes within a file's patch.
#[derive(Debug, Clone)]
pub struct Hunk {
    /// Starting line number in the new file
    pub new_start: u32,
    /// Raw lines of the hunk (prefixed with +, -, or space)
    pub lines: Vec<String>,
}

impl Hunk {
    /// Line numbers on the new side that appear in this hunk
    /// (added and context lines). Removed lines have no new-side number.
    /// Numbering stops at `u32::MAX`.
    pub fn new_side_lines(&self) -> impl Iterator<Item = u32> + '_ {
        let mut next = Some(self.new_start);
        self.lines
            .iter()
            .filter(|line| line.starts_with('+') || line.starts_with(' '))
            .map_while(move |_| {
                let current = next?;
                next = current.checked_add(1);
                Some(current)
            })
    }
}

/// Parse the per-file patch GitHub returns in the files listing.
///
/// Unlike a full `git diff`, the text starts directly at the first hunk
/// header (`@@ -a,b +c,d @@`); there are no `diff --git` or `---`/`+++`
/// lines. `\ No newline at end of file` markers are dropped.
pub fn parse_patch(patch: &str) -> Result<Vec<Hunk>, PrError> {
    let mut hunks = Vec::new();
    let mut current: Option<Hunk> = None;

    for line in patch.lines() {
        if line.starts_with("@@") {
            if let Some(hunk) = current.take() {
                hunks.push(hunk);
            }
            let new_start = parse_hunk_header(line)?;
            current = Some(Hunk {
                new_start,
                lines: Vec::new(),
            });
            continue;
        }

        if let Some(hunk) = current.as_mut() {
            if line.starts_with('+') || line.starts_with('-') || line.starts_with(' ') {
                hunk.lines.push(line.to_string());
            } else if line.is_empty() {
                // Some producers trim the single space of empty context lines.
                hunk.lines.push(" ".to_string());
            }
        }
    }

    if let Some(hunk) = current.take() {
        hunks.push(hunk);
    }
    Ok(hunks)
}

/// All new-side line numbers a review comment can be anchored to.
pub fn commentable_lines(patch: &str) -> Result<BTreeSet<u32>, PrError> {
    let hunks = parse_patch(patch)?;
    Ok(hunks.iter().flat_map(|h| h.new_side_lines()).collect())
}

fn parse_hunk_header(line: &str) -> Result<u32, PrError> {
    let header = line
        .trim()
        .strip_prefix("@@")
        .ok_or_else(|| PrError::DiffParse("Invalid hunk header".to_string()))?;
    let header = match header.split_once("@@") {
        Some((ranges, _section)) => ranges,
        None => header,
    };
    let mut parts = header.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing old range".to_string()))?;
    let new_part = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing new range".to_string()))?;

    parse_range(old_part, '-')?;
    let (new_start, _new_count) = parse_range(new_part, '+')?;
    Ok(new_start)
}

fn parse_range(part: &str, prefix: char) -> Result<(u32, u32), PrError> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| PrError::DiffParse(format!("Invalid range prefix in {}", part)))?;
    let (start_str, count_str) = range.split_once(',').unwrap_or((range, "1"));
    let start = start_str
        .parse::<u32>()
        .map_err(|_| PrError::DiffParse(format!("Invalid range start in {}", part)))?;
    let count = count_str
        .parse::<u32>()
        .map_err(|_| PrError::DiffParse(format!("Invalid range count in {}", part)))?;
    Ok((start, count))
}
