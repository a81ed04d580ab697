//! Line-level change accounting between two versions of a snippet's code.
//!
//! Counts are derived from a longest-common-subsequence over lines, after
//! trimming the shared prefix and suffix. Reordering two lines therefore
//! counts as one addition plus one removal. The counts are bookkeeping for
//! version history, not a patch format.

/// Added and removed line counts for one edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDelta {
    pub added: i64,
    pub removed: i64,
}

/// Number of lines in a code body. A trailing newline does not count as an
/// extra empty line.
pub fn line_count(code: &str) -> i64 {
    code.lines().count() as i64
}

/// Compute the line delta from `old` to `new`.
pub fn line_delta(old: &str, new: &str) -> LineDelta {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    // Shared prefix.
    let mut start = 0;
    while start < old_lines.len()
        && start < new_lines.len()
        && old_lines[start] == new_lines[start]
    {
        start += 1;
    }

    // Shared suffix, not overlapping the prefix.
    let mut old_end = old_lines.len();
    let mut new_end = new_lines.len();
    while old_end > start && new_end > start && old_lines[old_end - 1] == new_lines[new_end - 1] {
        old_end -= 1;
        new_end -= 1;
    }

    let old_mid = &old_lines[start..old_end];
    let new_mid = &new_lines[start..new_end];
    let common = lcs_len(old_mid, new_mid);

    LineDelta {
        added: (new_mid.len() - common) as i64,
        removed: (old_mid.len() - common) as i64,
    }
}

/// Longest common subsequence length with a two-row table.
fn lcs_len(a: &[&str], b: &[&str]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for line_a in a {
        for (j, line_b) in b.iter().enumerate() {
            curr[j + 1] = if line_a == line_b {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_code_has_no_delta() {
        let delta = line_delta("a\nb\n", "a\nb\n");
        assert_eq!(delta, LineDelta { added: 0, removed: 0 });
    }

    #[test]
    fn test_appended_line() {
        let delta = line_delta("a\nb\n", "a\nb\nc\n");
        assert_eq!(delta, LineDelta { added: 1, removed: 0 });
    }

    #[test]
    fn test_dropped_line() {
        let delta = line_delta("a\nb\nc\n", "a\nb\n");
        assert_eq!(delta, LineDelta { added: 0, removed: 1 });
    }

    #[test]
    fn test_replaced_line() {
        let delta = line_delta("a\nb\nc\n", "a\nx\nc\n");
        assert_eq!(delta, LineDelta { added: 1, removed: 1 });
    }

    #[test]
    fn test_reordered_lines_count_as_edit() {
        let delta = line_delta("a\nb\n", "b\na\n");
        assert_eq!(delta, LineDelta { added: 1, removed: 1 });
    }

    #[test]
    fn test_from_empty() {
        let delta = line_delta("", "a\nb\n");
        assert_eq!(delta, LineDelta { added: 2, removed: 0 });
    }

    #[test]
    fn test_to_empty() {
        let delta = line_delta("a\nb\n", "");
        assert_eq!(delta, LineDelta { added: 0, removed: 2 });
    }

    #[test]
    fn test_trailing_newline_is_not_a_line() {
        assert_eq!(line_count("a\nb\n"), 2);
        assert_eq!(line_count("a\nb"), 2);
        assert_eq!(line_count(""), 0);
        let delta = line_delta("a\nb", "a\nb\n");
        assert_eq!(delta, LineDelta { added: 0, removed: 0 });
    }

    #[test]
    fn test_interleaved_changes() {
        let delta = line_delta("a\nb\nc\nd\n", "a\nx\nc\ny\nd\n");
        assert_eq!(delta, LineDelta { added: 2, removed: 1 });
    }
}
