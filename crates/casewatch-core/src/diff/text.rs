//! Line-level text diff over normalized visible text.

use super::normalize::{raw_lines, visible_lines};
use crate::errors::{ExError, ExErrorKind};
use crate::model::{LineChange, LineTag, Section};
use similar::{capture_diff_slices, Algorithm, DiffOp};

/// Diff two texts line by line.
///
/// Both sides are normalized to visible lines first; a side whose markup
/// cannot be normalized is diffed as raw lines instead. Unchanged lines are
/// omitted. Within a replaced hunk removed lines precede added ones.
pub fn diff_text(old_text: &str, new_text: &str) -> Vec<LineChange> {
    let old = normalized_or_raw(old_text);
    let new = normalized_or_raw(new_text);
    diff_lines(&old, &new)
}

/// LCS diff of two already-split line sequences.
pub fn diff_lines(old: &[String], new: &[String]) -> Vec<LineChange> {
    let mut changes = Vec::new();
    for op in capture_diff_slices(Algorithm::Lcs, old, new) {
        match op {
            DiffOp::Equal { .. } => {}
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                push_removed(&mut changes, &old[old_index..old_index + old_len]);
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                push_added(&mut changes, &new[new_index..new_index + new_len]);
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                push_removed(&mut changes, &old[old_index..old_index + old_len]);
                push_added(&mut changes, &new[new_index..new_index + new_len]);
            }
        }
    }
    changes
}

/// Render one line change as a detail line (`"+ line"` / `"- line"`).
pub fn render_line(change: &LineChange) -> String {
    match change.tag {
        LineTag::Added => format!("+ {}", change.line),
        LineTag::Removed => format!("- {}", change.line),
    }
}

/// Compare a section's stored previous text against its current content.
///
/// # Errors
///
/// - `MissingBaseline` when no previous text was stored
/// - `MalformedSection` when either side is not comparable text
pub fn compare_section(
    previous_text: Option<&str>,
    current: &Section,
) -> Result<Vec<LineChange>, ExError> {
    let previous_text = previous_text.ok_or_else(|| {
        ExError::new(ExErrorKind::MissingBaseline)
            .with_op("compare_section")
            .with_message("no previous text stored for this section")
    })?;

    if is_malformed(previous_text) || is_malformed(&current.raw_text) {
        return Err(ExError::new(ExErrorKind::MalformedSection)
            .with_op("compare_section")
            .with_message("section text contains NUL bytes"));
    }

    Ok(diff_text(previous_text, &current.raw_text))
}

fn is_malformed(text: &str) -> bool {
    text.contains('\0')
}

fn normalized_or_raw(text: &str) -> Vec<String> {
    match visible_lines(text) {
        Ok(lines) => lines,
        Err(err) => {
            tracing::debug!(error = %err, "normalization failed, diffing raw lines");
            raw_lines(text)
        }
    }
}

fn push_removed(changes: &mut Vec<LineChange>, lines: &[String]) {
    changes.extend(lines.iter().map(|l| LineChange::removed(l.clone())));
}

fn push_added(changes: &mut Vec<LineChange>, lines: &[String]) {
    changes.extend(lines.iter().map(|l| LineChange::added(l.clone())));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(changes: &[LineChange]) -> Vec<String> {
        changes.iter().map(render_line).collect()
    }

    #[test]
    fn test_diff_text_added_and_removed() {
        let changes = diff_text("a\nb\nc", "a\nc\nd");
        assert_eq!(rendered(&changes), vec!["- b", "+ d"]);
    }

    #[test]
    fn test_diff_text_identical_is_empty() {
        assert!(diff_text("same\ntext", "same\ntext").is_empty());
    }

    #[test]
    fn test_diff_text_replace_lists_removed_first() {
        let changes = diff_text("<p>Hearing 01.03</p>", "<p>Hearing 05.03</p>");
        assert_eq!(rendered(&changes), vec!["- Hearing 01.03", "+ Hearing 05.03"]);
    }

    #[test]
    fn test_diff_text_ignores_markup_only_changes() {
        let old = "<div><b>Судья</b> Иванов</div><script>x()</script>";
        let new = "<div class=\"x\"><b>Судья</b>   Иванов</div><script>y()</script>";
        assert!(diff_text(old, new).is_empty());
    }

    #[test]
    fn test_diff_text_falls_back_to_raw_lines() {
        let changes = diff_text("<!-- moved", "<!-- archived");
        assert_eq!(rendered(&changes), vec!["- <!-- moved", "+ <!-- archived"]);
    }

    #[test]
    fn test_diff_text_plain_text_with_less_than_keeps_lines() {
        let old = "Заседание 01.03\nСрок < 10 дней\nСудья Иванов";
        let new = "Заседание 05.03\nСрок < 10 дней\nСудья Иванов";
        assert_eq!(
            rendered(&diff_text(old, new)),
            vec!["- Заседание 01.03", "+ Заседание 05.03"]
        );
    }

    #[test]
    fn test_diff_text_tag_lookalike_change_is_visible() {
        let changes = diff_text("ratio a<b holds", "ratio a<c holds");
        assert_eq!(rendered(&changes), vec!["- ratio a<b holds", "+ ratio a<c holds"]);
    }

    #[test]
    fn test_diff_text_pre_block_diffs_per_line() {
        let old = "<pre>line one\nline two\nline three</pre>";
        let new = "<pre>line one\nline 2\nline three</pre>";
        assert_eq!(rendered(&diff_text(old, new)), vec!["- line two", "+ line 2"]);
    }

    #[test]
    fn test_compare_section_missing_baseline() {
        let err = compare_section(None, &Section::text("x")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::MissingBaseline);
    }

    #[test]
    fn test_compare_section_malformed() {
        let err = compare_section(Some("ok"), &Section::text("bad\0bytes")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::MalformedSection);
    }

    #[test]
    fn test_compare_section_ok() {
        let changes = compare_section(Some("x\ny"), &Section::text("x\nz")).unwrap();
        assert_eq!(rendered(&changes), vec!["- y", "+ z"]);
    }
}
