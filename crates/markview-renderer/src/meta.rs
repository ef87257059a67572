//! Code fence metadata parsing.
//!
//! The text after a fence's language tag may carry a line-highlight group and a
//! line-number flag, as in `rust {1,4-6} ln`. Anything that is not recognized
//! is ignored.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static LINE_NUMBERS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:ln|line-numbers)\b").unwrap());

/// Largest number of lines a single range entry may expand to.
pub const MAX_RANGE_SPAN: usize = 10_000;

/// Highlighting directives parsed from fence metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FenceMeta {
    /// 1-based line numbers to emphasize.
    pub highlighted_lines: BTreeSet<usize>,
    /// Whether lines carry a line number.
    pub line_numbers: bool,
}

impl FenceMeta {
    /// Check if the 1-based `line` is highlighted.
    #[must_use]
    pub fn is_highlighted(&self, line: usize) -> bool {
        self.highlighted_lines.contains(&line)
    }
}

/// Parse fence metadata into highlighting directives.
///
/// - The first `{...}` group is split on commas. Each entry is either a single
///   line (`3`) or an inclusive range (`4-6`). Zero, reversed ranges, ranges
///   longer than [`MAX_RANGE_SPAN`] and anything non-numeric are dropped.
/// - `ln` or `line-numbers` anywhere in the string (case-insensitive, whole
///   word) turns line numbers on.
///
/// Never fails.
#[must_use]
pub fn parse_meta(meta: &str) -> FenceMeta {
    let mut highlighted_lines = BTreeSet::new();
    if let Some(group) = braced_group(meta) {
        for entry in group.split(',') {
            add_entry(entry.trim(), &mut highlighted_lines);
        }
    }

    FenceMeta {
        highlighted_lines,
        line_numbers: LINE_NUMBERS_RE.is_match(meta),
    }
}

fn braced_group(meta: &str) -> Option<&str> {
    let start = meta.find('{')?;
    let rest = &meta[start + 1..];
    let end = rest.find('}')?;
    Some(&rest[..end])
}

fn add_entry(entry: &str, lines: &mut BTreeSet<usize>) {
    if let Some((start, end)) = entry.split_once('-') {
        let (Ok(start), Ok(end)) = (start.trim().parse::<usize>(), end.trim().parse::<usize>())
        else {
            return;
        };
        if start == 0 || start > end || end - start >= MAX_RANGE_SPAN {
            return;
        }
        lines.extend(start..=end);
    } else if let Ok(line) = entry.parse::<usize>()
        && line > 0
    {
        lines.insert(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(meta: &FenceMeta) -> Vec<usize> {
        meta.highlighted_lines.iter().copied().collect()
    }

    #[test]
    fn test_ranges_and_line_numbers() {
        let meta = parse_meta("{2,4-6} ln");
        assert_eq!(lines(&meta), vec![2, 4, 5, 6]);
        assert!(meta.line_numbers);
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse_meta(""), FenceMeta::default());
    }

    #[test]
    fn test_single_line() {
        let meta = parse_meta("{3}");
        assert_eq!(lines(&meta), vec![3]);
        assert!(!meta.line_numbers);
    }

    #[test]
    fn test_invalid_entries_dropped() {
        let meta = parse_meta("{0, x, 5-2, -3, 7, 1-}");
        assert_eq!(lines(&meta), vec![7]);
    }

    #[test]
    fn test_whitespace_in_entries() {
        let meta = parse_meta("{ 1 , 3 - 4 }");
        assert_eq!(lines(&meta), vec![1, 3, 4]);
    }

    #[test]
    fn test_only_first_group() {
        let meta = parse_meta("{1} {2}");
        assert_eq!(lines(&meta), vec![1]);
    }

    #[test]
    fn test_unclosed_group() {
        assert!(parse_meta("{1,2").highlighted_lines.is_empty());
    }

    #[test]
    fn test_line_numbers_flag_variants() {
        assert!(parse_meta("line-numbers").line_numbers);
        assert!(parse_meta("LN").line_numbers);
        assert!(parse_meta("{1} Line-Numbers").line_numbers);
        assert!(!parse_meta("lines").line_numbers);
        assert!(!parse_meta("kiln").line_numbers);
    }

    #[test]
    fn test_range_cap() {
        let meta = parse_meta(&format!("{{1-{}}}", MAX_RANGE_SPAN));
        assert_eq!(meta.highlighted_lines.len(), MAX_RANGE_SPAN);

        let meta = parse_meta(&format!("{{1-{}, 4}}", MAX_RANGE_SPAN + 1));
        assert_eq!(lines(&meta), vec![4]);

        assert!(parse_meta("{1-18446744073709551615}").highlighted_lines.is_empty());
    }

    #[test]
    fn test_is_highlighted() {
        let meta = parse_meta("{2}");
        assert!(meta.is_highlighted(2));
        assert!(!meta.is_highlighted(1));
    }
}
