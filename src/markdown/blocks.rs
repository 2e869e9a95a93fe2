//! Block-level Markdown classification
//!
//! Single pass over the lines of a text segment. Anything that does not
//! fit a block rule becomes a paragraph holding the literal line.

use once_cell::sync::Lazy;
use regex::Regex;

use super::inline::{parse_inline, InlineSpan};

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(#+)\s+(\S.*)$").expect("valid regex"));
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*+]\s+(.*)$").expect("valid regex"));
static NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\.\s+(.*)$").expect("valid regex"));

const MAX_HEADING_LEVEL: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkdownNode {
    /// Blank line
    Spacer,
    Heading {
        level: u8,
        spans: Vec<InlineSpan>,
    },
    Bullet(Vec<InlineSpan>),
    Numbered {
        /// Literal number as written, never renumbered
        number: String,
        spans: Vec<InlineSpan>,
    },
    Table {
        header: Vec<Vec<InlineSpan>>,
        rows: Vec<Vec<Vec<InlineSpan>>>,
    },
    Paragraph(Vec<InlineSpan>),
}

/// Check if a line looks like a pipe-delimited table row (| a | b |)
fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2
        && trimmed.starts_with('|')
        && trimmed.ends_with('|')
        && trimmed[1..trimmed.len() - 1].contains('|')
}

/// Check if a line is a table separator (|---|:---:|)
fn is_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '-' | ':' | '|' | ' ' | '\t'))
}

fn parse_table_row(line: &str) -> Vec<Vec<InlineSpan>> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| parse_inline(cell.trim())).collect()
}

fn split_lines(body: &str) -> Vec<&str> {
    if body.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<&str> = body.split('\n').collect();
    if body.ends_with('\n') {
        lines.pop();
    }
    lines
}

fn classify_line(line: &str) -> MarkdownNode {
    if let Some(caps) = HEADING.captures(line) {
        let level = caps[1].len().min(MAX_HEADING_LEVEL) as u8;
        return MarkdownNode::Heading {
            level,
            spans: parse_inline(caps[2].trim_end()),
        };
    }
    if let Some(caps) = NUMBERED.captures(line) {
        return MarkdownNode::Numbered {
            number: caps[1].to_string(),
            spans: parse_inline(&caps[2]),
        };
    }
    if let Some(caps) = BULLET.captures(line) {
        return MarkdownNode::Bullet(parse_inline(&caps[1]));
    }
    MarkdownNode::Paragraph(parse_inline(line))
}

/// Render one text segment body into presentational nodes.
pub fn render_markdown(body: &str) -> Vec<MarkdownNode> {
    let lines = split_lines(body);
    let mut nodes = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.trim().is_empty() {
            nodes.push(MarkdownNode::Spacer);
            i += 1;
            continue;
        }

        if is_table_row(line) {
            let mut end = i;
            let mut rows = Vec::new();
            while end < lines.len() && is_table_row(lines[end]) {
                if !is_table_separator(lines[end]) {
                    rows.push(parse_table_row(lines[end]));
                }
                end += 1;
            }

            if rows.len() >= 2 {
                let header = rows.remove(0);
                nodes.push(MarkdownNode::Table { header, rows });
                i = end;
            } else {
                // Not enough rows for a table: keep the literal line
                nodes.push(MarkdownNode::Paragraph(parse_inline(line)));
                i += 1;
            }
            continue;
        }

        nodes.push(classify_line(line));
        i += 1;
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Vec<InlineSpan> {
        vec![InlineSpan::Text(s.to_string())]
    }

    #[test]
    fn test_headings_and_clamping() {
        let nodes = render_markdown("# Title\n######## Deep");
        assert_eq!(
            nodes,
            vec![
                MarkdownNode::Heading { level: 1, spans: text("Title") },
                MarkdownNode::Heading { level: 6, spans: text("Deep") },
            ]
        );
    }

    #[test]
    fn test_hash_without_space_is_paragraph() {
        assert_eq!(render_markdown("#tag"), vec![MarkdownNode::Paragraph(text("#tag"))]);
    }

    #[test]
    fn test_lists() {
        let nodes = render_markdown("- one\n* two\n+ three\n7. seven");
        assert_eq!(nodes[0], MarkdownNode::Bullet(text("one")));
        assert_eq!(nodes[1], MarkdownNode::Bullet(text("two")));
        assert_eq!(nodes[2], MarkdownNode::Bullet(text("three")));
        assert_eq!(
            nodes[3],
            MarkdownNode::Numbered { number: "7".into(), spans: text("seven") }
        );
    }

    #[test]
    fn test_bold_line_is_not_bullet() {
        let nodes = render_markdown("**Summary** below");
        assert!(matches!(&nodes[0], MarkdownNode::Paragraph(spans) if spans[0] == InlineSpan::Bold("Summary".into())));
    }

    #[test]
    fn test_blank_lines_become_spacers() {
        let nodes = render_markdown("a\n\nb\n");
        assert_eq!(
            nodes,
            vec![
                MarkdownNode::Paragraph(text("a")),
                MarkdownNode::Spacer,
                MarkdownNode::Paragraph(text("b")),
            ]
        );
    }

    #[test]
    fn test_table_with_separator() {
        let nodes = render_markdown("| col | n |\n|:---|---:|\n| a | **1** |\n| b | 2 |\nafter");
        assert_eq!(nodes.len(), 2);
        match &nodes[0] {
            MarkdownNode::Table { header, rows } => {
                assert_eq!(header, &vec![text("col"), text("n")]);
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0][1], vec![InlineSpan::Bold("1".into())]);
            }
            other => panic!("expected table, got {other:?}"),
        }
        assert_eq!(nodes[1], MarkdownNode::Paragraph(text("after")));
    }

    #[test]
    fn test_single_row_table_falls_back_to_paragraph() {
        let nodes = render_markdown("| a | b |");
        assert_eq!(nodes, vec![MarkdownNode::Paragraph(text("| a | b |"))]);
    }

    #[test]
    fn test_header_and_separator_only_keeps_both_lines() {
        let nodes = render_markdown("| a | b |\n|---|---|");
        assert_eq!(
            nodes,
            vec![
                MarkdownNode::Paragraph(text("| a | b |")),
                MarkdownNode::Paragraph(text("|---|---|")),
            ]
        );
    }

    #[test]
    fn test_empty_body() {
        assert!(render_markdown("").is_empty());
    }
}
