//! Parser for the small markup dialect used by guidebook items.
//!
//! An item is either prose or a checklist. Prose is split into paragraphs with
//! `**bold**` and `` `inline code` `` runs; checklists are classified line by
//! line. Fenced code blocks are cut out of the raw text before anything else,
//! so their contents never see the other rules.
//!
//! Malformed markup never fails. An opening fence without a closing fence turns
//! the rest of the item into literal text, and unmatched `**` or `` ` ``
//! delimiters stay in the plain text as typed.

use std::sync::LazyLock;

use regex::Regex;

use crate::book::{Item, ItemKind};

pub const FENCE: &str = "```";
pub const MAIN_ENTRY_MARKER: &str = "* [ ]";
pub const SUB_ENTRY_MARKER: &str = "- [ ]";
pub const HEADER_GLYPH: char = '#';
const BULLET_MARKERS: [&str; 3] = ["- ", "* ", "• "];

// The rest of the opening fence line is the info string; a block without a
// newline before its closing fence is a single-line block with no info string.
static FENCED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:([^\n`]*)\n(.*?)|([^\n]*?))```")
        .expect("Failed to compile fenced code block regex")
});

static INLINE_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*[^\n]+?\*\*|`[^`\n]+?`").expect("Failed to compile inline span regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineRun {
    PlainText(String),
    Bold(String),
    InlineCode(String),
}

impl InlineRun {
    pub fn text(&self) -> &str {
        match self {
            InlineRun::PlainText(text) | InlineRun::Bold(text) | InlineRun::InlineCode(text) => {
                text
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDepth {
    Main,
    Sub,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedNode {
    Paragraph(Vec<InlineRun>),
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    /// A toggleable checklist entry. `line_index` is the line's position in the
    /// whole item text split on `\n`, which is what persisted state is keyed by.
    ChecklistLine {
        raw: String,
        line_index: usize,
        depth: EntryDepth,
    },
    HeaderLine(String),
    BulletLine(String),
    PlainLine(String),
    BlankLine,
}

impl ParsedNode {
    /// Display text of a line-level node with its marker stripped.
    pub fn label(&self) -> Option<&str> {
        match self {
            ParsedNode::ChecklistLine { raw, .. } => {
                let trimmed = raw.trim_start();
                Some(trimmed[MAIN_ENTRY_MARKER.len()..].trim())
            }
            ParsedNode::HeaderLine(raw) => Some(raw.trim().trim_start_matches(HEADER_GLYPH).trim()),
            ParsedNode::BulletLine(raw) => {
                let trimmed = raw.trim_start();
                let stripped = BULLET_MARKERS
                    .iter()
                    .find_map(|marker| trimmed.strip_prefix(marker))
                    .unwrap_or(trimmed);
                Some(stripped.trim())
            }
            ParsedNode::PlainLine(raw) => Some(raw.trim()),
            _ => None,
        }
    }

    fn is_line_level(&self) -> bool {
        matches!(
            self,
            ParsedNode::ChecklistLine { .. }
                | ParsedNode::HeaderLine(_)
                | ParsedNode::BulletLine(_)
                | ParsedNode::PlainLine(_)
                | ParsedNode::BlankLine
        )
    }
}

#[derive(Debug)]
enum Segment<'a> {
    Text { text: &'a str, first_line: usize },
    Code { language: Option<String>, text: String },
    Literal { text: &'a str },
}

/// Parses an item, choosing prose or checklist by sniffing the text.
pub fn parse(text: &str) -> Vec<ParsedNode> {
    let kind = if is_checklist_text(text) {
        ItemKind::Checklist
    } else {
        ItemKind::Prose
    };
    parse_as(text, kind)
}

/// Parses an item using its declared kind.
pub fn parse_item(item: &Item) -> Vec<ParsedNode> {
    parse_as(item.text(), item.kind())
}

pub fn parse_as(text: &str, kind: ItemKind) -> Vec<ParsedNode> {
    let mut nodes = Vec::new();
    for segment in split_segments(text) {
        match segment {
            Segment::Code { language, text } => nodes.push(ParsedNode::CodeBlock { language, text }),
            Segment::Text { text, first_line } => match kind {
                ItemKind::Prose => push_paragraphs(text, &mut nodes),
                ItemKind::Checklist => push_checklist_lines(text, first_line, &mut nodes),
            },
            Segment::Literal { text } => match kind {
                ItemKind::Prose => {
                    let literal = text.trim();
                    if !literal.is_empty() {
                        nodes.push(ParsedNode::Paragraph(vec![InlineRun::PlainText(
                            literal.to_string(),
                        )]));
                    }
                }
                ItemKind::Checklist => {
                    for line in text.split('\n') {
                        if line.trim().is_empty() {
                            nodes.push(ParsedNode::BlankLine);
                        } else {
                            nodes.push(ParsedNode::PlainLine(line.to_string()));
                        }
                    }
                }
            },
        }
    }
    nodes
}

/// True when any line outside fenced code starts with a checklist marker.
pub fn is_checklist_text(text: &str) -> bool {
    split_segments(text).iter().any(|segment| match segment {
        Segment::Text { text, .. } => text.split('\n').any(is_entry_line),
        _ => false,
    })
}

fn is_entry_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with(MAIN_ENTRY_MARKER) || trimmed.starts_with(SUB_ENTRY_MARKER)
}

fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for captures in FENCED_BLOCK_RE.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            segments.push(Segment::Text {
                text: &text[cursor..whole.start()],
                first_line: line_number_at(text, cursor),
            });
        }
        let language = captures
            .get(1)
            .and_then(|info| info.as_str().split_whitespace().next())
            .map(str::to_string);
        let body = captures
            .get(2)
            .or_else(|| captures.get(3))
            .map_or("", |m| m.as_str());
        segments.push(Segment::Code {
            language,
            text: body.trim().to_string(),
        });
        cursor = whole.end();
    }

    let tail = &text[cursor..];
    match tail.find(FENCE) {
        Some(offset) => {
            let fence_start = cursor + offset;
            if offset > 0 {
                segments.push(Segment::Text {
                    text: &text[cursor..fence_start],
                    first_line: line_number_at(text, cursor),
                });
            }
            segments.push(Segment::Literal {
                text: &text[fence_start..],
            });
        }
        None if !tail.is_empty() => segments.push(Segment::Text {
            text: tail,
            first_line: line_number_at(text, cursor),
        }),
        None => {}
    }

    segments
}

fn line_number_at(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].matches('\n').count()
}

fn push_paragraphs(text: &str, nodes: &mut Vec<ParsedNode>) {
    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        nodes.push(ParsedNode::Paragraph(parse_inline(paragraph)));
    }
}

fn push_checklist_lines(text: &str, first_line: usize, nodes: &mut Vec<ParsedNode>) {
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len().saturating_sub(1);

    for (offset, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        // Text around a code fence leaves an empty fragment at the seam.
        if trimmed.is_empty() && (offset == 0 || offset == last) {
            continue;
        }
        nodes.push(classify_checklist_line(line, first_line + offset));
    }
}

fn classify_checklist_line(line: &str, line_index: usize) -> ParsedNode {
    let trimmed = line.trim_start();
    if trimmed.starts_with(MAIN_ENTRY_MARKER) {
        ParsedNode::ChecklistLine {
            raw: line.to_string(),
            line_index,
            depth: EntryDepth::Main,
        }
    } else if trimmed.starts_with(SUB_ENTRY_MARKER) {
        ParsedNode::ChecklistLine {
            raw: line.to_string(),
            line_index,
            depth: EntryDepth::Sub,
        }
    } else if trimmed.trim_end().is_empty() {
        ParsedNode::BlankLine
    } else if trimmed.starts_with(HEADER_GLYPH) {
        ParsedNode::HeaderLine(line.to_string())
    } else if BULLET_MARKERS.iter().any(|marker| trimmed.starts_with(marker)) {
        ParsedNode::BulletLine(line.to_string())
    } else {
        ParsedNode::PlainLine(line.to_string())
    }
}

/// Splits one paragraph into plain, bold and inline-code runs.
pub fn parse_inline(text: &str) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut cursor = 0;

    for span in INLINE_SPAN_RE.find_iter(text) {
        if span.start() > cursor {
            runs.push(InlineRun::PlainText(text[cursor..span.start()].to_string()));
        }
        let matched = span.as_str();
        if let Some(inner) = matched
            .strip_prefix("**")
            .and_then(|rest| rest.strip_suffix("**"))
        {
            runs.push(InlineRun::Bold(inner.to_string()));
        } else {
            runs.push(InlineRun::InlineCode(matched[1..matched.len() - 1].to_string()));
        }
        cursor = span.end();
    }

    if cursor < text.len() {
        runs.push(InlineRun::PlainText(text[cursor..].to_string()));
    }
    runs
}

/// Reconstructs markup text from parsed nodes.
///
/// Paragraphs and code blocks are separated by a blank line and consecutive
/// checklist lines by a single newline, so the output re-parses to the same
/// node sequence.
pub fn to_markup(nodes: &[ParsedNode]) -> String {
    let mut output = String::new();
    let mut previous_line_level = None;

    for node in nodes {
        if let Some(prev) = previous_line_level {
            if prev && node.is_line_level() {
                output.push('\n');
            } else {
                output.push_str("\n\n");
            }
        }
        match node {
            ParsedNode::Paragraph(runs) => {
                for run in runs {
                    match run {
                        InlineRun::PlainText(text) => output.push_str(text),
                        InlineRun::Bold(text) => {
                            output.push_str("**");
                            output.push_str(text);
                            output.push_str("**");
                        }
                        InlineRun::InlineCode(text) => {
                            output.push('`');
                            output.push_str(text);
                            output.push('`');
                        }
                    }
                }
            }
            ParsedNode::CodeBlock { language, text } => {
                output.push_str(FENCE);
                if let Some(language) = language {
                    output.push_str(language);
                }
                output.push('\n');
                output.push_str(text);
                output.push('\n');
                output.push_str(FENCE);
            }
            ParsedNode::ChecklistLine { raw, .. }
            | ParsedNode::HeaderLine(raw)
            | ParsedNode::BulletLine(raw)
            | ParsedNode::PlainLine(raw) => output.push_str(raw),
            ParsedNode::BlankLine => {}
        }
        previous_line_level = Some(node.is_line_level());
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_drops_language_tag() {
        let nodes = parse("```js\nconst x = 1;\n```");
        assert_eq!(
            nodes,
            vec![ParsedNode::CodeBlock {
                language: Some("js".to_string()),
                text: "const x = 1;".to_string(),
            }]
        );
    }

    #[test]
    fn test_whole_info_string_is_dropped() {
        assert_eq!(
            parse("```프롬프트\nlofi beat\n```"),
            vec![ParsedNode::CodeBlock {
                language: Some("프롬프트".to_string()),
                text: "lofi beat".to_string(),
            }]
        );
        assert_eq!(
            parse("```text title=prompt\nlofi beat\n```"),
            vec![ParsedNode::CodeBlock {
                language: Some("text".to_string()),
                text: "lofi beat".to_string(),
            }]
        );
    }

    #[test]
    fn test_single_line_fence() {
        assert_eq!(
            parse("```lofi beat, 70 bpm```"),
            vec![ParsedNode::CodeBlock {
                language: None,
                text: "lofi beat, 70 bpm".to_string(),
            }]
        );
    }

    #[test]
    fn test_inline_runs() {
        let nodes = parse("**A** and `B` and C");
        assert_eq!(
            nodes,
            vec![ParsedNode::Paragraph(vec![
                InlineRun::Bold("A".to_string()),
                InlineRun::PlainText(" and ".to_string()),
                InlineRun::InlineCode("B".to_string()),
                InlineRun::PlainText(" and C".to_string()),
            ])]
        );
    }

    #[test]
    fn test_empty_item_has_no_nodes() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n  \n\n").is_empty());
    }

    #[test]
    fn test_paragraphs_split_on_blank_line() {
        let nodes = parse("first\n\nsecond\nstill second");
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[1],
            ParsedNode::Paragraph(vec![InlineRun::PlainText(
                "second\nstill second".to_string()
            )])
        );
    }

    #[test]
    fn test_code_contents_are_not_formatted() {
        let nodes = parse("Intro\n\n```\n**not bold** `raw`\n```\n\nOutro");
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            nodes[1],
            ParsedNode::CodeBlock {
                language: None,
                text: "**not bold** `raw`".to_string(),
            }
        );
    }

    #[test]
    fn test_unterminated_fence_is_literal() {
        let nodes = parse("Before\n\n```python\nprint(**x**)");
        assert_eq!(
            nodes,
            vec![
                ParsedNode::Paragraph(vec![InlineRun::PlainText("Before".to_string())]),
                ParsedNode::Paragraph(vec![InlineRun::PlainText(
                    "```python\nprint(**x**)".to_string()
                )]),
            ]
        );
    }

    #[test]
    fn test_unmatched_delimiters_stay_literal() {
        let nodes = parse("a **b and `c");
        assert_eq!(
            nodes,
            vec![ParsedNode::Paragraph(vec![InlineRun::PlainText(
                "a **b and `c".to_string()
            )])]
        );
    }

    #[test]
    fn test_bold_does_not_nest() {
        let runs = parse_inline("**a `b` c**");
        assert_eq!(runs, vec![InlineRun::Bold("a `b` c".to_string())]);
    }

    #[test]
    fn test_checklist_is_item_level() {
        let text = "Launch prep\n\n* [ ] Export stems\n- [ ] Check loudness\n# Release\n- plain bullet\n**not** parsed as prose";
        let nodes = parse(text);
        assert!(nodes.iter().all(|n| !matches!(n, ParsedNode::Paragraph(_))));
        assert_eq!(nodes[0], ParsedNode::PlainLine("Launch prep".to_string()));
        assert_eq!(nodes[1], ParsedNode::BlankLine);
        assert_eq!(
            nodes[2],
            ParsedNode::ChecklistLine {
                raw: "* [ ] Export stems".to_string(),
                line_index: 2,
                depth: EntryDepth::Main,
            }
        );
        assert_eq!(nodes[3].label(), Some("Check loudness"));
        assert!(matches!(nodes[4], ParsedNode::HeaderLine(_)));
        assert_eq!(nodes[4].label(), Some("Release"));
        assert_eq!(nodes[5].label(), Some("plain bullet"));
    }

    #[test]
    fn test_checklist_line_indices_count_code_lines() {
        let text = "* [ ] one\n```\na\nb\n```\n* [ ] two";
        let nodes = parse(text);
        let indices: Vec<usize> = nodes
            .iter()
            .filter_map(|n| match n {
                ParsedNode::ChecklistLine { line_index, .. } => Some(*line_index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 5]);
        assert!(nodes.iter().any(|n| matches!(n, ParsedNode::CodeBlock { .. })));
    }

    #[test]
    fn test_marker_inside_code_does_not_make_checklist() {
        assert!(!is_checklist_text("```\n* [ ] not a task\n```"));
        assert!(is_checklist_text("  - [ ] nested task"));
    }

    #[test]
    fn test_round_trip_prose() {
        let text = "**Prompt** for `suno`\n\n```text\nlofi, rainy night\n```\n\nDone";
        let nodes = parse(text);
        assert_eq!(to_markup(&nodes), text);
        assert_eq!(parse(&to_markup(&nodes)), nodes);
    }

    #[test]
    fn test_round_trip_checklist() {
        let text = "# Before upload\n* [ ] Title set\n- [ ] Cover art";
        let nodes = parse(text);
        assert_eq!(to_markup(&nodes), text);
    }
}
