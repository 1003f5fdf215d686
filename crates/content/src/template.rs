//! Parser for `.panel` fragment templates.
//! `.panel` 面板模板的解析器。
//!
//! A template is indentation-structured, one node per line:
//!
//! ```text
//! section "Create Redmine Ticket"
//!   select #product-select "Product"
//!   input #firmware-path "Firmware path"
//!   button #create-ticket "Create ticket"
//! ```
//!
//! Each line is `kind [#anchor] ["label"]`; two spaces per nesting level.
//! Lines starting with `;` are comments.

use thiserror::Error;

use crate::host::{ContentHost, HostError, Node, NodeId};

const INDENT_WIDTH: usize = 2;

/// Parses template source into a fresh content host.
/// 將模板原始碼解析為新的內容樹。
pub fn parse_panel(source: &str) -> Result<ContentHost, TemplateError> {
    let mut host = ContentHost::new();
    // Parents indexed by depth; depth 0 inserts at the root.
    let mut stack: Vec<NodeId> = Vec::new();
    let mut node_count = 0usize;

    for (index, raw_line) in source.lines().enumerate() {
        let line_no = index + 1;
        if raw_line.trim().is_empty() || raw_line.trim_start().starts_with(';') {
            continue;
        }

        let depth = indent_depth(raw_line, line_no)?;
        if depth > stack.len() {
            return Err(TemplateError::IndentJump {
                line: line_no,
                depth,
                max: stack.len(),
            });
        }
        stack.truncate(depth);

        let parsed = parse_line(raw_line.trim(), line_no)?;
        let parent = stack.last().copied();
        let id = host
            .insert(parent, parsed)
            .map_err(|source| TemplateError::Host {
                line: line_no,
                source,
            })?;
        stack.push(id);
        node_count += 1;
    }

    if node_count == 0 {
        return Err(TemplateError::Empty);
    }
    Ok(host)
}

fn indent_depth(line: &str, line_no: usize) -> Result<usize, TemplateError> {
    let spaces = line.len() - line.trim_start_matches(' ').len();
    if line.trim_start_matches(' ').starts_with('\t') || spaces % INDENT_WIDTH != 0 {
        return Err(TemplateError::BadIndent { line: line_no });
    }
    Ok(spaces / INDENT_WIDTH)
}

fn parse_line(line: &str, line_no: usize) -> Result<Node, TemplateError> {
    let mut rest = line;

    let kind_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let kind = &rest[..kind_end];
    rest = rest[kind_end..].trim_start();

    let mut anchor: Option<&str> = None;
    if let Some(stripped) = rest.strip_prefix('#') {
        let end = stripped.find(char::is_whitespace).unwrap_or(stripped.len());
        anchor = Some(&stripped[..end]);
        rest = stripped[end..].trim_start();
    }

    let mut label = String::new();
    if !rest.is_empty() {
        let Some(stripped) = rest.strip_prefix('"') else {
            return Err(TemplateError::ExpectedLabel { line: line_no });
        };
        let Some(end) = stripped.find('"') else {
            return Err(TemplateError::UnterminatedLabel { line: line_no });
        };
        label = stripped[..end].to_string();
        let trailing = stripped[end + 1..].trim();
        if !trailing.is_empty() {
            return Err(TemplateError::TrailingInput {
                line: line_no,
                trailing: trailing.to_string(),
            });
        }
    }

    let node = match kind {
        "section" => Node::section(label),
        "label" => Node::label(label),
        "text" => Node::text(label),
        "input" => Node::input(label),
        "select" => Node::select(label),
        "checkbox" => Node::checkbox(label),
        "button" => Node::button(label),
        "table" => Node::table(),
        "progress" => Node::progress(),
        other => {
            return Err(TemplateError::UnknownKind {
                line: line_no,
                kind: other.to_string(),
            })
        }
    };

    Ok(match anchor {
        Some(anchor) => node.with_anchor(anchor),
        None => node,
    })
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template contains no nodes")]
    Empty,
    #[error("line {line}: indentation must be {INDENT_WIDTH}-space steps")]
    BadIndent { line: usize },
    #[error("line {line}: indent depth {depth} skips levels (max {max})")]
    IndentJump {
        line: usize,
        depth: usize,
        max: usize,
    },
    #[error("line {line}: unknown node kind '{kind}'")]
    UnknownKind { line: usize, kind: String },
    #[error("line {line}: expected a quoted label")]
    ExpectedLabel { line: usize },
    #[error("line {line}: unterminated label")]
    UnterminatedLabel { line: usize },
    #[error("line {line}: unexpected trailing input '{trailing}'")]
    TrailingInput { line: usize, trailing: String },
    #[error("line {line}: {source}")]
    Host {
        line: usize,
        #[source]
        source: HostError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NodeBody, Selector};

    const SAMPLE: &str = r#"
section "Create Redmine Ticket"
  select #product-select "Product"
  input #firmware-path "Firmware path"
  text #ticket-preview
  button #create-ticket "Create ticket"
; trailing comment
section "Status"
  progress #ticket-progress
"#;

    #[test]
    fn parses_nested_panel() {
        let host = parse_panel(SAMPLE).unwrap();
        let select = host
            .find(&Selector::parse("#product-select").unwrap())
            .expect("select present");
        match &host.node(select).unwrap().body {
            NodeBody::Select { label, .. } => assert_eq!(label, "Product"),
            other => panic!("unexpected body: {other:?}"),
        }
        assert_eq!(host.roots().len(), 2);
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = parse_panel("widget #x \"Huh\"").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownKind { kind, .. } if kind == "widget"));
    }

    #[test]
    fn rejects_odd_indent() {
        let err = parse_panel("section \"A\"\n   text #x").unwrap_err();
        assert!(matches!(err, TemplateError::BadIndent { line: 2 }));
    }

    #[test]
    fn rejects_indent_jump() {
        let err = parse_panel("section \"A\"\n    text #x").unwrap_err();
        assert!(matches!(err, TemplateError::IndentJump { line: 2, .. }));
    }

    #[test]
    fn rejects_duplicate_anchor() {
        let err = parse_panel("text #p\ntext #p").unwrap_err();
        assert!(matches!(err, TemplateError::Host { line: 2, .. }));
    }

    #[test]
    fn rejects_empty_template() {
        assert!(matches!(
            parse_panel("; only a comment\n").unwrap_err(),
            TemplateError::Empty
        ));
    }

    #[test]
    fn rejects_unterminated_label() {
        let err = parse_panel("section \"Open").unwrap_err();
        assert!(matches!(err, TemplateError::UnterminatedLabel { line: 1 }));
    }
}
