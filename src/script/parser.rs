//! Script parsing seam.
//!
//! The host runtime owns the real script language; this crate only needs a
//! way to turn raw script text into an instruction tree before dispatching
//! it. [`ScriptParser`] is that seam. [`PlainParser`] is a small reference
//! implementation understanding a line-oriented `name:value` format with
//! two-space indentation, enough for startup scripts, exception handlers,
//! and the test suite. It performs no evaluation of any kind.

use serde_json::Value;

use crate::error::{MagicError, Result};

use super::node::Node;

/// Spaces per nesting level in the plain format.
const INDENT: usize = 2;

/// Parses raw script text into an executable instruction tree.
pub trait ScriptParser: Send + Sync {
    /// Parse `text` into a root node whose children are the script's
    /// top-level instructions.
    fn parse(&self, text: &str) -> Result<Node>;
}

/// Reference parser for the plain `name:value` format.
///
/// Rules:
/// - one node per line, `name` or `name:value`
/// - nesting by two-space indentation
/// - blank lines and lines starting with `//` are ignored
/// - values are typed: quoted strings stay strings, `true`/`false` become
///   booleans, numeric literals become numbers, everything else is a string
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainParser;

impl PlainParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }
}

impl ScriptParser for PlainParser {
    fn parse(&self, text: &str) -> Result<Node> {
        let mut entries = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }

            let indent = raw.len() - raw.trim_start_matches(' ').len();
            if indent % INDENT != 0 {
                return Err(MagicError::Parse(format!(
                    "line {}: indentation must be a multiple of {} spaces",
                    idx + 1,
                    INDENT
                )));
            }

            let (name, value) = match trimmed.split_once(':') {
                Some((name, value)) => (name.trim(), Some(parse_value(value.trim()))),
                None => (trimmed, None),
            };

            if name.is_empty() {
                return Err(MagicError::Parse(format!("line {}: missing node name", idx + 1)));
            }

            let node = Node {
                name: name.to_string(),
                value,
                children: Vec::new(),
            };
            entries.push((indent / INDENT, node, idx + 1));
        }

        let mut root = Node::default();
        let mut pos = 0;
        build(&mut root, &entries, &mut pos, 0)?;
        Ok(root)
    }
}

/// Attach entries at `depth` to `parent`, recursing for deeper runs.
fn build(
    parent: &mut Node,
    entries: &[(usize, Node, usize)],
    pos: &mut usize,
    depth: usize,
) -> Result<()> {
    while *pos < entries.len() {
        let (entry_depth, proto, line) = &entries[*pos];
        match entry_depth.cmp(&depth) {
            std::cmp::Ordering::Less => return Ok(()),
            std::cmp::Ordering::Greater => {
                return Err(MagicError::Parse(format!(
                    "line {}: unexpected indentation",
                    line
                )));
            }
            std::cmp::Ordering::Equal => {}
        }

        *pos += 1;
        let mut node = proto.clone();
        if entries.get(*pos).is_some_and(|(d, _, _)| *d > depth) {
            build(&mut node, entries, pos, depth + 1)?;
        }
        parent.children.push(node);
    }
    Ok(())
}

/// Type a raw value token.
fn parse_value(raw: &str) -> Value {
    if raw.len() >= 2 {
        let bytes = raw.as_bytes();
        if (bytes[0] == b'"' && bytes[raw.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[raw.len() - 1] == b'\'')
        {
            return Value::String(raw[1..raw.len() - 1].to_string());
        }
    }

    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return Value::from(float);
    }

    Value::String(raw.to_string())
}
