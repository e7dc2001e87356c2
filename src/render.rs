//! Canonical rendering of a module block
//!
//! Output layout:
//! ```text
//! module "<name>" {
//!   source  = "<source>"
//!   version = "<constraint>"
//!
//!   <body, re-indented>
//! }
//! ```

use crate::parser::scanner::BraceScanner;
use crate::parser::types::ModuleBlock;

const INDENT: &str = "  ";

/// Rebuild a block around a new source and optional version constraint.
///
/// Body content keeps its order and nesting; only indentation is normalized.
/// Leading blank lines are dropped and exactly one blank line separates the
/// attributes from the remaining body.
pub fn render(block: &ModuleBlock, source: &str, version: Option<&str>) -> Vec<String> {
    let inner = format!("{}{}", block.indent, INDENT);

    let mut lines = vec![
        block.header.clone(),
        format!("{}source  = \"{}\"", inner, source),
    ];
    if let Some(version) = version {
        lines.push(format!("{}version = \"{}\"", inner, version));
    }

    let body = reindent(&block.body, &inner);
    if !body.is_empty() {
        lines.push(String::new());
        lines.extend(body);
    }

    lines.push(match &block.trailer {
        Some(trailer) => format!("{}}} {}", block.indent, trailer),
        None => format!("{}}}", block.indent),
    });
    lines
}

/// Re-indent body lines at `base` plus two spaces per open bracket.
///
/// Heredoc bodies and multi-line comments are copied verbatim.
fn reindent(body: &[String], base: &str) -> Vec<String> {
    let first = body
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(body.len());

    let mut scanner = BraceScanner::new();
    let mut depth: usize = 0;
    let mut out = Vec::with_capacity(body.len() - first);

    for line in &body[first..] {
        let delta = scanner.scan(line);

        if delta.opaque {
            depth = shift(depth, delta.net());
            out.push(line.clone());
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push(String::new());
            continue;
        }

        let mut net = delta.net();
        if delta.leading_close {
            depth = depth.saturating_sub(1);
            net += 1;
        }

        out.push(format!("{}{}{}", base, INDENT.repeat(depth), trimmed));
        depth = shift(depth, net);
    }

    out
}

fn shift(depth: usize, net: i64) -> usize {
    (depth as i64 + net).max(0) as usize
}
