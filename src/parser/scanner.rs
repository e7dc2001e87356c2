//! Line-oriented bracket counting for HCL-like text
//!
//! Counts `{`, `[` and `(` against `}`, `]` and `)` while skipping quoted
//! strings, `#` / `//` line comments, `/* */` comments and heredoc bodies.
//! State carries across lines so multi-line comments and heredocs are tracked.

use std::sync::LazyLock;

use regex::Regex;

/// `<<EOF` or `<<-EOF` ending the line
static HEREDOC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<<-?([A-Za-z_][A-Za-z0-9_-]*)\s*$").expect("Invalid heredoc regex")
});

/// Bracket summary of one line
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LineDelta {
    pub opens: usize,
    pub closes: usize,
    /// First code character of the line is a closing bracket
    pub leading_close: bool,
    /// Line belongs to a heredoc body or a multi-line comment and must be kept verbatim
    pub opaque: bool,
    /// Byte offset of the first `#`, `//` or `/*` comment outside a string
    pub comment_start: Option<usize>,
    /// Byte offset of the closing bracket that returns the starting depth to zero
    pub closed_at: Option<usize>,
}

impl LineDelta {
    pub fn net(&self) -> i64 {
        self.opens as i64 - self.closes as i64
    }
}

#[derive(Debug, Default)]
pub struct BraceScanner {
    heredoc: Option<String>,
    in_block_comment: bool,
}

impl BraceScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan(&mut self, line: &str) -> LineDelta {
        self.scan_line(line, None)
    }

    /// Like [`scan`](Self::scan) for a line entered at `depth`, also locating
    /// the bracket that closes the enclosing construct
    pub fn scan_at_depth(&mut self, line: &str, depth: i64) -> LineDelta {
        self.scan_line(line, Some(depth))
    }

    fn scan_line(&mut self, line: &str, mut depth: Option<i64>) -> LineDelta {
        if let Some(marker) = &self.heredoc {
            if line.trim() == marker {
                self.heredoc = None;
            }
            return LineDelta {
                opaque: true,
                ..LineDelta::default()
            };
        }

        let mut delta = LineDelta {
            opaque: self.in_block_comment,
            ..LineDelta::default()
        };
        let mut in_string = false;
        let mut seen_code = false;
        let mut chars = line.char_indices().peekable();

        while let Some((idx, c)) = chars.next() {
            let next = chars.peek().map(|&(_, n)| n);

            if self.in_block_comment {
                if c == '*' && next == Some('/') {
                    chars.next();
                    self.in_block_comment = false;
                }
                continue;
            }

            if in_string {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match c {
                '#' => {
                    delta.comment_start.get_or_insert(idx);
                    break;
                }
                '/' if next == Some('/') => {
                    delta.comment_start.get_or_insert(idx);
                    break;
                }
                '/' if next == Some('*') => {
                    chars.next();
                    delta.comment_start.get_or_insert(idx);
                    self.in_block_comment = true;
                }
                '<' if next == Some('<') => {
                    if let Some(caps) = HEREDOC_RE.captures(&line[idx..]) {
                        self.heredoc = Some(caps[1].to_string());
                        break;
                    }
                    seen_code = true;
                }
                '"' => {
                    in_string = true;
                    seen_code = true;
                }
                '{' | '[' | '(' => {
                    delta.opens += 1;
                    if let Some(depth) = depth.as_mut() {
                        *depth += 1;
                    }
                    seen_code = true;
                }
                '}' | ']' | ')' => {
                    if !seen_code {
                        delta.leading_close = true;
                    }
                    delta.closes += 1;
                    if let Some(depth) = depth.as_mut() {
                        *depth -= 1;
                        if *depth == 0 && delta.closed_at.is_none() {
                            delta.closed_at = Some(idx);
                        }
                    }
                    seen_code = true;
                }
                c if c.is_whitespace() => {}
                _ => seen_code = true,
            }
        }

        delta
    }
}
