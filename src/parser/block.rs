//! `module` block parser
//!
//! Finds declaration blocks by brace counting instead of a full HCL grammar.
//!
//! Format example:
//! ```text
//! module "vnet" {
//!   source  = "acme/vnet/azurerm"
//!   version = "~> 3.0"
//!
//!   address_space = ["10.0.0.0/16"]
//! }
//! ```
//!
//! Only direct `source` / `version` attributes (active or commented out) are
//! interpreted; every other line is kept verbatim as body content.

use regex::Regex;

use crate::parser::scanner::BraceScanner;
use crate::parser::types::ModuleBlock;

/// Direct attribute of a block that the parser interprets
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attribute {
    Source(String),
    CommentedSource(String),
    Version(String),
    CommentedVersion,
}

/// Parser state between lines
enum ScanState {
    Scanning,
    InBlock { depth: i64, block: ModuleBlock },
}

/// Parser for `module` declarations
pub struct ModuleBlockParser {
    /// Header: `module "name" {` alone on its line
    header_re: Regex,
    /// `source = "..."`
    source_re: Regex,
    /// `# source = "..."` or `// source = "..."`
    commented_source_re: Regex,
    /// `version = "..."`
    version_re: Regex,
    /// `# version = ...` or `// version = ...`
    commented_version_re: Regex,
}

impl ModuleBlockParser {
    pub fn new() -> Self {
        Self {
            header_re: Regex::new(r#"^(\s*)module\s+"([^"]+)"\s*\{\s*$"#)
                .expect("Invalid header regex"),
            source_re: Regex::new(r#"^\s*source\s*=\s*"([^"]*)""#)
                .expect("Invalid source regex"),
            commented_source_re: Regex::new(r#"^\s*(?:#|//)\s*source\s*=\s*"([^"]*)""#)
                .expect("Invalid commented source regex"),
            version_re: Regex::new(r#"^\s*version\s*=\s*"([^"]*)""#)
                .expect("Invalid version regex"),
            commented_version_re: Regex::new(r#"^\s*(?:#|//)\s*version\s*="#)
                .expect("Invalid commented version regex"),
        }
    }

    /// Parse all complete module blocks, in order of appearance.
    ///
    /// A block whose closing brace is never found is dropped.
    pub fn parse(&self, lines: &[&str]) -> Vec<ModuleBlock> {
        let mut blocks = Vec::new();
        let mut scanner = BraceScanner::new();
        let mut state = ScanState::Scanning;

        for (idx, line) in lines.iter().enumerate() {
            let line_num = idx + 1;

            state = match state {
                ScanState::Scanning => {
                    let delta = scanner.scan(line);
                    match self.header_re.captures(line).filter(|_| !delta.opaque) {
                        Some(caps) => ScanState::InBlock {
                            depth: delta.net(),
                            block: ModuleBlock {
                                name: caps[2].to_string(),
                                start_line: line_num,
                                end_line: line_num,
                                indent: caps[1].to_string(),
                                header: line.to_string(),
                                source: None,
                                commented_source: None,
                                version: None,
                                body: Vec::new(),
                                trailer: None,
                            },
                        },
                        None => ScanState::Scanning,
                    }
                }
                ScanState::InBlock { depth, mut block } => {
                    let delta = scanner.scan_at_depth(line, depth);
                    let new_depth = depth + delta.net();

                    if new_depth <= 0 {
                        let (code, trailer) = match delta.closed_at {
                            Some(at) => (&line[..at], &line[at + 1..]),
                            None => ("", ""),
                        };
                        if !code.trim().is_empty() {
                            let code = code.trim_end();
                            if depth == 1 && !delta.opaque {
                                self.absorb(&mut block, code, delta.comment_start);
                            } else {
                                block.body.push(code.to_string());
                            }
                        }
                        let trailer = trailer.trim();
                        block.trailer = (!trailer.is_empty()).then(|| trailer.to_string());
                        block.end_line = line_num;
                        blocks.push(block);
                        ScanState::Scanning
                    } else {
                        if depth == 1 && !delta.opaque {
                            self.absorb(&mut block, line, delta.comment_start);
                        } else {
                            block.body.push(line.to_string());
                        }

                        ScanState::InBlock {
                            depth: new_depth,
                            block,
                        }
                    }
                }
            };
        }

        blocks
    }

    /// Record a direct child line as an interpreted attribute or as body content
    fn absorb(&self, block: &mut ModuleBlock, line: &str, comment_start: Option<usize>) {
        match self.attribute(line) {
            Some(Attribute::Source(value)) => block.source = Some(value),
            Some(Attribute::Version(value)) => block.version = Some(value),
            Some(Attribute::CommentedSource(value)) => {
                block.commented_source = Some(value);
                return;
            }
            Some(Attribute::CommentedVersion) => return,
            None => {
                block.body.push(line.to_string());
                return;
            }
        }

        // A comment trailing a replaced attribute stays with the block
        let tail = comment_start
            .filter(|&at| at < line.len())
            .map(|at| line[at..].trim())
            .filter(|tail| !tail.is_empty());
        if let Some(tail) = tail {
            block.body.push(tail.to_string());
        }
    }

    fn attribute(&self, line: &str) -> Option<Attribute> {
        if let Some(caps) = self.source_re.captures(line) {
            return Some(Attribute::Source(caps[1].to_string()));
        }
        if let Some(caps) = self.commented_source_re.captures(line) {
            return Some(Attribute::CommentedSource(caps[1].to_string()));
        }
        if let Some(caps) = self.version_re.captures(line) {
            return Some(Attribute::Version(caps[1].to_string()));
        }
        if self.commented_version_re.is_match(line) {
            return Some(Attribute::CommentedVersion);
        }
        None
    }
}

impl Default for ModuleBlockParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Vec<ModuleBlock> {
        let lines: Vec<&str> = content.lines().collect();
        ModuleBlockParser::new().parse(&lines)
    }

    #[test]
    fn parse_extracts_published_block() {
        let blocks = parse(
            r#"module "vnet" {
  source  = "acme/vnet/azurerm"
  version = "~> 3.0"

  address_space = ["10.0.0.0/16"]
}
"#,
        );

        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.name, "vnet");
        assert_eq!((block.start_line, block.end_line), (1, 6));
        assert_eq!(block.indent, "");
        assert_eq!(block.source.as_deref(), Some("acme/vnet/azurerm"));
        assert_eq!(block.version.as_deref(), Some("~> 3.0"));
        assert_eq!(
            block.body,
            vec!["".to_string(), "  address_space = [\"10.0.0.0/16\"]".to_string()]
        );
    }

    #[test]
    fn parse_tracks_nested_braces() {
        let blocks = parse(
            r#"module "vnet" {
  source = "../../"
  tags = {
    env = "dev"
  }
  subnet {
    name = "a"
  }
}
output "id" {
  value = module.vnet.id
}
"#,
        );

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].end_line, 9);
        assert_eq!(blocks[0].body.len(), 6);
        assert_eq!(blocks[0].body[0], "  tags = {");
        assert_eq!(blocks[0].body[5], "  }");
    }

    #[test]
    fn parse_finds_multiple_blocks_with_indentation() {
        let blocks = parse(
            "  module \"a\" {\n    source = \"../../\"\n  }\n\nmodule \"b\" {\n  source = \"x/y/z\"\n}\n",
        );

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].indent, "  ");
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (1, 3));
        assert_eq!(blocks[1].name, "b");
        assert_eq!((blocks[1].start_line, blocks[1].end_line), (5, 7));
    }

    #[test]
    fn parse_prefers_active_source_over_commented() {
        let blocks = parse(
            r#"module "vnet" {
  source = "../../"
  # source = "acme/vnet/azurerm"
  // version = "~> 1.0"
}
"#,
        );

        let block = &blocks[0];
        assert_eq!(block.source.as_deref(), Some("../../"));
        assert_eq!(block.commented_source.as_deref(), Some("acme/vnet/azurerm"));
        assert_eq!(block.version, None);
        assert!(block.body.is_empty());
    }

    #[test]
    fn parse_leaves_source_absent_when_only_commented() {
        let blocks = parse(
            r#"module "vnet" {
  # source = "acme/vnet/azurerm"
  name = "x"
}
"#,
        );

        assert_eq!(blocks[0].source, None);
        assert_eq!(blocks[0].descriptor(), None);
        assert_eq!(blocks[0].body, vec!["  name = \"x\"".to_string()]);
    }

    #[test]
    fn parse_keeps_nested_source_attributes_in_body() {
        let blocks = parse(
            r#"module "vnet" {
  source = "../../"
  image {
    source  = "nested"
    version = "1"
  }
}
"#,
        );

        assert_eq!(blocks[0].source.as_deref(), Some("../../"));
        assert_eq!(blocks[0].version, None);
        assert!(blocks[0].body.iter().any(|l| l.contains("\"nested\"")));
        assert!(blocks[0].body.iter().any(|l| l.contains("version = \"1\"")));
    }

    #[test]
    fn parse_drops_unterminated_block() {
        let blocks = parse(
            r#"module "ok" {
  source = "../../"
}
module "broken" {
  source = "../../"
"#,
        );

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "ok");
    }

    #[test]
    fn parse_ignores_header_with_content_after_brace() {
        let blocks = parse("module \"inline\" { source = \"../../\" }\n");
        assert!(blocks.is_empty());
    }

    #[test]
    fn parse_ignores_braces_in_heredoc() {
        let blocks = parse(
            r#"module "vnet" {
  source = "../../"
  policy = <<EOF
}
EOF
}
"#,
        );

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].end_line, 6);
        assert_eq!(blocks[0].body.len(), 3);
    }

    #[test]
    fn parse_keeps_content_sharing_the_closing_line() {
        let blocks = parse("module \"vnet\" {\n  source = \"../../\"\n  enabled = true }\n");

        assert_eq!(blocks[0].end_line, 3);
        assert_eq!(blocks[0].body, vec!["  enabled = true".to_string()]);
    }

    #[test]
    fn parse_splits_closing_line_at_code_level_brace() {
        let blocks = parse(
            "module \"vnet\" {\n  source = \"../../\"\n  name = \"x\"\n} # end {vnet}\n",
        );

        assert_eq!(blocks[0].end_line, 4);
        assert_eq!(blocks[0].body, vec!["  name = \"x\"".to_string()]);
        assert_eq!(blocks[0].trailer.as_deref(), Some("# end {vnet}"));
    }

    #[test]
    fn parse_reads_attribute_sharing_the_closing_line() {
        let blocks = parse("module \"vnet\" {\n  name = \"x\"\n  source = \"../../\" }\n");

        assert_eq!(blocks[0].source.as_deref(), Some("../../"));
        assert_eq!(blocks[0].body, vec!["  name = \"x\"".to_string()]);
        assert_eq!(blocks[0].trailer, None);
    }

    #[test]
    fn parse_keeps_comment_trailing_an_attribute() {
        let blocks = parse(
            r#"module "vnet" {
  source  = "acme/vnet/azure" # pinned by ops
  version = "~> 2.0" /* previously
  pinned to 1.x */
  name = "x"
}
"#,
        );

        let block = &blocks[0];
        assert_eq!(block.source.as_deref(), Some("acme/vnet/azure"));
        assert_eq!(block.version.as_deref(), Some("~> 2.0"));
        assert_eq!(
            block.body,
            vec![
                "# pinned by ops".to_string(),
                "/* previously".to_string(),
                "  pinned to 1.x */".to_string(),
                "  name = \"x\"".to_string(),
            ]
        );
    }

    #[test]
    fn line_range_covers_header_through_closing_brace() {
        let blocks = parse("\nmodule \"vnet\" {\n  source = \"../../\"\n}\n");
        assert_eq!(blocks[0].line_range(), 1..4);
    }
}
