//! Module source classification
//!
//! Two shapes are recognized:
//! - Local: `../../` optionally followed by a sub-path (`../../modules/subnet/`)
//! - Published: registry coordinates optionally followed by `//<subpath>`
//!   (`acme/vnet/azurerm//modules/subnet`)
//!
//! Anything else is treated as a published base so unknown shapes pass through.

use std::fmt;

/// Root of the project's own tree as seen from a module example
pub const LOCAL_ROOT: &str = "../../";

const SUBPATH_SEPARATOR: &str = "//";

/// Classified module source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    Local {
        subpath: Option<String>,
    },
    Published {
        base: String,
        subpath: Option<String>,
    },
}

impl SourceDescriptor {
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();

        if let Some(rest) = local_remainder(raw) {
            return SourceDescriptor::Local {
                subpath: normalize_subpath(rest),
            };
        }

        match split_subpath(raw) {
            Some((base, subpath)) => SourceDescriptor::Published {
                base: base.trim_end_matches('/').to_string(),
                subpath: normalize_subpath(subpath),
            },
            None => SourceDescriptor::Published {
                base: raw.trim_end_matches('/').to_string(),
                subpath: None,
            },
        }
    }

    pub fn subpath(&self) -> Option<&str> {
        match self {
            SourceDescriptor::Local { subpath } | SourceDescriptor::Published { subpath, .. } => {
                subpath.as_deref()
            }
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, SourceDescriptor::Local { .. })
    }

    /// Published base, if any
    pub fn base(&self) -> Option<&str> {
        match self {
            SourceDescriptor::Published { base, .. } => Some(base),
            SourceDescriptor::Local { .. } => None,
        }
    }

    /// Raw source string for this descriptor
    pub fn render(&self) -> String {
        match self {
            SourceDescriptor::Local { subpath } => render_local(subpath.as_deref()),
            SourceDescriptor::Published { base, subpath } => {
                render_published(base, subpath.as_deref())
            }
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// `../../` or `../../<subpath>/`
pub fn render_local(subpath: Option<&str>) -> String {
    match subpath {
        Some(subpath) => format!("{}{}/", LOCAL_ROOT, subpath),
        None => LOCAL_ROOT.to_string(),
    }
}

/// `<base>` or `<base>//<subpath>`
pub fn render_published(base: &str, subpath: Option<&str>) -> String {
    match subpath {
        Some(subpath) => format!("{}{}{}", base, SUBPATH_SEPARATOR, subpath),
        None => base.to_string(),
    }
}

/// Text after the local root, if `raw` points into the project's own tree
fn local_remainder(raw: &str) -> Option<&str> {
    if raw == "../.." {
        return Some("");
    }
    raw.strip_prefix(LOCAL_ROOT)
}

/// Split at the first `//` that is not part of a URL scheme (`https://`)
fn split_subpath(raw: &str) -> Option<(&str, &str)> {
    let mut search_from = 0;
    while let Some(offset) = raw[search_from..].find(SUBPATH_SEPARATOR) {
        let idx = search_from + offset;
        if idx > 0 && raw.as_bytes()[idx - 1] == b':' {
            search_from = idx + SUBPATH_SEPARATOR.len();
            continue;
        }
        return Some((&raw[..idx], &raw[idx + SUBPATH_SEPARATOR.len()..]));
    }
    None
}

fn normalize_subpath(subpath: &str) -> Option<String> {
    let trimmed = subpath.trim_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
