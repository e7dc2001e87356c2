//! Per-file bounce transformation
//!
//! Parses a file into module blocks, decides per block whether the mode
//! applies, re-renders qualifying blocks and splices them back between the
//! untouched lines.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::RegistryConfig;
use crate::error::BounceError;
use crate::parser::{ModuleBlock, ModuleBlockParser};
use crate::render::render;
use crate::repository::RepositoryIdentity;
use crate::source::{SourceDescriptor, render_local, render_published};
use crate::version::error::RegistryError;
use crate::version::registry::{Registry, RegistryCoordinates};
use crate::version::semver::format_constraint;

/// Which blocks to rewrite and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BounceMode {
    /// Point this project's module at the local tree
    ToLocal { expected_base: String },
    /// Point this project's module at its published location
    ToRegistry {
        expected_base: String,
        coordinates: RegistryCoordinates,
    },
    /// Refresh the version of every module from the configured publisher
    ToRegistryAll {
        prefixes: Vec<String>,
        default_host: String,
    },
}

impl BounceMode {
    pub fn to_local(identity: &RepositoryIdentity, config: &RegistryConfig) -> Self {
        BounceMode::ToLocal {
            expected_base: identity.expected_base(config),
        }
    }

    pub fn to_registry(identity: &RepositoryIdentity, config: &RegistryConfig) -> Self {
        BounceMode::ToRegistry {
            expected_base: identity.expected_base(config),
            coordinates: identity.coordinates(config),
        }
    }

    pub fn to_registry_all(config: &RegistryConfig) -> Self {
        BounceMode::ToRegistryAll {
            prefixes: config.published_prefixes(),
            default_host: config.host(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BounceMode::ToLocal { .. } => "local",
            BounceMode::ToRegistry { .. } => "registry",
            BounceMode::ToRegistryAll { .. } => "registry-all",
        }
    }
}

/// Why a qualifying block was left untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The module has no published version (yet)
    NotFound,
    /// The source could not be split into registry coordinates
    InvalidSource,
    /// Network failure, unexpected status or unusable response
    Transient(String),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NotFound => f.write_str("not published"),
            UnresolvedReason::InvalidSource => f.write_str("invalid source"),
            UnresolvedReason::Transient(message) => write!(f, "registry error: {}", message),
        }
    }
}

/// Qualifying block that could not be rewritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedBlock {
    pub name: String,
    /// Header line (1-indexed)
    pub line: usize,
    /// Coordinates or source that failed to resolve
    pub target: String,
    pub reason: UnresolvedReason,
}

impl UnresolvedBlock {
    fn from_error(block: &ModuleBlock, target: String, err: &RegistryError) -> Self {
        let reason = match err {
            RegistryError::NotFound(_) => UnresolvedReason::NotFound,
            err if err.is_transient() => UnresolvedReason::Transient(err.to_string()),
            _ => UnresolvedReason::InvalidSource,
        };
        Self {
            name: block.name.clone(),
            line: block.start_line,
            target,
            reason,
        }
    }
}

/// Result of transforming one file's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformation {
    pub content: String,
    pub changed: bool,
    pub unresolved: Vec<UnresolvedBlock>,
}

/// Outcome of processing one file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub changed: bool,
    pub unresolved: Vec<UnresolvedBlock>,
}

enum BlockAction {
    Keep,
    Rewrite {
        source: String,
        version: Option<String>,
    },
    Unresolved(UnresolvedBlock),
}

pub struct Transformer {
    parser: ModuleBlockParser,
    registry: Arc<dyn Registry>,
}

impl Transformer {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            parser: ModuleBlockParser::new(),
            registry,
        }
    }

    /// Read, transform and (when changed) write back a file
    pub fn process_file(
        &self,
        path: &Path,
        mode: &BounceMode,
        dry_run: bool,
    ) -> Result<FileReport, BounceError> {
        let content = fs::read_to_string(path).map_err(|source| BounceError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let transformation = self.transform(&content, mode);

        if transformation.changed && !dry_run {
            fs::write(path, &transformation.content).map_err(|source| {
                BounceError::FileWrite {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            info!("Updated {} ({})", path.display(), mode.name());
        } else {
            debug!(
                "{} {}",
                if transformation.changed {
                    "Would update"
                } else {
                    "No changes for"
                },
                path.display()
            );
        }

        Ok(FileReport {
            path: path.to_path_buf(),
            changed: transformation.changed,
            unresolved: transformation.unresolved,
        })
    }

    /// Transform file content; never fails, unresolvable blocks stay as they are
    pub fn transform(&self, content: &str, mode: &BounceMode) -> Transformation {
        let line_ending = if content.contains("\r\n") { "\r\n" } else { "\n" };
        let lines: Vec<&str> = content.lines().collect();
        let blocks = self.parser.parse(&lines);

        let mut output: Vec<String> = Vec::with_capacity(lines.len());
        let mut unresolved = Vec::new();
        let mut changed = false;
        let mut cursor = 0;

        for block in &blocks {
            let range = block.line_range();
            output.extend(lines[cursor..range.start].iter().map(|l| l.to_string()));
            let original = &lines[range.clone()];

            match self.plan(block, mode) {
                BlockAction::Rewrite { source, version } => {
                    let rendered = render(block, &source, version.as_deref());
                    if !rendered.iter().map(String::as_str).eq(original.iter().copied()) {
                        debug!("Rewriting module \"{}\" at line {}", block.name, block.start_line);
                        changed = true;
                    }
                    output.extend(rendered);
                }
                BlockAction::Keep => {
                    output.extend(original.iter().map(|l| l.to_string()));
                }
                BlockAction::Unresolved(entry) => {
                    output.extend(original.iter().map(|l| l.to_string()));
                    unresolved.push(entry);
                }
            }

            cursor = range.end;
        }
        output.extend(lines[cursor..].iter().map(|l| l.to_string()));

        let mut new_content = output.join(line_ending);
        if content.ends_with('\n') {
            new_content.push_str(line_ending);
        }

        Transformation {
            content: new_content,
            changed,
            unresolved,
        }
    }

    fn plan(&self, block: &ModuleBlock, mode: &BounceMode) -> BlockAction {
        let descriptor = block.descriptor();

        match mode {
            BounceMode::ToLocal { expected_base } => match &descriptor {
                Some(d) if owned_by(d, expected_base) => BlockAction::Rewrite {
                    source: render_local(d.subpath()),
                    version: None,
                },
                _ => BlockAction::Keep,
            },
            BounceMode::ToRegistry {
                expected_base,
                coordinates,
            } => {
                match (&descriptor, &block.commented_source) {
                    (Some(d), _) if !owned_by(d, expected_base) => return BlockAction::Keep,
                    (None, Some(commented)) => debug!(
                        "Module \"{}\" at line {} only has a commented source ({}), treating it as missing",
                        block.name, block.start_line, commented
                    ),
                    _ => {}
                }

                let subpath = descriptor.as_ref().and_then(|d| d.subpath());
                match self.constraint(block, coordinates) {
                    Ok(version) => BlockAction::Rewrite {
                        source: render_published(expected_base, subpath),
                        version: Some(version),
                    },
                    Err(entry) => BlockAction::Unresolved(entry),
                }
            }
            BounceMode::ToRegistryAll {
                prefixes,
                default_host,
            } => {
                let Some(base) = descriptor.as_ref().and_then(SourceDescriptor::base) else {
                    return BlockAction::Keep;
                };
                if !prefixes.iter().any(|prefix| base.starts_with(prefix.as_str())) {
                    return BlockAction::Keep;
                }

                let coordinates = match RegistryCoordinates::from_base(base, default_host) {
                    Ok(coordinates) => coordinates,
                    Err(err) => {
                        warn!(
                            "Skipping module \"{}\" at line {}: {}",
                            block.name, block.start_line, err
                        );
                        return BlockAction::Unresolved(UnresolvedBlock::from_error(
                            block,
                            base.to_string(),
                            &err,
                        ));
                    }
                };

                match self.constraint(block, &coordinates) {
                    Ok(version) => BlockAction::Rewrite {
                        source: block.source.clone().unwrap_or_default(),
                        version: Some(version),
                    },
                    Err(entry) => BlockAction::Unresolved(entry),
                }
            }
        }
    }

    /// Version constraint for the latest release at `coordinates`
    fn constraint(
        &self,
        block: &ModuleBlock,
        coordinates: &RegistryCoordinates,
    ) -> Result<String, UnresolvedBlock> {
        let result = self.registry.latest_version(coordinates).and_then(|latest| {
            format_constraint(&latest.version, latest.major).map_err(RegistryError::from)
        });

        result.map_err(|err| {
            match &err {
                RegistryError::NotFound(_) => warn!(
                    "Module \"{}\" at line {} left unchanged: {} is not published",
                    block.name, block.start_line, coordinates
                ),
                _ => error!(
                    "Module \"{}\" at line {} left unchanged: failed to resolve {}: {}",
                    block.name, block.start_line, coordinates, err
                ),
            }
            UnresolvedBlock::from_error(block, coordinates.to_string(), &err)
        })
    }
}

/// Source already pointing at this project's module, locally or published
fn owned_by(descriptor: &SourceDescriptor, expected_base: &str) -> bool {
    descriptor.is_local() || descriptor.base() == Some(expected_base)
}
