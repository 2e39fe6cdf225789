//! Name rewriting for materials and mesh nodes.
//!
//! Literal mode matches materials by exact name but mesh nodes by substring
//! (first occurrence only). Regex mode replaces every match in either case.
//! Each operation scans every entity, so all matching entities are renamed,
//! and operations run in order against the names left by earlier ones.

use std::fmt;
use regex::Regex;
use tracing::debug;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Material,
    Mesh,
}

impl EntityKind {
    /// Capitalized label used in outcome messages.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Material => "Material",
            EntityKind::Mesh => "Mesh",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntityKind::Material => f.write_str("material"),
            EntityKind::Mesh => f.write_str("mesh"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    Literal,
    Regex,
}

impl Default for MatchMode {
    fn default() -> MatchMode {
        MatchMode::Literal
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameOperation {
    pub kind: EntityKind,
    pub old: String,
    pub new: String,
}

impl RenameOperation {
    pub fn new(kind: EntityKind, old: impl Into<String>, new: impl Into<String>) -> RenameOperation {
        RenameOperation {
            kind,
            old: old.into(),
            new: new.into(),
        }
    }

    pub fn material(old: impl Into<String>, new: impl Into<String>) -> RenameOperation {
        RenameOperation::new(EntityKind::Material, old, new)
    }

    pub fn mesh(old: impl Into<String>, new: impl Into<String>) -> RenameOperation {
        RenameOperation::new(EntityKind::Mesh, old, new)
    }
}


/// Outcome of rewriting one name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub new_name: String,
    /// `new_name != current`
    pub changed: bool,
    /// The pattern hit, even if the rewrite left the name as it was.
    pub matched: bool,
    /// Pattern compilation failure; the name is left untouched.
    pub error: Option<String>,
}

impl Resolution {
    fn unchanged(current: &str) -> Resolution {
        Resolution {
            new_name: current.to_owned(),
            changed: false,
            matched: false,
            error: None,
        }
    }
}

/// Computes the new name for `current` under `op`.
pub fn resolve(current: &str, op: &RenameOperation, mode: MatchMode) -> Resolution {
    match Matcher::compile(op, mode) {
        Ok(m) => m.resolve(current),
        Err(e) => Resolution {
            error: Some(describe(&e)),
            ..Resolution::unchanged(current)
        },
    }
}

/// Regex syntax errors render over several lines with a caret diagram;
/// keep only the final diagnosis.
fn describe(e: &regex::Error) -> String {
    let text = e.to_string();
    let last = text.lines().last().unwrap_or("");
    last.trim_start_matches("error: ").to_owned()
}


/// An operation's pattern, compiled once and applied to many names.
pub struct Matcher<'a> {
    pattern: Pattern<'a>,
    replacement: &'a str,
}

enum Pattern<'a> {
    Exact(&'a str),
    Substring(&'a str),
    Regex(Regex),
}

impl<'a> Matcher<'a> {
    pub fn compile(op: &'a RenameOperation, mode: MatchMode) -> Result<Matcher<'a>, regex::Error> {
        let pattern = match (mode, op.kind) {
            (MatchMode::Regex, _) => Pattern::Regex(Regex::new(&op.old)?),
            (MatchMode::Literal, EntityKind::Material) => Pattern::Exact(&op.old),
            (MatchMode::Literal, EntityKind::Mesh) => Pattern::Substring(&op.old),
        };
        Ok(Matcher {
            pattern,
            replacement: &op.new,
        })
    }

    /// Returns the rewritten name, or `None` if the pattern does not match.
    pub fn rewrite(&self, name: &str) -> Option<String> {
        match self.pattern {
            Pattern::Exact(old) => {
                if name == old { Some(self.replacement.to_owned()) } else { None }
            },
            Pattern::Substring(old) => {
                name.find(old).map(|_| name.replacen(old, self.replacement, 1))
            },
            Pattern::Regex(ref re) => {
                if re.is_match(name) {
                    Some(re.replace_all(name, self.replacement).into_owned())
                } else {
                    None
                }
            },
        }
    }

    pub fn resolve(&self, current: &str) -> Resolution {
        match self.rewrite(current) {
            Some(new_name) => Resolution {
                changed: new_name != current,
                matched: true,
                new_name,
                error: None,
            },
            None => Resolution::unchanged(current),
        }
    }
}


/// A renameable scene entity.
pub trait Named {
    /// Current name; unnamed entities read as `""`.
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenameEvent {
    Renamed { from: String, to: String },
    RegexError { name: String, message: String },
}

/// Everything one operation did to the scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationReport {
    pub operation: RenameOperation,
    pub events: Vec<RenameEvent>,
    /// Number of entities the pattern hit.
    pub matched: usize,
}

impl OperationReport {
    /// No entity matched during the whole scan.
    pub fn not_found(&self) -> bool {
        self.matched == 0
    }

    pub fn renamed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.events.iter().filter_map(|e| match e {
            RenameEvent::Renamed { from, to } => Some((from.as_str(), to.as_str())),
            _ => None,
        })
    }

    /// Human-readable outcome lines, in scan order, with the "not found"
    /// line (if any) last.
    pub fn messages(&self) -> Vec<String> {
        let kind = self.operation.kind;
        let mut out = self.events.iter().map(|e| match e {
            RenameEvent::Renamed { from, to } =>
                format!("{} '{}' renamed to '{}'.", kind.label(), from, to),
            RenameEvent::RegexError { name, message } =>
                format!("Regex error for {} '{}': {}", kind, name, message),
        }).collect::<Vec<_>>();
        if self.not_found() {
            out.push(format!("{} with name '{}' not found.", kind.label(), self.operation.old));
        }
        out
    }
}

/// Runs `op` over `entities` in enumeration order, renaming every match in
/// place.
pub fn apply_operation<'e, N, I>(entities: I, op: &RenameOperation, mode: MatchMode) -> OperationReport
where
    N: Named + 'e,
    I: IntoIterator<Item = &'e mut N>,
{
    let mut report = OperationReport {
        operation: op.clone(),
        events: Vec::new(),
        matched: 0,
    };

    let matcher = Matcher::compile(op, mode);
    for entity in entities {
        let current = entity.name().to_owned();
        let resolution = match matcher {
            Ok(ref m) => m.resolve(&current),
            Err(ref e) => Resolution {
                error: Some(describe(e)),
                ..Resolution::unchanged(&current)
            },
        };

        if let Some(message) = resolution.error {
            debug!("{} '{}': bad pattern '{}'", op.kind, current, op.old);
            report.events.push(RenameEvent::RegexError { name: current, message });
            continue;
        }
        if resolution.matched {
            report.matched += 1;
        }
        if resolution.changed {
            debug!("{} '{}' -> '{}'", op.kind, current, resolution.new_name);
            entity.set_name(resolution.new_name.clone());
            report.events.push(RenameEvent::Renamed {
                from: current,
                to: resolution.new_name,
            });
        }
    }

    report
}
