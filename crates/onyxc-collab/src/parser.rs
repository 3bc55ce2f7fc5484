//! The minimal parser: a line-oriented lexer recognizing just enough
//! syntax to drive real scheduling behavior against real text, without
//! implementing the full grammar (explicitly out of scope).
//!
//! Recognized forms, one per line (blank lines and `//` comments skipped):
//!   use "path";
//!   use_all "path";
//!   use_all_recursive "path";
//!   #load_path "path";
//!   name :: expression
//! Anything else becomes a generic declaration with no recorded
//! dependencies, so it resolves on first sight.

use onyxc_entity::{EntityKind, EntityPayload, EntityTemplate};
use onyxc_registries::{PackageId, ScopeId};
use onyxc_text::{Position, SourceFile};

pub trait Parser: Send + Sync {
    fn name(&self) -> &'static str;

    /// Parse one absorbed source file into the entities it declares
    ///. The caller owns pushing the result into the heap.
    fn parse(
        &mut self,
        source: &SourceFile,
        scope: ScopeId,
        package: Option<PackageId>,
    ) -> Vec<EntityTemplate>;
}

#[derive(Debug, Default)]
pub struct MinimalParser;

impl MinimalParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for MinimalParser {
    fn name(&self) -> &'static str {
        "minimal-line-parser"
    }

    fn parse(
        &mut self,
        source: &SourceFile,
        scope: ScopeId,
        package: Option<PackageId>,
    ) -> Vec<EntityTemplate> {
        let mut entities = Vec::new();
        let mut offset = 0usize;
        for raw_line in source.text.split_inclusive('\n') {
            let line = raw_line.trim_end_matches('\n').trim_end_matches('\r');
            let trimmed = line.trim();
            let position = source.position_at(offset);
            if !trimmed.is_empty() && !trimmed.starts_with("//") {
                if let Some(entity) = parse_line(trimmed, scope, package, position) {
                    entities.push(entity);
                }
            }
            offset += raw_line.len();
        }
        tracing::trace!(
            target: "driver.dispatch",
            path = %source.path.display(),
            entities = entities.len(),
            "file_parsed"
        );
        entities
    }
}

fn parse_line(
    line: &str,
    scope: ScopeId,
    package: Option<PackageId>,
    position: Position,
) -> Option<EntityTemplate> {
    let line = line.strip_suffix(';').unwrap_or(line).trim();

    if let Some(rest) = line.strip_prefix("use_all_recursive") {
        return quoted_argument(rest).map(|name| {
            template(
                EntityKind::LoadAll,
                EntityPayload::LoadAll {
                    name,
                    recursive: true,
                },
                scope,
                package,
                position,
            )
        });
    }
    if let Some(rest) = line.strip_prefix("use_all") {
        return quoted_argument(rest).map(|name| {
            template(
                EntityKind::LoadAll,
                EntityPayload::LoadAll {
                    name,
                    recursive: false,
                },
                scope,
                package,
                position,
            )
        });
    }
    if let Some(rest) = line.strip_prefix("use") {
        return quoted_argument(rest).map(|name| {
            template(
                EntityKind::LoadFile,
                EntityPayload::LoadFile { name },
                scope,
                package,
                position,
            )
        });
    }
    if let Some(rest) = line.strip_prefix("#load_path") {
        return quoted_argument(rest).map(|name| {
            template(
                EntityKind::LoadPath,
                EntityPayload::LoadPath { name },
                scope,
                package,
                position,
            )
        });
    }
    if let Some((name, value)) = line.split_once("::") {
        let name = name.trim();
        if is_identifier(name) {
            let depends_on = extract_identifiers(value.trim());
            return Some(template(
                EntityKind::Binding,
                EntityPayload::Declaration {
                    name: name.to_string(),
                    depends_on,
                },
                scope,
                package,
                position,
            ));
        }
    }
    Some(template(
        EntityKind::Note,
        EntityPayload::Opaque,
        scope,
        package,
        position,
    ))
}

/// Entities produced straight off the text are already "parsed": load-type
/// entities still need the Load Expander to resolve and absorb their
/// target, so they enter at `Parse`; everything else is ready for symbol
/// introduction.
fn template(
    kind: EntityKind,
    payload: EntityPayload,
    scope: ScopeId,
    package: Option<PackageId>,
    position: Position,
) -> EntityTemplate {
    use onyxc_entity::EntityState;
    let state = match payload {
        EntityPayload::LoadFile { .. }
        | EntityPayload::LoadAll { .. }
        | EntityPayload::LoadPath { .. } => EntityState::Parse,
        _ => EntityState::IntroduceSymbols,
    };
    EntityTemplate {
        kind,
        state,
        package,
        scope,
        payload,
        position,
        source_span: None,
    }
}

fn quoted_argument(rest: &str) -> Option<String> {
    let rest = rest.trim();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Pull out words that look like identifiers a declaration's value might
/// reference, so the minimal Symbol Resolver has something concrete
/// to wait on.
fn extract_identifiers(value: &str) -> Vec<String> {
    value
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| is_identifier(w))
        .map(|w| w.to_string())
        .collect()
}
