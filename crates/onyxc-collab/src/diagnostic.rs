//! The error queue collaborators report into. Collaborators never
//! throw: they push a `Diagnostic` and, if it's fatal for the entity they're
//! looking at, set that entity's state to `Failed` themselves.

use onyxc_text::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub position: Position,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Queues diagnostics behind an enable/disable toggle: speculative
/// phases (path probing, forward-reference retries) can probe without
/// polluting the reported error set.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    enabled: bool,
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            enabled: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Report a diagnostic. Dropped silently if reporting is disabled
    /// (speculative probing).
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if !self.enabled {
            return;
        }
        tracing::debug!(
            target: "driver.dispatch",
            severity = ?diagnostic.severity,
            position = %diagnostic.position,
            message = %diagnostic.message,
            "diagnostic_reported"
        );
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}
