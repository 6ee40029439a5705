use crate::span::Span;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

/// What was detected. The core never stops on any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    SyntaxError,
    UnusedVariable,
    UnusedArgument,
    UnusedFunction,
    AmbiguousNamedFunctionExpression,
    DuplicateDeclaration,
    UndeclaredVariable,
    UndeclaredFunction,
    RedundantDefault,
    RedundantCase,
    UnreachableCode,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::SyntaxError => "JS1001",
            DiagnosticCode::UnusedVariable => "JS1101",
            DiagnosticCode::UnusedArgument => "JS1102",
            DiagnosticCode::UnusedFunction => "JS1103",
            DiagnosticCode::AmbiguousNamedFunctionExpression => "JS1110",
            DiagnosticCode::DuplicateDeclaration => "JS1111",
            DiagnosticCode::UndeclaredVariable => "JS1120",
            DiagnosticCode::UndeclaredFunction => "JS1121",
            DiagnosticCode::RedundantDefault => "JS1130",
            DiagnosticCode::RedundantCase => "JS1131",
            DiagnosticCode::UnreachableCode => "JS1140",
        }
    }

    /// Severity used when a code is reported without an explicit level.
    pub fn default_level(self) -> DiagnosticLevel {
        match self {
            DiagnosticCode::SyntaxError => DiagnosticLevel::Error,
            DiagnosticCode::AmbiguousNamedFunctionExpression
            | DiagnosticCode::DuplicateDeclaration
            | DiagnosticCode::UndeclaredFunction
            | DiagnosticCode::UndeclaredVariable => DiagnosticLevel::Warning,
            _ => DiagnosticLevel::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic message with location and severity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: DiagnosticCode,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            level: code.default_level(),
            code,
            span,
            message: message.into(),
        }
    }

    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            code: DiagnosticCode::SyntaxError,
            span,
            message: message.into(),
        }
    }

    pub fn with_level(mut self, level: DiagnosticLevel) -> Self {
        self.level = level;
        self
    }
}

/// Trait for handling diagnostics
/// This allows for dependency injection and testing with mock handlers
pub trait DiagnosticHandler: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    fn emit(&self, code: DiagnosticCode, span: Span, message: &str) {
        self.report(Diagnostic::new(code, span, message));
    }

    fn error(&self, span: Span, message: &str) {
        self.report(Diagnostic::error(span, message));
    }

    fn has_errors(&self) -> bool;
    fn error_count(&self) -> usize;
    fn warning_count(&self) -> usize;
    fn get_diagnostics(&self) -> Vec<Diagnostic>;
}

fn lock(diagnostics: &Mutex<Vec<Diagnostic>>) -> MutexGuard<'_, Vec<Diagnostic>> {
    diagnostics.lock().unwrap_or_else(PoisonError::into_inner)
}

fn count_level(diagnostics: &Mutex<Vec<Diagnostic>>, level: DiagnosticLevel) -> usize {
    lock(diagnostics).iter().filter(|d| d.level == level).count()
}

/// Console-based diagnostic handler that prints to stderr
pub struct ConsoleDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
    pretty: bool,
    min_level: DiagnosticLevel,
}

impl ConsoleDiagnosticHandler {
    pub fn new(pretty: bool) -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            pretty,
            min_level: DiagnosticLevel::Warning,
        }
    }

    /// Only print diagnostics at least this severe; everything is still recorded.
    pub fn with_min_level(mut self, level: DiagnosticLevel) -> Self {
        self.min_level = level;
        self
    }
}

impl DiagnosticHandler for ConsoleDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.level <= self.min_level {
            let level_str = match diagnostic.level {
                DiagnosticLevel::Error => "error",
                DiagnosticLevel::Warning => "warning",
                DiagnosticLevel::Info => "info",
            };

            if self.pretty {
                eprintln!(
                    "\x1b[1m{}[{}]\x1b[0m at {}: {}",
                    level_str, diagnostic.code, diagnostic.span, diagnostic.message
                );
            } else {
                eprintln!(
                    "{}[{}] at {}: {}",
                    level_str, diagnostic.code, diagnostic.span, diagnostic.message
                );
            }
        }

        lock(&self.diagnostics).push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Warning)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        lock(&self.diagnostics).clone()
    }
}

/// Collecting diagnostic handler for testing
/// Collects all diagnostics without printing
pub struct CollectingDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnosticHandler {
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// All collected diagnostics carrying the given code.
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<Diagnostic> {
        lock(&self.diagnostics)
            .iter()
            .filter(|d| d.code == code)
            .cloned()
            .collect()
    }
}

impl Default for CollectingDiagnosticHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        lock(&self.diagnostics).push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Warning)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        lock(&self.diagnostics).clone()
    }
}
