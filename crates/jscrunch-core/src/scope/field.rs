use super::{FieldId, ScopeId};
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `var`, function declaration, catch parameter, or synthesized shortcut.
    Local,
    Argument,
    /// The implicit `arguments` object of a function.
    Arguments,
    /// The name of a named function expression, visible only inside it.
    NamedFunctionExpression,
    /// Referenced but never declared.
    Global,
    /// Supplied by the host environment.
    Predefined,
}

/// A variable as known to one scope.
///
/// A field with `outer_field` set is an alias: the same variable declared
/// further out, recorded here because this scope references it.
#[derive(Debug, Clone)]
pub struct VariableField {
    pub name: String,
    pub kind: FieldKind,
    pub scope: ScopeId,
    pub outer_field: Option<FieldId>,
    /// References to this field, counted along alias chains so the
    /// declaring field carries the total.
    pub ref_count: usize,
    pub can_crunch: bool,
    pub crunched_name: Option<String>,
    pub is_declared: bool,
    pub is_function: bool,
    pub is_ambiguous: bool,
    pub is_generated: bool,
    /// Zero-based parameter index for arguments.
    pub position: Option<usize>,
    pub span: Span,
}

impl VariableField {
    pub fn new(name: impl Into<String>, kind: FieldKind, scope: ScopeId, span: Span) -> Self {
        VariableField {
            name: name.into(),
            kind,
            scope,
            outer_field: None,
            ref_count: 0,
            can_crunch: matches!(
                kind,
                FieldKind::Local | FieldKind::Argument | FieldKind::NamedFunctionExpression
            ),
            crunched_name: None,
            is_declared: false,
            is_function: false,
            is_ambiguous: false,
            is_generated: false,
            position: None,
            span,
        }
    }

    pub fn is_alias(&self) -> bool {
        self.outer_field.is_some()
    }

    pub fn is_global_kind(&self) -> bool {
        matches!(self.kind, FieldKind::Global | FieldKind::Predefined)
    }
}
