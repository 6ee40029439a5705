//! Lexical scopes and the variables they hold.
//!
//! Scopes and fields live in two arenas owned by a [`ScopeTree`]; the syntax
//! tree refers to them by id. Scopes point at their parent and list their
//! children, fields point at the scope that owns them.

mod builder;
mod crunch;
mod field;
pub mod resolver;

pub use builder::{bind, ScopeBuilder, PREDEFINED_GLOBALS};
pub use crunch::{crunch_name, CrunchEnumerator};
pub use field::{FieldKind, VariableField};

use crate::ast::visit::{walk_expression, Visitor};
use crate::ast::{Expression, ExpressionKind, Program};
use crate::span::Span;
use id_arena::{Arena, Id};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

pub type ScopeId = Id<ActivationObject>;
pub type FieldId = Id<VariableField>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    /// The block of a `catch` clause, holding the exception parameter.
    Catch,
    /// The body of a `with` statement.
    With,
}

/// Progress of the renaming resolver. Each phase may only run after the
/// one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResolverPhase {
    Unanalyzed,
    ScopeAnalyzed,
    FieldsReserved,
    LiteralsShortcut,
    Renamed,
    GeneratedNamesValidated,
}

#[derive(Debug, Clone)]
pub struct ActivationObject {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Fields in declaration order.
    pub fields: IndexMap<String, FieldId>,
    /// Outer fields whose names this scope must not reuse.
    pub verboten: FxHashSet<FieldId>,
    /// False when code in this scope can look names up at runtime, through
    /// `eval` or `with`.
    pub is_known_at_compile_time: bool,
    pub has_direct_eval: bool,
    /// The field naming the function declaration that owns this scope.
    pub function_field: Option<FieldId>,
    /// Set once the code owning this scope has been removed from the tree.
    pub is_detached: bool,
    pub span: Span,
}

impl ActivationObject {
    fn new(kind: ScopeKind, parent: Option<ScopeId>, span: Span) -> Self {
        ActivationObject {
            kind,
            parent,
            children: Vec::new(),
            fields: IndexMap::new(),
            verboten: FxHashSet::default(),
            is_known_at_compile_time: kind != ScopeKind::With,
            has_direct_eval: false,
            function_field: None,
            is_detached: false,
            span,
        }
    }

    /// Function and global scopes hold `var` and function declarations.
    pub fn is_function_level(&self) -> bool {
        matches!(self.kind, ScopeKind::Function | ScopeKind::Global)
    }
}

#[derive(Debug)]
pub struct ScopeTree {
    scopes: Arena<ActivationObject>,
    fields: Arena<VariableField>,
    global: ScopeId,
    phase: ResolverPhase,
    generated_count: usize,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut scopes = Arena::new();
        let global = scopes.alloc(ActivationObject::new(ScopeKind::Global, None, Span::dummy()));
        ScopeTree {
            scopes,
            fields: Arena::new(),
            global,
            phase: ResolverPhase::Unanalyzed,
            generated_count: 0,
        }
    }

    pub fn global(&self) -> ScopeId {
        self.global
    }

    pub fn scope(&self, id: ScopeId) -> &ActivationObject {
        &self.scopes[id]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut ActivationObject {
        &mut self.scopes[id]
    }

    pub fn field(&self, id: FieldId) -> &VariableField {
        &self.fields[id]
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut VariableField {
        &mut self.fields[id]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn field_ids(&self) -> Vec<FieldId> {
        self.fields.iter().map(|(id, _)| id).collect()
    }

    pub fn phase(&self) -> ResolverPhase {
        self.phase
    }

    /// Moves the resolver to `to`.
    ///
    /// # Panics
    ///
    /// Panics if the resolver is not currently in `from`.
    pub fn advance_phase(&mut self, from: ResolverPhase, to: ResolverPhase) {
        assert_eq!(
            self.phase, from,
            "resolver phase {:?} requested while in {:?}",
            to, self.phase
        );
        self.phase = to;
    }

    pub fn create_scope(&mut self, kind: ScopeKind, parent: ScopeId, span: Span) -> ScopeId {
        let id = self.scopes.alloc(ActivationObject::new(kind, Some(parent), span));
        self.scopes[parent].children.push(id);
        id
    }

    /// Returns the field named `name` in `scope`, creating it with `kind` if
    /// absent.
    pub fn declare_field(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: FieldKind,
        span: Span,
    ) -> FieldId {
        if let Some(existing) = self.lookup_local(scope, name) {
            return existing;
        }
        let id = self.fields.alloc(VariableField::new(name, kind, scope, span));
        self.scopes[scope].fields.insert(name.to_string(), id);
        id
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<FieldId> {
        self.scopes[scope].fields.get(name).copied()
    }

    /// Searches `scope` and its ancestors, innermost first.
    pub fn find_visible(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, FieldId)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(field) = self.lookup_local(id, name) {
                return Some((id, field));
            }
            current = self.scopes[id].parent;
        }
        None
    }

    /// Records in `scope` a reference to `outer`, declared further out.
    pub fn create_alias(&mut self, scope: ScopeId, outer: FieldId) -> FieldId {
        let name = self.fields[outer].name.clone();
        if let Some(existing) = self.lookup_local(scope, &name) {
            return existing;
        }
        let kind = self.fields[outer].kind;
        let span = self.fields[outer].span;
        let mut field = VariableField::new(name.clone(), kind, scope, span);
        field.outer_field = Some(outer);
        field.can_crunch = false;
        let id = self.fields.alloc(field);
        self.scopes[scope].fields.insert(name, id);
        id
    }

    /// The declaring field at the end of an alias chain.
    pub fn ultimate(&self, field: FieldId) -> FieldId {
        let mut current = field;
        while let Some(outer) = self.fields[current].outer_field {
            current = outer;
        }
        current
    }

    /// The name a field is emitted as.
    pub fn display_name(&self, field: FieldId) -> &str {
        let ultimate = &self.fields[self.ultimate(field)];
        ultimate.crunched_name.as_deref().unwrap_or(&ultimate.name)
    }

    pub fn add_reference(&mut self, field: FieldId) {
        let mut current = Some(field);
        while let Some(id) = current {
            self.fields[id].ref_count += 1;
            current = self.fields[id].outer_field;
        }
    }

    pub fn remove_reference(&mut self, field: FieldId) {
        let mut current = Some(field);
        while let Some(id) = current {
            let f = &mut self.fields[id];
            f.ref_count = f.ref_count.saturating_sub(1);
            current = f.outer_field;
        }
    }

    /// References to the variable behind `field`, from anywhere.
    pub fn total_references(&self, field: FieldId) -> usize {
        self.fields[self.ultimate(field)].ref_count
    }

    /// Recomputes every reference count from the identifiers in `program`.
    pub fn recount_references(&mut self, program: &Program) {
        for (_, field) in self.fields.iter_mut() {
            field.ref_count = 0;
        }
        let mut counter = ReferenceCounter { tree: self };
        counter.visit_program(program);
    }

    /// Marks the declaring field of `alias` as off-limits in every scope
    /// from the alias's own up to, but excluding, the declaring scope.
    pub fn reserve_alias(&mut self, alias: FieldId) {
        let ultimate = self.ultimate(alias);
        let declaring_scope = self.fields[ultimate].scope;
        let mut current = Some(self.fields[alias].scope);
        while let Some(id) = current {
            if id == declaring_scope {
                break;
            }
            self.scopes[id].verboten.insert(ultimate);
            current = self.scopes[id].parent;
        }
    }

    /// A synthesized local in `scope`, free to take any unused name.
    pub fn create_generated_field(&mut self, scope: ScopeId) -> FieldId {
        // Spaces cannot appear in source names, so this never collides.
        let name = format!("generated {}", self.generated_count);
        self.generated_count += 1;
        let id = self.declare_field(scope, &name, FieldKind::Local, Span::dummy());
        let field = &mut self.fields[id];
        field.is_generated = true;
        field.is_declared = true;
        id
    }

    pub fn is_ancestor_or_self(&self, ancestor: ScopeId, scope: ScopeId) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.scopes[id].parent;
        }
        false
    }

    /// The nearest enclosing function or global scope.
    pub fn function_scope_of(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        while !self.scopes[current].is_function_level() {
            match self.scopes[current].parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// All scopes, parents before children.
    pub fn scopes_top_down(&self) -> Vec<ScopeId> {
        let mut order = Vec::with_capacity(self.scopes.len());
        let mut stack = vec![self.global];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.scopes[id].children.iter().rev());
        }
        order
    }

    /// All scopes, children before parents.
    pub fn scopes_bottom_up(&self) -> Vec<ScopeId> {
        let mut order = self.scopes_top_down();
        order.reverse();
        order
    }

    /// `scope` and every scope nested in it.
    pub fn subtree(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut order = Vec::new();
        let mut stack = vec![scope];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.scopes[id].children.iter().rev());
        }
        order
    }

    /// Marks `scope` and everything below it as no longer in the program.
    pub fn detach(&mut self, scope: ScopeId) {
        for id in self.subtree(scope) {
            self.scopes[id].is_detached = true;
        }
    }

    /// Alias fields grouped by the field they ultimately refer to.
    pub fn aliases_by_ultimate(&self) -> FxHashMap<FieldId, Vec<FieldId>> {
        let mut map: FxHashMap<FieldId, Vec<FieldId>> = FxHashMap::default();
        for (id, field) in self.fields.iter() {
            if field.is_alias() {
                map.entry(self.ultimate(id)).or_default().push(id);
            }
        }
        map
    }
}

struct ReferenceCounter<'a> {
    tree: &'a mut ScopeTree,
}

impl Visitor for ReferenceCounter<'_> {
    fn visit_expression(&mut self, expr: &Expression) {
        if let ExpressionKind::Identifier(ident) = &expr.kind {
            if let Some(field) = ident.field {
                self.tree.add_reference(field);
            }
        }
        walk_expression(self, expr);
    }
}
