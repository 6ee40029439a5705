use super::{FieldKind, ScopeId, ScopeKind, ScopeTree};
use crate::ast::visit::{walk_expression_mut, walk_statement_mut, VisitMut};
use crate::ast::*;
use crate::config::{CodeSettings, EvalTreatment};
use crate::diagnostics::{DiagnosticCode, DiagnosticHandler};
use tracing::debug;

/// Names the host environment provides. References to them are not
/// reported as undeclared.
pub const PREDEFINED_GLOBALS: &[&str] = &[
    "ActiveXObject",
    "Array",
    "Boolean",
    "Date",
    "Error",
    "EvalError",
    "Function",
    "Infinity",
    "JSON",
    "Math",
    "NaN",
    "Number",
    "Object",
    "RangeError",
    "ReferenceError",
    "RegExp",
    "String",
    "SyntaxError",
    "TypeError",
    "URIError",
    "XMLHttpRequest",
    "alert",
    "clearInterval",
    "clearTimeout",
    "confirm",
    "console",
    "decodeURI",
    "decodeURIComponent",
    "document",
    "encodeURI",
    "encodeURIComponent",
    "escape",
    "eval",
    "event",
    "frames",
    "history",
    "isFinite",
    "isNaN",
    "location",
    "navigator",
    "parent",
    "parseFloat",
    "parseInt",
    "prompt",
    "screen",
    "self",
    "setInterval",
    "setTimeout",
    "top",
    "undefined",
    "unescape",
    "window",
];

/// Builds the scope tree for a parsed program and links every identifier
/// to its field.
///
/// Runs in two passes: the first creates scopes and hoists declarations,
/// the second resolves references against the complete set of
/// declarations.
pub struct ScopeBuilder<'a> {
    tree: &'a mut ScopeTree,
    settings: &'a CodeSettings,
    handler: &'a dyn DiagnosticHandler,
}

impl<'a> ScopeBuilder<'a> {
    pub fn new(
        tree: &'a mut ScopeTree,
        settings: &'a CodeSettings,
        handler: &'a dyn DiagnosticHandler,
    ) -> Self {
        ScopeBuilder {
            tree,
            settings,
            handler,
        }
    }

    pub fn build(self, program: &mut Program) {
        let global = self.tree.global();
        program.scope = Some(global);

        let mut collector = DeclarationCollector {
            tree: &mut *self.tree,
            handler: self.handler,
            stack: vec![global],
        };
        collector.visit_program_mut(program);

        let mut resolver = ReferenceResolver {
            tree: &mut *self.tree,
            settings: self.settings,
            handler: self.handler,
            stack: vec![global],
        };
        resolver.visit_program_mut(program);

        check_named_function_expressions(self.tree, self.handler);

        debug!(scopes = self.tree.scope_count(), "scope tree built");
    }
}

/// Binds `program` into a fresh scope tree.
pub fn bind(
    program: &mut Program,
    settings: &CodeSettings,
    handler: &dyn DiagnosticHandler,
) -> ScopeTree {
    let mut tree = ScopeTree::new();
    ScopeBuilder::new(&mut tree, settings, handler).build(program);
    tree
}

struct DeclarationCollector<'a> {
    tree: &'a mut ScopeTree,
    handler: &'a dyn DiagnosticHandler,
    stack: Vec<ScopeId>,
}

impl DeclarationCollector<'_> {
    fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.global())
    }

    fn duplicate(&self, ident: &Identifier, what: &str) {
        self.handler.emit(
            DiagnosticCode::DuplicateDeclaration,
            ident.span,
            &format!("Duplicate {} '{}'", what, ident.name),
        );
    }
}

impl VisitMut for DeclarationCollector<'_> {
    fn visit_function_mut(&mut self, func: &mut FunctionNode) {
        let current = self.current();

        let mut declared_as = None;
        if func.kind == FunctionKind::Declaration {
            if let Some(name) = &mut func.name {
                let hoist = self.tree.function_scope_of(current);
                if let Some(existing) = self.tree.lookup_local(hoist, &name.name) {
                    if self.tree.field(existing).is_function {
                        self.duplicate(name, "function declaration");
                    }
                }
                let field = self
                    .tree
                    .declare_field(hoist, &name.name, FieldKind::Local, name.span);
                let record = self.tree.field_mut(field);
                record.is_declared = true;
                record.is_function = true;
                name.field = Some(field);
                declared_as = Some(field);
            }
        }

        let scope = self.tree.create_scope(ScopeKind::Function, current, func.span);
        func.scope = Some(scope);
        self.tree.scope_mut(scope).function_field = declared_as;

        for (position, param) in func.params.iter_mut().enumerate() {
            if self.tree.lookup_local(scope, &param.name).is_some() {
                self.duplicate(param, "parameter");
            }
            let field = self
                .tree
                .declare_field(scope, &param.name, FieldKind::Argument, param.span);
            let record = self.tree.field_mut(field);
            record.is_declared = true;
            record.position = Some(position);
            param.field = Some(field);
        }

        if func.kind != FunctionKind::Declaration {
            if let Some(name) = &mut func.name {
                if self.tree.lookup_local(scope, &name.name).is_none() {
                    let field = self.tree.declare_field(
                        scope,
                        &name.name,
                        FieldKind::NamedFunctionExpression,
                        name.span,
                    );
                    let record = self.tree.field_mut(field);
                    record.is_declared = true;
                    record.is_function = true;
                    name.field = Some(field);
                }
            }
        }

        self.tree
            .declare_field(scope, "arguments", FieldKind::Arguments, func.span);

        self.stack.push(scope);
        self.visit_block_mut(&mut func.body);
        self.stack.pop();
    }

    fn visit_var_declaration_mut(&mut self, decl: &mut VarDeclaration) {
        let hoist = self.tree.function_scope_of(self.current());
        let field = self
            .tree
            .declare_field(hoist, &decl.name.name, FieldKind::Local, decl.name.span);
        self.tree.field_mut(field).is_declared = true;
        decl.name.field = Some(field);
        if let Some(init) = &mut decl.init {
            self.visit_expression_mut(init);
        }
    }

    fn visit_catch_clause_mut(&mut self, clause: &mut CatchClause) {
        let scope = self
            .tree
            .create_scope(ScopeKind::Catch, self.current(), clause.span);
        clause.scope = Some(scope);
        let field = self
            .tree
            .declare_field(scope, &clause.param.name, FieldKind::Local, clause.param.span);
        self.tree.field_mut(field).is_declared = true;
        clause.param.field = Some(field);

        self.stack.push(scope);
        self.visit_block_mut(&mut clause.body);
        self.stack.pop();
    }

    fn visit_statement_mut(&mut self, statement: &mut Statement) {
        let Statement::With(with) = statement else {
            walk_statement_mut(self, statement);
            return;
        };
        self.visit_expression_mut(&mut with.object);
        let scope = self.tree.create_scope(ScopeKind::With, self.current(), with.span);
        with.scope = Some(scope);
        self.stack.push(scope);
        self.visit_statement_mut(&mut with.body);
        self.stack.pop();
    }
}

struct ReferenceResolver<'a> {
    tree: &'a mut ScopeTree,
    settings: &'a CodeSettings,
    handler: &'a dyn DiagnosticHandler,
    stack: Vec<ScopeId>,
}

impl ReferenceResolver<'_> {
    fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.global())
    }

    fn resolve(&mut self, ident: &mut Identifier, is_call: bool) {
        let scope = self.current();
        let (found_scope, found) = match self.tree.find_visible(scope, &ident.name) {
            Some(hit) => hit,
            None => {
                let global = self.tree.global();
                let predefined = PREDEFINED_GLOBALS.contains(&ident.name.as_str());
                let kind = if predefined {
                    FieldKind::Predefined
                } else {
                    FieldKind::Global
                };
                let field = self.tree.declare_field(global, &ident.name, kind, ident.span);
                if !predefined {
                    let (code, what) = if is_call {
                        (DiagnosticCode::UndeclaredFunction, "function")
                    } else {
                        (DiagnosticCode::UndeclaredVariable, "variable")
                    };
                    self.handler.emit(
                        code,
                        ident.span,
                        &format!("Undeclared {} '{}'", what, ident.name),
                    );
                }
                (global, field)
            }
        };

        let field = if found_scope == scope {
            found
        } else {
            if self.crosses_with(scope, found_scope) {
                let ultimate = self.tree.ultimate(found);
                self.tree.field_mut(ultimate).can_crunch = false;
            }
            self.tree.create_alias(scope, found)
        };
        ident.field = Some(field);
    }

    /// Whether a `with` body lies between `from` and `to`, which would let
    /// the object's properties shadow the name.
    fn crosses_with(&self, from: ScopeId, to: ScopeId) -> bool {
        let mut current = Some(from);
        while let Some(id) = current {
            if id == to {
                return false;
            }
            if self.tree.scope(id).kind == ScopeKind::With {
                return true;
            }
            current = self.tree.scope(id).parent;
        }
        false
    }

    fn mark_direct_eval(&mut self) {
        let scope = self.current();
        let function_scope = self.tree.function_scope_of(scope);
        let unknown = self.settings.eval_treatment != EvalTreatment::Ignore;
        let mut current = Some(scope);
        while let Some(id) = current {
            let record = self.tree.scope_mut(id);
            record.has_direct_eval = true;
            if unknown {
                record.is_known_at_compile_time = false;
            }
            if id == function_scope {
                break;
            }
            current = record.parent;
        }
    }

    fn enter(&mut self, scope: Option<ScopeId>) {
        let scope = scope.unwrap_or_else(|| self.current());
        self.stack.push(scope);
    }
}

impl VisitMut for ReferenceResolver<'_> {
    fn visit_function_mut(&mut self, func: &mut FunctionNode) {
        self.enter(func.scope);
        self.visit_block_mut(&mut func.body);
        self.stack.pop();
    }

    fn visit_catch_clause_mut(&mut self, clause: &mut CatchClause) {
        self.enter(clause.scope);
        self.visit_block_mut(&mut clause.body);
        self.stack.pop();
    }

    fn visit_statement_mut(&mut self, statement: &mut Statement) {
        let Statement::With(with) = statement else {
            walk_statement_mut(self, statement);
            return;
        };
        self.visit_expression_mut(&mut with.object);
        self.enter(with.scope);
        self.visit_statement_mut(&mut with.body);
        self.stack.pop();
    }

    fn visit_expression_mut(&mut self, expr: &mut Expression) {
        match &mut expr.kind {
            ExpressionKind::Identifier(ident) => self.resolve(ident, false),
            ExpressionKind::Call(callee, args) => {
                if let ExpressionKind::Identifier(ident) = &mut callee.kind {
                    if ident.name == "eval" {
                        self.mark_direct_eval();
                    }
                    self.resolve(ident, true);
                } else {
                    self.visit_expression_mut(callee);
                }
                for arg in args {
                    self.visit_expression_mut(arg);
                }
            }
            _ => walk_expression_mut(self, expr),
        }
    }
}

/// Flags named function expressions whose name is also a variable in the
/// enclosing scope. Older engines leak the expression's name outward, so
/// both must keep the same spelling.
fn check_named_function_expressions(tree: &mut ScopeTree, handler: &dyn DiagnosticHandler) {
    for id in tree.field_ids() {
        let field = tree.field(id);
        if field.kind != FieldKind::NamedFunctionExpression || field.is_alias() {
            continue;
        }
        let Some(parent) = tree.scope(field.scope).parent else {
            continue;
        };
        let name = field.name.clone();
        let span = field.span;
        let Some((_, outer)) = tree.find_visible(parent, &name) else {
            continue;
        };
        let outer = tree.ultimate(outer);
        if !tree.field(outer).is_declared || tree.field(outer).is_global_kind() {
            continue;
        }

        handler.emit(
            DiagnosticCode::AmbiguousNamedFunctionExpression,
            span,
            &format!("Function expression name '{}' is also a variable in the enclosing scope", name),
        );
        for target in [id, outer] {
            let record = tree.field_mut(target);
            record.is_ambiguous = true;
            record.can_crunch = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnosticHandler;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use std::sync::Arc;

    fn build(source: &str) -> (Program, ScopeTree, Arc<CollectingDiagnosticHandler>) {
        build_with(source, &CodeSettings::default())
    }

    fn build_with(
        source: &str,
        settings: &CodeSettings,
    ) -> (Program, ScopeTree, Arc<CollectingDiagnosticHandler>) {
        let handler = Arc::new(CollectingDiagnosticHandler::new());
        let tokens = Lexer::new(source).tokenize().expect("Lexing failed");
        let mut program = Parser::new(tokens, handler.clone())
            .parse()
            .expect("Parse failed");
        let tree = bind(&mut program, settings, handler.as_ref());
        (program, tree, handler)
    }

    fn function_scope(tree: &ScopeTree, index: usize) -> ScopeId {
        tree.scope(tree.global()).children[index]
    }

    #[test]
    fn test_var_hoists_to_function_scope() {
        let (_, tree, _) = build("function f() { if (a) { var x = 1; } try {} catch (e) { var y; } }");
        let f = function_scope(&tree, 0);
        assert!(tree.lookup_local(f, "x").is_some());
        assert!(tree.lookup_local(f, "y").is_some());
        let catch_scope = tree.scope(f).children[0];
        assert_eq!(tree.scope(catch_scope).kind, ScopeKind::Catch);
        assert!(tree.lookup_local(catch_scope, "e").is_some());
        assert!(tree.lookup_local(catch_scope, "y").is_none());
    }

    #[test]
    fn test_function_declaration_binds_in_enclosing_scope() {
        let (program, tree, _) = build("function outer() { function inner() {} }");
        let global = tree.global();
        assert!(tree.lookup_local(global, "outer").is_some());
        let outer = function_scope(&tree, 0);
        let inner = tree.lookup_local(outer, "inner").expect("inner declared");
        assert!(tree.field(inner).is_function);
        assert!(tree.scope(outer).function_field.is_some());
        assert_eq!(program.scope, Some(global));
    }

    #[test]
    fn test_outer_reference_creates_alias() {
        let (_, tree, _) = build("function f() { var x; function g() { return x; } }");
        let f = function_scope(&tree, 0);
        let g = tree.scope(f).children[0];
        let x = tree.lookup_local(f, "x").expect("x declared");
        let alias = tree.lookup_local(g, "x").expect("alias created");
        assert_eq!(tree.field(alias).outer_field, Some(x));
        assert_eq!(tree.ultimate(alias), x);
    }

    #[test]
    fn test_undeclared_reference_is_reported_once() {
        let (_, tree, handler) = build("foo = 1; foo(); bar(); window.x = 1;");
        let global = tree.global();
        let foo = tree.lookup_local(global, "foo").expect("foo recorded");
        assert_eq!(tree.field(foo).kind, FieldKind::Global);
        assert_eq!(handler.with_code(DiagnosticCode::UndeclaredVariable).len(), 1);
        assert_eq!(handler.with_code(DiagnosticCode::UndeclaredFunction).len(), 1);
        let window = tree.lookup_local(global, "window").expect("window recorded");
        assert_eq!(tree.field(window).kind, FieldKind::Predefined);
    }

    #[test]
    fn test_duplicate_parameters_are_reported() {
        let (_, _, handler) = build("function f(a, a) { return a; }");
        assert_eq!(handler.with_code(DiagnosticCode::DuplicateDeclaration).len(), 1);
    }

    #[test]
    fn test_var_redeclaring_parameter_is_silent() {
        let (_, tree, handler) = build("function f(a) { var a = a || {}; return a; }");
        assert!(handler.with_code(DiagnosticCode::DuplicateDeclaration).is_empty());
        let f = function_scope(&tree, 0);
        let a = tree.lookup_local(f, "a").expect("a declared");
        assert_eq!(tree.field(a).kind, FieldKind::Argument);
    }

    #[test]
    fn test_direct_eval_makes_scope_unknown() {
        let (_, tree, _) = build("function f() { eval('x'); } function g() {}");
        assert!(!tree.scope(function_scope(&tree, 0)).is_known_at_compile_time);
        assert!(tree.scope(function_scope(&tree, 0)).has_direct_eval);
        assert!(tree.scope(function_scope(&tree, 1)).is_known_at_compile_time);
    }

    #[test]
    fn test_ignored_eval_keeps_scope_known() {
        let settings = CodeSettings {
            eval_treatment: EvalTreatment::Ignore,
            ..CodeSettings::default()
        };
        let (_, tree, _) = build_with("function f() { eval('x'); }", &settings);
        let f = function_scope(&tree, 0);
        assert!(tree.scope(f).has_direct_eval);
        assert!(tree.scope(f).is_known_at_compile_time);
    }

    #[test]
    fn test_reference_through_with_blocks_renaming() {
        let (_, tree, _) = build("function f() { var x; with (o) { x = 1; } }");
        let f = function_scope(&tree, 0);
        let x = tree.lookup_local(f, "x").expect("x declared");
        assert!(!tree.field(x).can_crunch);
    }

    #[test]
    fn test_ambiguous_named_function_expression() {
        let (_, tree, handler) = build("function f() { var g = function g() {}; return g; }");
        assert_eq!(
            handler
                .with_code(DiagnosticCode::AmbiguousNamedFunctionExpression)
                .len(),
            1
        );
        let f = function_scope(&tree, 0);
        let g = tree.lookup_local(f, "g").expect("g declared");
        assert!(tree.field(g).is_ambiguous);
        assert!(!tree.field(g).can_crunch);
    }

    #[test]
    fn test_identifiers_are_linked() {
        let (program, tree, _) = build("var a = 1; a;");
        match &program.statements()[1] {
            Statement::Expression(expr) => {
                let field = expr.as_identifier().and_then(|id| id.field).expect("bound");
                assert_eq!(tree.field(field).name, "a");
            }
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }
}
