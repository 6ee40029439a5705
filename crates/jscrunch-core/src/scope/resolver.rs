//! The renaming resolver: unused-name analysis, name reservation, short
//! name assignment, and naming of synthesized fields.
//!
//! The phases run in a fixed order recorded on the [`ScopeTree`]:
//! [`analyze_scope`], [`reserve_fields`], the literal shortcut pass,
//! [`hyper_crunch`], then [`validate_generated_names`].

use super::{CrunchEnumerator, FieldId, FieldKind, ResolverPhase, ScopeId, ScopeKind, ScopeTree};
use crate::config::{CodeSettings, EvalTreatment, LocalRenaming};
use crate::diagnostics::{DiagnosticCode, DiagnosticHandler};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Reports declared names that are never referenced.
pub fn analyze_scope(tree: &mut ScopeTree, handler: &dyn DiagnosticHandler) {
    tree.advance_phase(ResolverPhase::Unanalyzed, ResolverPhase::ScopeAnalyzed);

    for scope_id in tree.scopes_top_down() {
        let scope = tree.scope(scope_id);
        if scope.kind == ScopeKind::Global
            || !scope.is_known_at_compile_time
            || scope.is_detached
        {
            continue;
        }
        for &field_id in scope.fields.values() {
            let field = tree.field(field_id);
            if field.is_alias() || field.is_generated || !field.is_declared || field.ref_count > 0 {
                continue;
            }
            let (code, what) = match field.kind {
                FieldKind::Local if field.is_function => (DiagnosticCode::UnusedFunction, "function"),
                FieldKind::Local => (DiagnosticCode::UnusedVariable, "variable"),
                FieldKind::Argument => (DiagnosticCode::UnusedArgument, "argument"),
                _ => continue,
            };
            handler.emit(
                code,
                field.span,
                &format!("Unused {} '{}'", what, field.name),
            );
        }
    }
}

/// Marks, for every referenced alias, the names that intermediate scopes
/// must leave alone. With [`EvalTreatment::MakeAllSafe`], runtime-lookup
/// scopes also make their ancestors unknown.
pub fn reserve_fields(tree: &mut ScopeTree, settings: &CodeSettings) {
    tree.advance_phase(ResolverPhase::ScopeAnalyzed, ResolverPhase::FieldsReserved);

    for scope_id in tree.scopes_bottom_up() {
        let scope = tree.scope(scope_id);
        if settings.eval_treatment == EvalTreatment::MakeAllSafe
            && !scope.is_known_at_compile_time
            && !is_provably_unreferenced(tree, scope_id)
        {
            if let Some(parent) = scope.parent {
                tree.scope_mut(parent).is_known_at_compile_time = false;
            }
        }

        let aliases: Vec<FieldId> = tree
            .scope(scope_id)
            .fields
            .values()
            .copied()
            .filter(|&id| tree.field(id).is_alias() && tree.field(id).ref_count > 0)
            .collect();
        for alias in aliases {
            tree.reserve_alias(alias);
        }
    }
}

/// A function declared but never referenced cannot run, so its runtime
/// lookups cannot reach its parent.
fn is_provably_unreferenced(tree: &ScopeTree, scope: ScopeId) -> bool {
    match tree.scope(scope).function_field {
        Some(field) => tree.total_references(field) == 0,
        None => false,
    }
}

/// Whether the resolver may give `field` a short name.
fn is_crunchable(tree: &ScopeTree, field: FieldId, settings: &CodeSettings) -> bool {
    let record = tree.field(field);
    if record.is_generated {
        return true;
    }
    if record.is_alias() || !record.can_crunch {
        return false;
    }
    if settings.local_renaming == LocalRenaming::KeepLocalizationVars
        && record.name.starts_with("L_")
    {
        return false;
    }
    !settings.no_auto_renames.iter().any(|name| name == &record.name)
}

/// Assigns short names, outermost scopes first, most-referenced fields
/// first within a scope.
pub fn hyper_crunch(tree: &mut ScopeTree, settings: &CodeSettings) {
    tree.advance_phase(ResolverPhase::LiteralsShortcut, ResolverPhase::Renamed);
    if !settings.minify_code || settings.local_renaming == LocalRenaming::KeepAll {
        return;
    }

    let aliases = tree.aliases_by_ultimate();
    let mut renamed = 0usize;

    for scope_id in tree.scopes_top_down() {
        let scope = tree.scope(scope_id);
        if scope.kind == ScopeKind::Global || !scope.is_known_at_compile_time {
            continue;
        }

        let mut candidates = Vec::new();
        let mut avoid: FxHashSet<String> = FxHashSet::default();
        for &field_id in scope.fields.values() {
            if is_crunchable(tree, field_id, settings) {
                candidates.push(field_id);
            } else {
                avoid.insert(tree.display_name(field_id).to_string());
            }
        }
        for &field_id in &scope.verboten {
            avoid.insert(tree.display_name(field_id).to_string());
        }

        candidates.sort_by(|&a, &b| {
            let (fa, fb) = (tree.field(a), tree.field(b));
            fb.ref_count
                .cmp(&fa.ref_count)
                .then_with(|| fb.name.len().cmp(&fa.name.len()))
                .then_with(|| fa.name.cmp(&fb.name))
        });

        for field_id in candidates {
            let mut skip = avoid.clone();
            skip.extend(shadowing_names(tree, field_id, &aliases, settings));
            let name = CrunchEnumerator::new(&skip)
                .next()
                .unwrap_or_else(|| tree.field(field_id).name.clone());
            avoid.insert(name.clone());
            tree.field_mut(field_id).crunched_name = Some(name);
            renamed += 1;
        }
    }

    debug!(renamed, "local names crunched");
}

/// Names that would capture references to `field` from nested scopes:
/// the fixed names of every scope between a referencing scope and the
/// declaring one.
fn shadowing_names(
    tree: &ScopeTree,
    field: FieldId,
    aliases: &FxHashMap<FieldId, Vec<FieldId>>,
    settings: &CodeSettings,
) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    let declaring_scope = tree.field(field).scope;
    let Some(refs) = aliases.get(&field) else {
        return names;
    };
    for &alias in refs {
        let mut current = Some(tree.field(alias).scope);
        while let Some(scope_id) = current {
            if scope_id == declaring_scope {
                break;
            }
            let scope = tree.scope(scope_id);
            for &other in scope.fields.values() {
                let record = tree.field(other);
                if record.is_alias() {
                    continue;
                }
                if !scope.is_known_at_compile_time || !is_crunchable(tree, other, settings) {
                    names.insert(record.name.clone());
                }
            }
            current = scope.parent;
        }
    }
    names
}

/// Names any synthesized field the renamer skipped, avoiding every name
/// in use in its scope and the scopes nested in it.
pub fn validate_generated_names(tree: &mut ScopeTree) {
    tree.advance_phase(ResolverPhase::Renamed, ResolverPhase::GeneratedNamesValidated);

    let pending: Vec<FieldId> = tree
        .field_ids()
        .into_iter()
        .filter(|&id| {
            let field = tree.field(id);
            field.is_generated && field.crunched_name.is_none()
        })
        .collect();

    for field_id in pending {
        let scope = tree.field(field_id).scope;
        let mut avoid: FxHashSet<String> = FxHashSet::default();
        for scope_id in tree.subtree(scope) {
            for &other in tree.scope(scope_id).fields.values() {
                if other == field_id {
                    continue;
                }
                let record = tree.field(tree.ultimate(other));
                if record.is_generated && record.crunched_name.is_none() {
                    continue;
                }
                avoid.insert(tree.display_name(other).to_string());
            }
        }
        let name = CrunchEnumerator::new(&avoid)
            .next()
            .unwrap_or_else(|| tree.field(field_id).name.clone());
        tree.field_mut(field_id).crunched_name = Some(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;
    use crate::diagnostics::CollectingDiagnosticHandler;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::scope::builder::bind;
    use std::sync::Arc;

    fn resolve(source: &str, settings: &CodeSettings) -> (Program, ScopeTree, Arc<CollectingDiagnosticHandler>) {
        let handler = Arc::new(CollectingDiagnosticHandler::new());
        let tokens = Lexer::new(source).tokenize().expect("Lexing failed");
        let mut program = Parser::new(tokens, handler.clone())
            .parse()
            .expect("Parse failed");
        let mut tree = bind(&mut program, settings, handler.as_ref());
        tree.recount_references(&program);
        analyze_scope(&mut tree, handler.as_ref());
        reserve_fields(&mut tree, settings);
        tree.advance_phase(ResolverPhase::FieldsReserved, ResolverPhase::LiteralsShortcut);
        hyper_crunch(&mut tree, settings);
        validate_generated_names(&mut tree);
        (program, tree, handler)
    }

    fn name_of(tree: &ScopeTree, scope: ScopeId, name: &str) -> String {
        let field = tree.lookup_local(scope, name).expect("field exists");
        tree.display_name(field).to_string()
    }

    #[test]
    fn test_most_referenced_gets_shortest_name() {
        let settings = CodeSettings::default();
        let (_, tree, _) = resolve(
            "function f(rare, often) { return often + often + often + rare; }",
            &settings,
        );
        let f = tree.scope(tree.global()).children[0];
        assert_eq!(name_of(&tree, f, "often"), "a");
        assert_eq!(name_of(&tree, f, "rare"), "b");
        assert_eq!(tree.phase(), ResolverPhase::GeneratedNamesValidated);
    }

    #[test]
    fn test_outer_names_are_not_reused_by_referencing_scopes() {
        let settings = CodeSettings::default();
        let (_, tree, _) = resolve(
            "function f() { var outer = 1; function g() { var inner = 2; return outer + inner; } return g; }",
            &settings,
        );
        let f = tree.scope(tree.global()).children[0];
        let g = tree.scope(f).children[0];
        let outer = name_of(&tree, f, "outer");
        let inner = name_of(&tree, g, "inner");
        assert_ne!(outer, inner);
        assert_eq!(name_of(&tree, g, "outer"), outer);
    }

    #[test]
    fn test_globals_referenced_inside_are_avoided() {
        let settings = CodeSettings::default();
        let (_, tree, _) = resolve("function f(x) { return a(x); }", &settings);
        let f = tree.scope(tree.global()).children[0];
        assert_ne!(name_of(&tree, f, "x"), "a");
    }

    #[test]
    fn test_global_scope_is_never_renamed() {
        let settings = CodeSettings::default();
        let (_, tree, _) = resolve("var longName = 1; longName++;", &settings);
        assert_eq!(name_of(&tree, tree.global(), "longName"), "longName");
    }

    #[test]
    fn test_keep_all_renaming() {
        let settings = CodeSettings {
            local_renaming: LocalRenaming::KeepAll,
            ..CodeSettings::default()
        };
        let (_, tree, _) = resolve("function f(value) { return value; }", &settings);
        let f = tree.scope(tree.global()).children[0];
        assert_eq!(name_of(&tree, f, "value"), "value");
    }

    #[test]
    fn test_localization_vars_and_no_auto_renames() {
        let settings = CodeSettings {
            local_renaming: LocalRenaming::KeepLocalizationVars,
            no_auto_renames: vec!["keepMe".to_string()],
            ..CodeSettings::default()
        };
        let (_, tree, _) = resolve(
            "function f(L_text, keepMe, other) { return L_text + keepMe + other; }",
            &settings,
        );
        let f = tree.scope(tree.global()).children[0];
        assert_eq!(name_of(&tree, f, "L_text"), "L_text");
        assert_eq!(name_of(&tree, f, "keepMe"), "keepMe");
        assert_eq!(name_of(&tree, f, "other"), "a");
    }

    #[test]
    fn test_eval_scope_keeps_names() {
        let settings = CodeSettings::default();
        let (_, tree, _) = resolve("function f(value) { return eval('value'); }", &settings);
        let f = tree.scope(tree.global()).children[0];
        assert_eq!(name_of(&tree, f, "value"), "value");
    }

    #[test]
    fn test_make_all_safe_propagates_to_parent() {
        let settings = CodeSettings {
            eval_treatment: EvalTreatment::MakeAllSafe,
            ..CodeSettings::default()
        };
        let (_, tree, _) = resolve(
            "function f(value) { function g() { return eval('value'); } return g; }",
            &settings,
        );
        let f = tree.scope(tree.global()).children[0];
        assert!(!tree.scope(f).is_known_at_compile_time);
        assert_eq!(name_of(&tree, f, "value"), "value");
    }

    #[test]
    fn test_unreferenced_eval_function_does_not_propagate() {
        let settings = CodeSettings {
            eval_treatment: EvalTreatment::MakeAllSafe,
            ..CodeSettings::default()
        };
        let (_, tree, _) = resolve(
            "function f(value) { function g() { return eval('1'); } return value; }",
            &settings,
        );
        let f = tree.scope(tree.global()).children[0];
        assert!(tree.scope(f).is_known_at_compile_time);
    }

    #[test]
    fn test_unused_names_are_reported() {
        let settings = CodeSettings::default();
        let (_, _, handler) = resolve(
            "function f(unusedArg) { var unusedVar; function unusedFn() {} }",
            &settings,
        );
        assert_eq!(handler.with_code(DiagnosticCode::UnusedArgument).len(), 1);
        assert_eq!(handler.with_code(DiagnosticCode::UnusedVariable).len(), 1);
        assert_eq!(handler.with_code(DiagnosticCode::UnusedFunction).len(), 1);
    }

    #[test]
    fn test_uncrunchable_inner_local_is_avoided_by_outer() {
        let settings = CodeSettings {
            no_auto_renames: vec!["a".to_string()],
            ..CodeSettings::default()
        };
        let (_, tree, _) = resolve(
            "function f() { var outer = 1; function g(a) { return outer + a; } return g; }",
            &settings,
        );
        let f = tree.scope(tree.global()).children[0];
        assert_ne!(name_of(&tree, f, "outer"), "a");
    }

    #[test]
    fn test_generated_field_named_when_renaming_is_off() {
        let settings = CodeSettings {
            local_renaming: LocalRenaming::KeepAll,
            ..CodeSettings::default()
        };
        let handler = Arc::new(CollectingDiagnosticHandler::new());
        let tokens = Lexer::new("function f(a) { return a; }").tokenize().expect("Lexing failed");
        let mut program = Parser::new(tokens, handler.clone())
            .parse()
            .expect("Parse failed");
        let mut tree = bind(&mut program, &settings, handler.as_ref());
        tree.recount_references(&program);
        analyze_scope(&mut tree, handler.as_ref());
        reserve_fields(&mut tree, &settings);
        tree.advance_phase(ResolverPhase::FieldsReserved, ResolverPhase::LiteralsShortcut);
        let f = tree.scope(tree.global()).children[0];
        let generated = tree.create_generated_field(f);
        hyper_crunch(&mut tree, &settings);
        validate_generated_names(&mut tree);
        assert_eq!(tree.display_name(generated), "b");
    }
}
