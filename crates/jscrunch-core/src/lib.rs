//! Core of the `jscrunch` JavaScript minifier.
//!
//! Source text goes through [`lexer`], [`parser`], scope binding in
//! [`scope`], the rewrite passes and renaming resolver in [`optimizer`], and
//! finally the emitter in [`codegen`]. [`minify`] runs the whole chain.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod di;
pub mod diagnostics;
pub mod errors;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod scope;
pub mod span;

pub use codegen::CodeGenerator;
pub use config::{CliOverrides, CodeSettings, MinifierConfig, TreeModifications};
pub use di::Container;
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticHandler, DiagnosticLevel};
pub use errors::CompilationError;
pub use optimizer::Optimizer;

use std::sync::Arc;
use tracing::{debug, instrument};

/// Minifies `source` and returns the output text.
///
/// Non-fatal findings go to `handler`; lexing and parse failures come back
/// as errors.
#[instrument(skip_all, fields(len = source.len()))]
pub fn minify(
    source: &str,
    settings: &CodeSettings,
    handler: Arc<dyn DiagnosticHandler>,
) -> Result<String, CompilationError> {
    let tokens = lexer::Lexer::new(source).tokenize()?;
    debug!(tokens = tokens.len(), "lexed");

    let mut program = parser::Parser::new(tokens, handler.clone()).parse()?;
    let mut scopes = scope::bind(&mut program, settings, handler.as_ref());
    debug!(scopes = scopes.scope_count(), "bound");

    Optimizer::new(settings.clone(), handler).optimize(&mut program, &mut scopes)?;

    Ok(CodeGenerator::new(settings)
        .with_scopes(&scopes)
        .generate(&program))
}
