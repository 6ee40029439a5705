use crate::config::MinifierConfig;
use crate::diagnostics::{ConsoleDiagnosticHandler, DiagnosticHandler};
use crate::errors::CompilationError;
use std::sync::Arc;

/// Dependency injection container
/// Holds the configuration and diagnostic sink shared by every file of a run
pub struct Container {
    config: Arc<MinifierConfig>,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
}

impl Container {
    /// Create a new container reporting to the console
    pub fn new(config: MinifierConfig) -> Self {
        let diagnostic_handler = Arc::new(ConsoleDiagnosticHandler::new(config.pretty));
        Container {
            config: Arc::new(config),
            diagnostic_handler,
        }
    }

    /// Create a container with a custom diagnostic handler (for testing)
    pub fn with_dependencies(
        config: MinifierConfig,
        diagnostic_handler: Arc<dyn DiagnosticHandler>,
    ) -> Self {
        Container {
            config: Arc::new(config),
            diagnostic_handler,
        }
    }

    pub fn config(&self) -> &Arc<MinifierConfig> {
        &self.config
    }

    pub fn diagnostic_handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostic_handler
    }

    /// Minify one source text with the container's settings
    pub fn minify(&self, source: &str) -> Result<String, CompilationError> {
        crate::minify(
            source,
            &self.config.code_settings,
            self.diagnostic_handler.clone(),
        )
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostic_handler.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostic_handler.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostic_handler.warning_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputMode;
    use crate::diagnostics::{CollectingDiagnosticHandler, DiagnosticCode};
    use crate::span::Span;

    #[test]
    fn test_container_creation() {
        let container = Container::new(MinifierConfig::default());

        assert_eq!(container.error_count(), 0);
        assert!(!container.has_errors());
    }

    #[test]
    fn test_container_with_mock_dependencies() {
        let diagnostics = Arc::new(CollectingDiagnosticHandler::new());
        let container = Container::with_dependencies(MinifierConfig::default(), diagnostics.clone());

        container
            .diagnostic_handler()
            .error(Span::dummy(), "Test error");

        assert!(container.has_errors());
        assert_eq!(diagnostics.with_code(DiagnosticCode::SyntaxError).len(), 1);
    }

    #[test]
    fn test_container_config_access() {
        let mut config = MinifierConfig::default();
        config.code_settings.output_mode = OutputMode::MultipleLines;

        let container = Container::new(config);

        assert!(container.config().code_settings.is_multi_line());
    }

    #[test]
    fn test_container_minify() {
        let container = Container::with_dependencies(
            MinifierConfig::default(),
            Arc::new(CollectingDiagnosticHandler::new()),
        );

        let output = container.minify("var x = 1;").expect("minify failed");
        assert_eq!(output, "var x=1");
    }
}
