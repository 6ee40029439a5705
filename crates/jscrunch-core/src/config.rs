use crate::errors::CompilationError;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether output goes on one line or is pretty-printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputMode {
    #[default]
    SingleLine,
    MultipleLines,
}

/// How much of the scope chain a direct `eval` can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvalTreatment {
    /// Pretend `eval` cannot see local names.
    Ignore,
    /// The scope calling `eval` keeps its names; other scopes are renamed.
    #[default]
    MakeImmediateSafe,
    /// The calling scope and every enclosing scope keep their names.
    MakeAllSafe,
}

/// Which local names may be crunched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocalRenaming {
    KeepAll,
    /// Crunch everything except names starting with `L_`.
    KeepLocalizationVars,
    #[default]
    CrunchAll,
}

bitflags! {
    /// Kill-switch bitmask. A set flag DISABLES that category of rewrite.
    ///
    /// Config files spell it as flag names joined by `|`, or as a `0x` hex value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TreeModifications: u64 {
        const MOVE_FUNCTION_TO_TOP_OF_SCOPE = 1 << 0;
        const COMBINE_VAR_STATEMENTS_TO_TOP_OF_SCOPE = 1 << 1;
        const COMBINE_ADJACENT_VAR_STATEMENTS = 1 << 2;
        const UNNEST_BLOCKS = 1 << 3;
        const VAR_INITIALIZER_RETURN = 1 << 4;
        const IF_ELSE_RETURN_TO_CONDITIONAL = 1 << 5;
        const IF_RETURN_CASCADE = 1 << 6;
        const REMOVE_EMPTY_DEFAULT_CASE = 1 << 7;
        const REMOVE_EMPTY_CASES = 1 << 8;
        const REMOVE_TRAILING_BREAK = 1 << 9;
        const COMBINE_DUPLICATE_LITERALS = 1 << 10;
        const REMOVE_UNREACHABLE_CODE = 1 << 11;
        const IF_NOT_SWAP_BRANCHES = 1 << 12;
        const REDUCE_LOGICAL_NOT = 1 << 13;
        const IF_TO_LOGICAL_EXPRESSION = 1 << 14;
        const IF_ELSE_TO_CONDITIONAL = 1 << 15;
        const REMOVE_EMPTY_IF_PARTS = 1 << 16;
        const EVALUATE_CONSTANT_CONDITIONS = 1 << 17;
        const REMOVE_UNUSED_FUNCTIONS = 1 << 18;
        const REMOVE_REDUNDANT_RETURN = 1 << 19;
        const BOOLEAN_LITERALS_AS_NOT_NUMBERS = 1 << 20;
        const REMOVE_UNUSED_PARAMETERS = 1 << 21;
        const COMBINE_CONDITIONAL_COMMENTS = 1 << 22;
        const RETURN_VOID_REVERSAL = 1 << 23;
    }
}

impl Default for TreeModifications {
    fn default() -> Self {
        TreeModifications::empty()
    }
}

/// Settings consulted by the rewrite passes and the emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSettings {
    /// Single-line or multi-line output (default: single line)
    #[serde(default)]
    pub output_mode: OutputMode,

    /// Spaces per indent level in multi-line output (default: 4)
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,

    /// Run the rewrite passes at all (default: true)
    #[serde(default = "default_true")]
    pub minify_code: bool,

    /// How direct `eval` constrains renaming (default: makeImmediateSafe)
    #[serde(default)]
    pub eval_treatment: EvalTreatment,

    /// Which locals may be renamed (default: crunchAll)
    #[serde(default)]
    pub local_renaming: LocalRenaming,

    /// Names never to rename
    #[serde(default)]
    pub no_auto_renames: Vec<String>,

    /// Keep `/*! ... */` comments (default: true)
    #[serde(default = "default_true")]
    pub preserve_important_comments: bool,

    /// Remove unreachable or unused code (default: true)
    #[serde(default = "default_true")]
    pub remove_unneeded_code: bool,

    /// Hoist functions and vars to the top of their scope (default: true)
    #[serde(default = "default_true")]
    pub reorder_scope_declarations: bool,

    /// Disabled rewrite categories
    #[serde(default)]
    pub kill_switch: TreeModifications,
}

fn default_true() -> bool {
    true
}

fn default_indent_size() -> usize {
    4
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::SingleLine,
            indent_size: 4,
            minify_code: true,
            eval_treatment: EvalTreatment::MakeImmediateSafe,
            local_renaming: LocalRenaming::CrunchAll,
            no_auto_renames: Vec::new(),
            preserve_important_comments: true,
            remove_unneeded_code: true,
            reorder_scope_declarations: true,
            kill_switch: TreeModifications::empty(),
        }
    }
}

impl CodeSettings {
    /// Settings that only reformat: no renaming, no rewrites.
    pub fn pretty_print() -> Self {
        Self {
            output_mode: OutputMode::MultipleLines,
            minify_code: false,
            local_renaming: LocalRenaming::KeepAll,
            ..Self::default()
        }
    }

    pub fn is_modification_allowed(&self, modification: TreeModifications) -> bool {
        !self.kill_switch.contains(modification)
    }

    pub fn disable(&mut self, modification: TreeModifications) {
        self.kill_switch |= modification;
    }

    /// Booleans render as `!0`/`!1`.
    pub fn minify_booleans(&self) -> bool {
        self.minify_code
            && self.is_modification_allowed(TreeModifications::BOOLEAN_LITERALS_AS_NOT_NUMBERS)
    }

    pub fn is_multi_line(&self) -> bool {
        self.output_mode == OutputMode::MultipleLines
    }
}

/// Main minifier configuration as stored in a config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifierConfig {
    /// Code settings
    #[serde(default)]
    pub code_settings: CodeSettings,

    /// Output directory for minified files
    #[serde(default)]
    pub out_dir: Option<String>,

    /// Pretty-print diagnostics (default: true)
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Files to include (glob patterns)
    #[serde(default)]
    pub include: Vec<String>,

    /// Files to exclude (glob patterns)
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".to_string(), "**/*.min.js".to_string()]
}

impl Default for MinifierConfig {
    fn default() -> Self {
        Self {
            code_settings: CodeSettings::default(),
            out_dir: None,
            pretty: true,
            include: vec!["**/*.js".to_string()],
            exclude: default_exclude(),
        }
    }
}

/// Command-line values that take precedence over the file configuration
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_mode: Option<OutputMode>,
    pub indent_size: Option<usize>,
    pub minify_code: Option<bool>,
    pub eval_treatment: Option<EvalTreatment>,
    pub local_renaming: Option<LocalRenaming>,
    pub no_auto_renames: Option<Vec<String>>,
    pub kill_switch: Option<TreeModifications>,
    pub out_dir: Option<String>,
    pub pretty: Option<bool>,
}

impl MinifierConfig {
    /// Load configuration from a JSON or YAML file (chosen by extension)
    pub fn from_file(path: &Path) -> Result<Self, CompilationError> {
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            serde_yaml::from_str(&content)
                .map_err(|e| CompilationError::ConfigError(e.to_string()))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| CompilationError::ConfigError(e.to_string()))
        }
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<(), CompilationError> {
        let config = MinifierConfig::default();
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| CompilationError::ConfigError(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Merge CLI overrides into this configuration
    pub fn merge(&mut self, overrides: &CliOverrides) {
        let settings = &mut self.code_settings;
        if let Some(mode) = overrides.output_mode {
            settings.output_mode = mode;
        }
        if let Some(size) = overrides.indent_size {
            settings.indent_size = size;
        }
        if let Some(minify) = overrides.minify_code {
            settings.minify_code = minify;
        }
        if let Some(eval) = overrides.eval_treatment {
            settings.eval_treatment = eval;
        }
        if let Some(renaming) = overrides.local_renaming {
            settings.local_renaming = renaming;
        }
        if let Some(names) = &overrides.no_auto_renames {
            settings.no_auto_renames.extend(names.iter().cloned());
        }
        if let Some(kill) = overrides.kill_switch {
            settings.kill_switch |= kill;
        }
        if let Some(out_dir) = &overrides.out_dir {
            self.out_dir = Some(out_dir.clone());
        }
        if let Some(pretty) = overrides.pretty {
            self.pretty = pretty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MinifierConfig::default();
        assert!(config.code_settings.minify_code);
        assert_eq!(config.code_settings.output_mode, OutputMode::SingleLine);
        assert_eq!(
            config.code_settings.eval_treatment,
            EvalTreatment::MakeImmediateSafe
        );
    }

    #[test]
    fn test_serialize_config() {
        let config = MinifierConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("codeSettings"));
        assert!(json.contains("killSwitch"));
    }

    #[test]
    fn test_deserialize_config() {
        let json = r#"{
            "codeSettings": {
                "outputMode": "multipleLines",
                "localRenaming": "keepAll",
                "killSwitch": "MOVE_FUNCTION_TO_TOP_OF_SCOPE | COMBINE_VAR_STATEMENTS_TO_TOP_OF_SCOPE"
            }
        }"#;
        let config: MinifierConfig = serde_json::from_str(json).unwrap();
        let settings = &config.code_settings;
        assert_eq!(settings.output_mode, OutputMode::MultipleLines);
        assert_eq!(settings.local_renaming, LocalRenaming::KeepAll);
        assert!(!settings.is_modification_allowed(TreeModifications::MOVE_FUNCTION_TO_TOP_OF_SCOPE));
        assert!(!settings
            .is_modification_allowed(TreeModifications::COMBINE_VAR_STATEMENTS_TO_TOP_OF_SCOPE));
        assert!(settings.is_modification_allowed(TreeModifications::UNNEST_BLOCKS));
    }

    #[test]
    fn test_kill_switch_serializes_flag_names() {
        let mut settings = CodeSettings::default();
        settings.disable(TreeModifications::UNNEST_BLOCKS);
        settings.disable(TreeModifications::REDUCE_LOGICAL_NOT);
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("UNNEST_BLOCKS | REDUCE_LOGICAL_NOT"));

        let back: CodeSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kill_switch, settings.kill_switch);
    }

    #[test]
    fn test_kill_switch_accepts_hex() {
        let json = r#"{ "killSwitch": "0x400" }"#;
        let settings: CodeSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.kill_switch, TreeModifications::COMBINE_DUPLICATE_LITERALS);
        assert!(CodeSettings::default().kill_switch.is_empty());
    }

    #[test]
    fn test_deserialize_yaml() {
        let yaml = "codeSettings:\n  indentSize: 2\n  evalTreatment: makeAllSafe\n";
        let config: MinifierConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.code_settings.indent_size, 2);
        assert_eq!(config.code_settings.eval_treatment, EvalTreatment::MakeAllSafe);
    }

    #[test]
    fn test_merge_overrides() {
        let mut config = MinifierConfig::default();
        let overrides = CliOverrides {
            output_mode: Some(OutputMode::MultipleLines),
            kill_switch: Some(TreeModifications::UNNEST_BLOCKS),
            no_auto_renames: Some(vec!["keepMe".to_string()]),
            ..CliOverrides::default()
        };
        config.merge(&overrides);
        assert!(config.code_settings.is_multi_line());
        assert!(!config
            .code_settings
            .is_modification_allowed(TreeModifications::UNNEST_BLOCKS));
        assert_eq!(config.code_settings.no_auto_renames, vec!["keepMe"]);
    }

    #[test]
    fn test_minify_booleans_follows_kill_switch() {
        let mut settings = CodeSettings::default();
        assert!(settings.minify_booleans());
        settings.disable(TreeModifications::BOOLEAN_LITERALS_AS_NOT_NUMBERS);
        assert!(!settings.minify_booleans());
        assert!(!CodeSettings::pretty_print().minify_booleans());
    }
}
