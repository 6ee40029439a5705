use indoc::indoc;
use jscrunch_core::config::{EvalTreatment, LocalRenaming, OutputMode};
use jscrunch_core::{CliOverrides, MinifierConfig, TreeModifications};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_json_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("jscrunch.json");
    fs::write(
        &path,
        r#"{ "codeSettings": { "indentSize": 2, "removeUnneededCode": false }, "outDir": "dist" }"#,
    )
    .unwrap();

    let config = MinifierConfig::from_file(&path).unwrap();
    assert_eq!(config.code_settings.indent_size, 2);
    assert!(!config.code_settings.remove_unneeded_code);
    assert!(config.code_settings.minify_code);
    assert_eq!(config.out_dir.as_deref(), Some("dist"));
}

#[test]
fn test_load_yaml_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("jscrunch.yaml");
    fs::write(
        &path,
        indoc! {r#"
            codeSettings:
              outputMode: multipleLines
              evalTreatment: ignore
              localRenaming: keepLocalizationVars
              noAutoRenames: [jQuery]
              killSwitch: "0x400"
            pretty: false
        "#},
    )
    .unwrap();

    let config = MinifierConfig::from_file(&path).unwrap();
    let settings = &config.code_settings;
    assert_eq!(settings.output_mode, OutputMode::MultipleLines);
    assert_eq!(settings.eval_treatment, EvalTreatment::Ignore);
    assert_eq!(settings.local_renaming, LocalRenaming::KeepLocalizationVars);
    assert_eq!(settings.no_auto_renames, vec!["jQuery"]);
    assert!(!settings.is_modification_allowed(TreeModifications::COMBINE_DUPLICATE_LITERALS));
    assert!(!config.pretty);
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"codeSettings\": 5 }").unwrap();

    let err = MinifierConfig::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_missing_config_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = MinifierConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().starts_with("IO error"));
}

#[test]
fn test_init_file_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("jscrunch.json");
    MinifierConfig::init_file(&path).unwrap();

    let config = MinifierConfig::from_file(&path).unwrap();
    assert_eq!(config.include, vec!["**/*.js"]);
    assert!(config.code_settings.reorder_scope_declarations);
}

#[test]
fn test_overrides_win_over_file() {
    let mut config = MinifierConfig::default();
    config.code_settings.kill_switch = TreeModifications::UNNEST_BLOCKS;
    config.merge(&CliOverrides {
        minify_code: Some(false),
        kill_switch: Some(TreeModifications::REDUCE_LOGICAL_NOT),
        pretty: Some(false),
        ..CliOverrides::default()
    });

    let settings = &config.code_settings;
    assert!(!settings.minify_code);
    assert!(!settings.is_modification_allowed(TreeModifications::UNNEST_BLOCKS));
    assert!(!settings.is_modification_allowed(TreeModifications::REDUCE_LOGICAL_NOT));
    assert!(!config.pretty);
}
