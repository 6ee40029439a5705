use clap::Parser;
use jscrunch_core::config::{EvalTreatment, LocalRenaming, OutputMode};
use jscrunch_core::diagnostics::{CollectingDiagnosticHandler, Diagnostic, DiagnosticLevel};
use jscrunch_core::{CliOverrides, Container, DiagnosticHandler, MinifierConfig, TreeModifications};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::{DirEntry, WalkDir};

const DEFAULT_CONFIG: &str = "jscrunch.json";

/// jscrunch - shrink JavaScript by renaming locals and rewriting statements
#[derive(Parser, Debug, Clone)]
#[command(name = "jscrunch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input files or directories to minify
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to a jscrunch.json or .yaml configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for minified files
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Write output to stdout instead of files
    #[arg(long)]
    stdout: bool,

    /// Reformat only: multi-line output, no renaming, no rewrites
    #[arg(long)]
    pretty_print: bool,

    /// Emit one statement per line
    #[arg(long)]
    multi_line: bool,

    /// Spaces per indent level in multi-line output
    #[arg(long, value_name = "N")]
    indent_size: Option<usize>,

    /// How direct eval limits renaming (ignore, immediate, all)
    #[arg(long, value_name = "MODE")]
    eval: Option<String>,

    /// Which locals get renamed (all, none, localization)
    #[arg(long, value_name = "MODE")]
    rename: Option<String>,

    /// Names never to rename (comma-separated)
    #[arg(long, value_name = "NAMES")]
    no_rename: Option<String>,

    /// Bitmask of rewrite categories to disable
    #[arg(long, value_name = "BITS")]
    kill_switch: Option<u64>,

    /// Write a default jscrunch.json to the current directory
    #[arg(long)]
    init: bool,

    /// Print diagnostics without colors
    #[arg(long)]
    plain: bool,

    /// Show diagnostic codes
    #[arg(long)]
    diagnostics: bool,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG=debug for pass-level logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.init {
        MinifierConfig::init_file(Path::new(DEFAULT_CONFIG))?;
        println!("Created {}", DEFAULT_CONFIG);
        return Ok(());
    }

    let config = load_config(&cli)?;
    let files = collect_files(&cli.files)?;
    if files.is_empty() {
        anyhow::bail!("No input files specified. Use --help for usage information.");
    }

    info!("Input files: {} file(s)", files.len());
    if let Some(ref out_dir) = config.out_dir {
        info!("Output directory: {}", out_dir);
    }

    let failed = minify_files(&cli, &config, &files)?;
    if failed > 0 {
        anyhow::bail!("{} file(s) failed to minify", failed);
    }
    Ok(())
}

/// Load configuration from file (if any) and merge command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<MinifierConfig> {
    let mut config = if let Some(ref path) = cli.config {
        MinifierConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config file: {}", e))?
    } else {
        let default_path = PathBuf::from(DEFAULT_CONFIG);
        if default_path.exists() {
            MinifierConfig::from_file(&default_path)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", DEFAULT_CONFIG, e))?
        } else {
            MinifierConfig::default()
        }
    };

    let mut overrides = CliOverrides::default();
    if cli.pretty_print {
        overrides.output_mode = Some(OutputMode::MultipleLines);
        overrides.minify_code = Some(false);
        overrides.local_renaming = Some(LocalRenaming::KeepAll);
    }
    if cli.multi_line {
        overrides.output_mode = Some(OutputMode::MultipleLines);
    }
    overrides.indent_size = cli.indent_size;
    if let Some(ref eval) = cli.eval {
        overrides.eval_treatment = Some(match eval.as_str() {
            "ignore" => EvalTreatment::Ignore,
            "immediate" => EvalTreatment::MakeImmediateSafe,
            "all" => EvalTreatment::MakeAllSafe,
            _ => anyhow::bail!(
                "Invalid eval mode '{}'. Supported modes: ignore, immediate, all",
                eval
            ),
        });
    }
    if let Some(ref rename) = cli.rename {
        overrides.local_renaming = Some(match rename.as_str() {
            "all" => LocalRenaming::CrunchAll,
            "none" => LocalRenaming::KeepAll,
            "localization" => LocalRenaming::KeepLocalizationVars,
            _ => anyhow::bail!(
                "Invalid rename mode '{}'. Supported modes: all, none, localization",
                rename
            ),
        });
    }
    if let Some(ref names) = cli.no_rename {
        overrides.no_auto_renames = Some(
            names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        );
    }
    overrides.kill_switch = cli.kill_switch.map(TreeModifications::from_bits_truncate);
    if let Some(ref out_dir) = cli.out_dir {
        overrides.out_dir = Some(out_dir.to_string_lossy().to_string());
    }
    if cli.plain {
        overrides.pretty = Some(false);
    }

    config.merge(&overrides);
    debug!(settings = ?config.code_settings, "configuration loaded");
    Ok(config)
}

/// Expand directories into the `.js` files under them, skipping `.min.js`
fn collect_files(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            collect_directory(input, &mut files)?;
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn collect_directory(dir: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_minifiable(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(())
}

/// `node_modules` and hidden directories are never walked
fn is_skipped_dir(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name == "node_modules" || name.starts_with('.'))
}

fn is_minifiable(path: &Path) -> bool {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    name.ends_with(".js") && !name.ends_with(".min.js")
}

/// Result of minifying a single file
struct MinifyResult {
    file_path: PathBuf,
    source: String,
    diagnostics: Vec<Diagnostic>,
    output: Result<String, String>,
}

/// Minify every file in parallel, then report and write in input order.
/// Returns how many files failed.
fn minify_files(cli: &Cli, config: &MinifierConfig, files: &[PathBuf]) -> anyhow::Result<usize> {
    use rayon::prelude::*;

    let results: Vec<MinifyResult> = files
        .par_iter()
        .map(|file_path| {
            let source = match std::fs::read_to_string(file_path) {
                Ok(source) => source,
                Err(e) => {
                    return MinifyResult {
                        file_path: file_path.clone(),
                        source: String::new(),
                        diagnostics: Vec::new(),
                        output: Err(format!("Failed to read file: {}", e)),
                    }
                }
            };
            let handler = Arc::new(CollectingDiagnosticHandler::new());
            let container = Container::with_dependencies(config.clone(), handler.clone());
            let output = container.minify(&source).map_err(|e| e.to_string());
            debug!("Minified {:?}", file_path);
            MinifyResult {
                file_path: file_path.clone(),
                source,
                diagnostics: handler.get_diagnostics(),
                output,
            }
        })
        .collect();

    let mut failed = 0;
    for result in results {
        print_diagnostics(
            &result.diagnostics,
            &result.source,
            &result.file_path,
            config.pretty,
            cli.diagnostics,
        );
        match result.output {
            Ok(output) if cli.stdout => println!("{}", output),
            Ok(output) => {
                let output_path = determine_output_path(&result.file_path, config);
                if let Some(parent) = output_path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                std::fs::write(&output_path, output)?;
                info!("Wrote {:?}", output_path);
            }
            Err(message) => {
                failed += 1;
                if !result.diagnostics.iter().any(|d| d.level == DiagnosticLevel::Error) {
                    eprintln!("{}: error: {}", result.file_path.to_string_lossy(), message);
                }
                warn!("Skipped {:?}", result.file_path);
            }
        }
    }
    Ok(failed)
}

/// Determine the output file path for a given input file
fn determine_output_path(file_path: &Path, config: &MinifierConfig) -> PathBuf {
    let file_name = format!(
        "{}.min.js",
        file_path.file_stem().unwrap_or_default().to_string_lossy()
    );
    match &config.out_dir {
        Some(out_dir) => PathBuf::from(out_dir).join(file_name),
        None => file_path.with_file_name(file_name),
    }
}

fn print_diagnostics(
    diagnostics: &[Diagnostic],
    source: &str,
    file_path: &Path,
    pretty: bool,
    show_codes: bool,
) {
    let file_name = file_path.to_string_lossy();

    for diagnostic in diagnostics {
        // Info-level findings (unused names and the like) only show with --diagnostics
        if diagnostic.level == DiagnosticLevel::Info && !show_codes {
            continue;
        }
        let code_str = if show_codes {
            format!(" [{}]", diagnostic.code)
        } else {
            String::new()
        };

        if pretty {
            let severity_str = match diagnostic.level {
                DiagnosticLevel::Error => "\x1b[31merror\x1b[0m",
                DiagnosticLevel::Warning => "\x1b[33mwarning\x1b[0m",
                DiagnosticLevel::Info => "\x1b[34minfo\x1b[0m",
            };

            eprintln!(
                "\n{} [{}:{}:{}]: {}{}",
                severity_str,
                file_name,
                diagnostic.span.line,
                diagnostic.span.column,
                diagnostic.message,
                code_str
            );

            let line = diagnostic.span.line as usize;
            if let Some(text) = line.checked_sub(1).and_then(|i| source.lines().nth(i)) {
                eprintln!("    {}", text);
                eprintln!(
                    "    {}\x1b[31m^\x1b[0m",
                    " ".repeat(diagnostic.span.column.saturating_sub(1) as usize)
                );
            }
        } else {
            let severity_str = match diagnostic.level {
                DiagnosticLevel::Error => "error",
                DiagnosticLevel::Warning => "warning",
                DiagnosticLevel::Info => "info",
            };

            eprintln!(
                "{}:{}:{}: {}: {}{}",
                file_name,
                diagnostic.span.line,
                diagnostic.span.column,
                severity_str,
                diagnostic.message,
                code_str
            );
        }
    }
}
