//! Budget Planner Core - next-year budget prediction CLI
//!
//! The main entry point for bp-core, handling:
//! - Regression and trend predictions from planning inputs
//! - Historical summaries
//! - Configuration checks and inspection
//! - JSON Schema export of output types

use bp_common::error::{format_error_human, StructuredError};
use bp_common::{Error, OutputFormat, Result, SCHEMA_VERSION};
use bp_config::validate::validate_compatibility;
use bp_config::Variant;
use bp_core::config::{
    load_config, load_history_from_file, load_schema_from_file, resolve_paths, ConfigOptions,
};
use bp_core::exit_codes::ExitCode;
use bp_core::input::{apply_assignments, read_inputs, sample_inputs, PlanningInputs};
use bp_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogFormat, Stage,
};
use bp_core::output::{render_history, render_outcome};
use bp_core::schema::{available_schemas, generate_all_schemas, generate_schema};
use bp_core::{BudgetPredictor, HistorySummary, PredictionOutcome, TrendEstimator};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Budget Planner Core - next-year allocation, committed and spent estimates
#[derive(Parser)]
#[command(name = "bp-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Directory searched for history.json and schema.json
    #[arg(long, global = true, env = "BP_CONFIG_DIR")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true, env = "BP_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict next-year figures from planning inputs
    Predict(PredictArgs),

    /// Predict from the documented sample inputs of a variant
    Demo(DemoArgs),

    /// Summarize the historical dataset
    History(HistoryArgs),

    /// Validate history and schema files
    Check(CheckArgs),

    /// Configuration inspection
    Config(ConfigArgs),

    /// Print JSON Schema of output and config types
    Schema(SchemaArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Prediction model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum Model {
    /// Per-target least squares over the history
    #[default]
    Regression,
    /// Fixed growth rate plus per-input impacts
    Trend,
}

#[derive(Args, Debug)]
struct ConfigFileArgs {
    /// Path to history.json
    #[arg(long)]
    history: Option<PathBuf>,

    /// Path to schema.json (overrides --variant)
    #[arg(long)]
    schema: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PredictArgs {
    #[command(flatten)]
    files: ConfigFileArgs,

    /// Built-in feature schema
    #[arg(long)]
    variant: Option<Variant>,

    #[arg(long, value_enum, default_value_t = Model::Regression)]
    model: Model,

    /// Planning inputs file (.json, .toml, .yaml); `-` reads JSON from stdin
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Planning input as key=value; repeatable, applied after --input
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Variant whose sample inputs and schema are used
    #[arg(long, default_value_t = Variant::default())]
    variant: Variant,

    #[arg(long, value_enum, default_value_t = Model::Regression)]
    model: Model,

    /// Path to history.json
    #[arg(long)]
    history: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    #[command(flatten)]
    files: ConfigFileArgs,

    /// Append a regression prediction for the given inputs
    #[arg(long)]
    with_prediction: bool,

    /// Planning inputs file used with --with-prediction
    #[arg(long, short = 'i', requires = "with_prediction")]
    input: Option<PathBuf>,

    #[arg(long = "set", value_name = "KEY=VALUE", requires = "with_prediction")]
    set: Vec<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    files: ConfigFileArgs,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show resolved config paths, sources and content hashes
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
struct ConfigShowArgs {
    #[command(flatten)]
    files: ConfigFileArgs,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Type name (see --list)
    type_name: Option<String>,

    /// List available types
    #[arg(long, conflicts_with = "type_name")]
    list: bool,

    /// Print every schema, keyed by type name
    #[arg(long, conflicts_with_all = ["type_name", "list"])]
    all: bool,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Predict(_) => "predict",
            Commands::Demo(_) => "demo",
            Commands::History(_) => "history",
            Commands::Check(_) => "check",
            Commands::Config(_) => "config",
            Commands::Schema(_) => "schema",
            Commands::Version => "version",
        }
    }
}

impl ConfigFileArgs {
    fn options(&self, global: &GlobalOpts, variant: Option<Variant>) -> ConfigOptions {
        ConfigOptions {
            config_dir: global.config.clone(),
            history_path: self.history.clone(),
            schema_path: self.schema.clone(),
            variant,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also arrive here, on stdout.
            let code = if err.use_stderr() {
                ExitCode::ArgsError.as_i32()
            } else {
                ExitCode::Success.as_i32()
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let mut log_config = LogConfig::from_env(
        LogConfig::level_from_flags(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    log_config = log_config.with_source_location(cli.global.verbose >= 3);
    init_logging(&log_config);

    let run_id = generate_run_id();
    let command = cli.command.name();
    let span = tracing::info_span!("run", run_id = %run_id, command = command);
    let _enter = span.enter();

    tracing::info!(
        target: event_names::RUN_STARTED,
        stage = %Stage::Init,
        version = env!("CARGO_PKG_VERSION"),
        "starting {}",
        command
    );

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(err) => report_error(&cli.global, &err),
    };

    tracing::info!(
        target: event_names::RUN_FINISHED,
        stage = %Stage::Render,
        exit_code = exit_code.as_i32(),
        "finished with {}",
        exit_code
    );

    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let global = &cli.global;
    match &cli.command {
        Commands::Predict(args) => run_predict(global, args),
        Commands::Demo(args) => run_demo(global, args),
        Commands::History(args) => run_history(global, args),
        Commands::Check(args) => run_check(global, args),
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show(show) => run_config_show(global, show),
        },
        Commands::Schema(args) => run_schema(global, args),
        Commands::Version => {
            print_version(global);
            Ok(ExitCode::Success)
        }
    }
}

fn report_error(global: &GlobalOpts, err: &Error) -> ExitCode {
    let code = ExitCode::for_error(err);
    if code.is_internal_error() {
        tracing::error!(
            target: event_names::INTERNAL_ERROR,
            stage = %Stage::Render,
            code = err.code() as u64,
            "{}",
            err
        );
    }

    if global.format.is_machine_readable() {
        let structured = StructuredError::from(err).with_context("exit_code", code.code_name());
        eprintln!("{}", structured.to_json());
    } else {
        let use_color = !global.no_color && std::io::stderr().is_terminal();
        eprintln!("{}", format_error_human(err, use_color));
    }
    code
}

// ============================================================================
// Command implementations
// ============================================================================

/// Inputs from an optional file, then `key=value` overrides.
fn gather_inputs(input: Option<&Path>, set: &[String]) -> Result<PlanningInputs> {
    let base = match input {
        Some(path) => read_inputs(path)?,
        None => PlanningInputs::new(),
    };
    let inputs = apply_assignments(base, set)?;

    tracing::info!(
        target: event_names::INPUT_PARSED,
        stage = %Stage::Input,
        keys = inputs.len() as u64,
        from_file = input.is_some(),
        "planning inputs parsed"
    );
    Ok(inputs)
}

fn run_model(
    model: Model,
    schema: bp_config::FeatureSchema,
    history: bp_config::HistoricalDataset,
    inputs: &PlanningInputs,
) -> PredictionOutcome {
    match model {
        Model::Regression => BudgetPredictor::new(schema, history).predict(inputs),
        Model::Trend => TrendEstimator::new(schema, history).estimate(inputs),
    }
}

fn print_outcome(global: &GlobalOpts, outcome: &PredictionOutcome) -> Result<ExitCode> {
    let today = chrono::Local::now().date_naive();
    println!("{}", render_outcome(outcome, global.format, today)?);
    Ok(if outcome.is_fallback() {
        ExitCode::Fallback
    } else {
        ExitCode::Success
    })
}

fn run_predict(global: &GlobalOpts, args: &PredictArgs) -> Result<ExitCode> {
    let config = load_config(&args.files.options(global, args.variant))?;
    let inputs = gather_inputs(args.input.as_deref(), &args.set)?;
    let outcome = run_model(args.model, config.schema, config.history, &inputs);
    print_outcome(global, &outcome)
}

fn run_demo(global: &GlobalOpts, args: &DemoArgs) -> Result<ExitCode> {
    let options = ConfigOptions {
        config_dir: global.config.clone(),
        history_path: args.history.clone(),
        schema_path: None,
        variant: Some(args.variant),
    };
    let config = load_config(&options)?;
    let inputs = sample_inputs(args.variant);
    let outcome = run_model(args.model, config.schema, config.history, &inputs);
    print_outcome(global, &outcome)
}

fn run_history(global: &GlobalOpts, args: &HistoryArgs) -> Result<ExitCode> {
    let config = load_config(&args.files.options(global, None))?;
    let mut summary = HistorySummary::from_dataset(&config.history);

    let mut code = ExitCode::Success;
    if args.with_prediction {
        let inputs = gather_inputs(args.input.as_deref(), &args.set)?;
        let outcome = BudgetPredictor::new(config.schema, config.history).predict(&inputs);
        if outcome.is_fallback() {
            code = ExitCode::Fallback;
        }
        summary = summary.with_prediction(&outcome);
    }

    println!("{}", render_history(&summary, global.format)?);
    Ok(code)
}

fn check_entry(name: &str, path: Option<&Path>, error: Option<String>) -> serde_json::Value {
    serde_json::json!({
        "check": name,
        "status": if error.is_some() { "error" } else { "ok" },
        "path": path.map(|p| p.display().to_string()),
        "error": error,
    })
}

fn run_check(global: &GlobalOpts, args: &CheckArgs) -> Result<ExitCode> {
    let paths = resolve_paths(&args.files.options(global, None));
    let mut results = Vec::new();

    let history = match &paths.history {
        Some(path) => match load_history_from_file(path) {
            Ok((history, _)) => {
                results.push(check_entry("history", Some(path), None));
                Some(history)
            }
            Err(e) => {
                results.push(check_entry("history", Some(path), Some(e.to_string())));
                None
            }
        },
        None => {
            results.push(check_entry("history", None, None));
            Some(bp_config::HistoricalDataset::builtin())
        }
    };

    let schema = match &paths.schema {
        Some(path) => match load_schema_from_file(path) {
            Ok((schema, _)) => {
                results.push(check_entry("schema", Some(path), None));
                Some(schema)
            }
            Err(e) => {
                results.push(check_entry("schema", Some(path), Some(e.to_string())));
                None
            }
        },
        None => {
            results.push(check_entry("schema", None, None));
            Some(Variant::default().schema())
        }
    };

    if let (Some(history), Some(schema)) = (&history, &schema) {
        let error = validate_compatibility(schema, history).err().map(|e| e.to_string());
        results.push(check_entry("compatibility", None, error));
    }

    let all_ok = results.iter().all(|r| r["status"] == "ok");

    match global.format {
        OutputFormat::Json | OutputFormat::Report => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": if all_ok { "ok" } else { "error" },
                "checks": results,
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Summary => {
            println!("check: {}", if all_ok { "OK" } else { "FAILED" });
        }
        OutputFormat::Md => {
            println!("# bp-core check");
            println!();
            for result in &results {
                let check = result["check"].as_str().unwrap_or("?");
                let ok = result["status"] == "ok";
                let source = result["path"].as_str().unwrap_or("built-in");
                println!("{} {}: {}", if ok { "✓" } else { "✗" }, check, source);
                if let Some(error) = result["error"].as_str() {
                    println!("  Error: {}", error);
                }
            }
        }
    }

    Ok(if all_ok {
        ExitCode::Success
    } else {
        ExitCode::ConfigError
    })
}

fn run_config_show(global: &GlobalOpts, args: &ConfigShowArgs) -> Result<ExitCode> {
    let config = load_config(&args.files.options(global, None))?;
    let snapshot = &config.snapshot;

    match global.format {
        OutputFormat::Json | OutputFormat::Report => {
            println!("{}", serde_json::to_string_pretty(snapshot)?);
        }
        OutputFormat::Summary => {
            println!(
                "config {}: history={} schema={} ({} features, {} records)",
                snapshot.short_id(),
                snapshot.history_path.as_deref().unwrap_or("built-in"),
                snapshot.schema_path.as_deref().unwrap_or("built-in"),
                snapshot.summary.feature_count,
                snapshot.summary.record_count,
            );
        }
        OutputFormat::Md => {
            println!("# bp-core config show");
            println!();
            println!("## History");
            match &snapshot.history_path {
                Some(path) => {
                    println!("Source: {} ({})", path, snapshot.history_source);
                    println!("Hash: {}", snapshot.history_hash.as_deref().unwrap_or("n/a"));
                }
                None => println!("Source: **built-in** (no history.json found)"),
            }
            println!("Years: {:?}", snapshot.summary.years);
            println!();
            println!("## Schema");
            match &snapshot.schema_path {
                Some(path) => {
                    println!("Source: {} ({})", path, snapshot.schema_source);
                    println!("Hash: {}", snapshot.schema_hash.as_deref().unwrap_or("n/a"));
                }
                None => println!("Source: **built-in** ({})", snapshot.summary.schema_name),
            }
            println!("Features: {}", snapshot.summary.feature_count);
            println!("Next year: {}", snapshot.summary.next_year);
        }
    }
    Ok(ExitCode::Success)
}

fn run_schema(global: &GlobalOpts, args: &SchemaArgs) -> Result<ExitCode> {
    if args.all {
        println!("{}", serde_json::to_string_pretty(&generate_all_schemas())?);
        return Ok(ExitCode::Success);
    }

    let name = match (&args.type_name, args.list) {
        (Some(name), false) => name,
        _ => {
            let types = available_schemas();
            if global.format == OutputFormat::Json {
                let list: Vec<_> = types
                    .iter()
                    .map(|(name, desc)| serde_json::json!({ "name": name, "description": desc }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for (name, desc) in types {
                    println!("{:<20} {}", name, desc);
                }
            }
            return Ok(ExitCode::Success);
        }
    };

    let schema = generate_schema(name).ok_or_else(|| {
        Error::InvalidInput(format!(
            "unknown schema type '{}' (see `bp-core schema --list`)",
            name
        ))
    })?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(ExitCode::Success)
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json | OutputFormat::Report => {
            let version_info = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "bp_core_version": env!("CARGO_PKG_VERSION"),
                "rust_version": env!("CARGO_PKG_RUST_VERSION"),
            });
            println!("{:#}", version_info);
        }
        _ => {
            println!("bp-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}
