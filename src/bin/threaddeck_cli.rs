//! ThreadDeck CLI - Bridge interface for the export UI
//!
//! Commands: presets, order, build, stats
//! Outputs JSON to stdout, logs to stderr
//! Returns 1 on unreadable payload, 2 on pipeline failure

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use threaddeck_core::{
    AddressingMode, ColumnBreak, ExportPipeline, ExportRequest, LayoutSpec, PipelineError,
    presets::PresetRegistry,
};

#[derive(Parser)]
#[command(name = "threaddeck-cli")]
#[command(about = "ThreadDeck CLI - Thread Art Instruction Decks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to presets directory
    #[arg(short, long, default_value = "presets")]
    presets_dir: PathBuf,

    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available presets
    Presets,

    /// Show the parsed order and per-occurrence line allocation
    Order(RequestArgs),

    /// Build the paginated instruction deck
    Build(RequestArgs),

    /// Line and fixture statistics only
    Stats(RequestArgs),
}

#[derive(Args)]
struct RequestArgs {
    /// JSON payload: an ExportRequest, or a bare line sequence with --preset
    #[arg(short = 'j', long, conflicts_with = "payload_file")]
    payload: Option<String>,

    /// Read the JSON payload from a file
    #[arg(short = 'f', long)]
    payload_file: Option<PathBuf>,

    /// Take colors, order, board size and layout from a preset
    #[arg(long)]
    preset: Option<String>,

    /// Override the order string
    #[arg(short, long)]
    order: Option<String>,

    #[arg(long)]
    rows: Option<u32>,

    #[arg(long)]
    columns: Option<u32>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Start a new column after every section footer
    #[arg(long)]
    column_break: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Paired,
    Single,
}

impl From<ModeArg> for AddressingMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Paired => AddressingMode::Paired,
            ModeArg::Single => AddressingMode::Single,
        }
    }
}

enum RequestError {
    Payload(String),
    Pipeline(PipelineError),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_payload(args: &RequestArgs) -> Result<serde_json::Value, String> {
    let text = match (&args.payload, &args.payload_file) {
        (Some(p), _) => p.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?,
        (None, None) => return Err("Either --payload or --payload-file is required".to_string()),
    };
    serde_json::from_str(&text).map_err(|e| format!("Invalid payload: {}", e))
}

fn resolve_request(pipeline: &ExportPipeline, args: &RequestArgs) -> Result<ExportRequest, RequestError> {
    let payload = read_payload(args).map_err(RequestError::Payload)?;

    let mut request = match (&args.preset, payload) {
        (Some(preset), serde_json::Value::Array(lines)) => pipeline
            .request_from_preset(preset, lines)
            .map_err(RequestError::Pipeline)?,
        (Some(preset), serde_json::Value::Object(mut obj)) => {
            let lines = match obj.remove("line_sequence").or_else(|| obj.remove("lineSequence")) {
                Some(serde_json::Value::Array(lines)) => lines,
                _ => return Err(RequestError::Payload("Payload has no line sequence".to_string())),
            };
            pipeline
                .request_from_preset(preset, lines)
                .map_err(RequestError::Pipeline)?
        }
        (None, payload) => serde_json::from_value(payload)
            .map_err(|e| RequestError::Payload(format!("Invalid payload: {}", e)))?,
        (Some(_), _) => return Err(RequestError::Payload("Payload must be an array or object".to_string())),
    };

    if let Some(order) = &args.order {
        request.order_spec = order.clone();
    }

    if args.rows.is_some() || args.columns.is_some() || args.mode.is_some() {
        let rows = args.rows.unwrap_or(request.layout.rows_per_column);
        let columns = args.columns.unwrap_or(request.layout.columns_per_page);
        let mode = args.mode.map(AddressingMode::from).unwrap_or(request.layout.mode);
        request.layout = LayoutSpec::from_user(rows, columns, mode)
            .map_err(|e| RequestError::Pipeline(PipelineError::InvalidLayout(e.to_string())))?;
    }
    if args.column_break {
        request.layout = request.layout.with_column_break(ColumnBreak::OnFooter);
    }

    Ok(request)
}

fn print_json(value: &impl serde::Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", serde_json::json!({"success": false, "error": e.to_string()}));
            ExitCode::FAILURE
        }
    }
}

fn fail(error: RequestError) -> ExitCode {
    match error {
        RequestError::Payload(msg) => {
            println!("{}", serde_json::json!({"success": false, "error": msg}));
            ExitCode::FAILURE
        }
        RequestError::Pipeline(e) => {
            println!("{}", serde_json::json!({"success": false, "error": e.to_string()}));
            ExitCode::from(2)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load presets
    let registry = match PresetRegistry::load_from_dir(&cli.presets_dir) {
        Ok(r) => r,
        Err(e) => {
            println!("{}", serde_json::json!({"success": false, "error": format!("Failed to load presets: {}", e)}));
            return ExitCode::FAILURE;
        }
    };

    let pipeline = ExportPipeline::new(registry);

    match cli.command {
        Commands::Presets => {
            let presets: Vec<_> = pipeline.list_presets()
                .iter()
                .map(|p| serde_json::json!({
                    "id": p.id,
                    "name": p.name,
                    "nodes": p.nodes,
                    "group_orders": p.group_orders,
                    "colors": p.color_names(),
                    "target_lines": p.total_target_lines(),
                }))
                .collect();
            print_json(&presets)
        }

        Commands::Order(args) => {
            match resolve_request(&pipeline, &args) {
                Ok(request) => match pipeline.plan(&request) {
                    Ok(plan) => print_json(&plan),
                    Err(e) => fail(RequestError::Pipeline(e)),
                },
                Err(e) => fail(e),
            }
        }

        Commands::Build(args) => {
            match resolve_request(&pipeline, &args) {
                Ok(request) => match pipeline.build_deck(&request) {
                    Ok(deck) => print_json(&serde_json::json!({
                        "success": true,
                        "deck": deck,
                    })),
                    Err(e) => fail(RequestError::Pipeline(e)),
                },
                Err(e) => fail(e),
            }
        }

        Commands::Stats(args) => {
            match resolve_request(&pipeline, &args) {
                Ok(request) => match pipeline.stats(&request) {
                    Ok(stats) => print_json(&stats),
                    Err(e) => fail(RequestError::Pipeline(e)),
                },
                Err(e) => fail(e),
            }
        }
    }
}
