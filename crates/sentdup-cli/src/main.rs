use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use sentdup_core::{AppConfig, Database, ExitCode};
use sentdup_engine::{Pass, PassOptions, Reporter};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "sentdup",
    about = "Find exact duplicate sentences and merge them into one survivor",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sentence database, overriding the configured path.
    #[arg(long, global = true, env = "SENTDUP_DB")]
    db: Option<PathBuf>,

    /// Output in JSON format. Also enabled by setting SENTDUP_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one deduplication pass.
    Run(RunArgs),

    /// Show row counts for every table.
    Stats,

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Only consider sentences modified since a date (2014-1-4) or a span ("3d 12h ago").
    #[arg(long)]
    since: Option<String>,

    /// Do everything inside rolled-back transactions and only report.
    #[arg(long)]
    dry: bool,

    /// Post a summary of the pass on the wall.
    #[arg(long)]
    wall: bool,

    /// Comment on every deleted duplicate and on its survivor.
    #[arg(long)]
    cmnt: bool,

    /// Log failing groups and keep going.
    #[arg(long)]
    suppress: bool,

    /// Sentence ids scanned per chunk.
    #[arg(long)]
    chunk_size: Option<i64>,

    /// Log file name inside the configured log directory.
    #[arg(long)]
    log_file: Option<String>,

    /// More progress output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let json_output = cli.json || std::env::var("SENTDUP_JSON").as_deref() == Ok("1");

    if let Err(err) = execute(cli, json_output) {
        if json_output {
            let _ = print_json(&serde_json::json!({
                "status": "error",
                "error": "general",
                "message": format!("{err:#}")
            }));
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(ExitCode::GeneralError as i32);
    }
}

fn execute(cli: Cli, json_output: bool) -> Result<()> {
    let start = Instant::now();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(db) = &cli.db {
        config.database.path = db.to_string_lossy().to_string();
    }

    match cli.command {
        // ── Run ────────────────────────────────────────────────────────────
        Commands::Run(args) => run(&config, args, json_output, start)?,

        // ── Stats ──────────────────────────────────────────────────────────
        Commands::Stats => {
            let db = open_db(&config)?;
            let counts = db.table_counts()?;
            let dur = start.elapsed().as_millis();

            if json_output {
                let data: serde_json::Map<String, serde_json::Value> = counts
                    .iter()
                    .map(|(table, n)| (table.to_string(), serde_json::json!(n)))
                    .collect();
                print_json(&serde_json::json!({"status":"ok","data":data,"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Store statistics ({}):", config.database_path().display());
                for (table, n) in &counts {
                    println!("  {table:<28} {n}");
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    let dur = start.elapsed().as_millis();
                    print_json(&serde_json::json!({"status":"ok","data":config,"meta":{"duration_ms":dur}}))?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
        },
    }

    Ok(())
}

fn run(config: &AppConfig, args: RunArgs, json_output: bool, start: Instant) -> Result<()> {
    let mut options = PassOptions::from_config(&config.dedup);
    options.dry = args.dry;
    options.wall = args.wall;
    options.cmnt = args.cmnt;
    options.suppress = args.suppress;
    if let Some(size) = args.chunk_size {
        if size < 1 {
            invalid_args(json_output, &format!("--chunk-size must be at least 1, got {size}"));
        }
        options.chunk_size = size;
    }
    if let Some(expr) = &args.since {
        options = match options.with_since(expr, Utc::now()) {
            Ok(options) => options,
            Err(e) => invalid_args(json_output, &format!("invalid --since `{expr}`: {e}")),
        };
    }

    let threshold = progress_level(config, args.verbose)?;
    let log_name = args
        .log_file
        .unwrap_or_else(|| Reporter::default_log_name(&Utc::now()));
    // JSON mode keeps stdout for the result document.
    let reporter = if json_output {
        Reporter::new(std::io::stderr(), threshold)
    } else {
        Reporter::stdout(threshold)
    };
    let log_path = config.log_dir().join(log_name);
    let mut reporter = reporter
        .with_log_file(&log_path)
        .with_context(|| format!("opening run log {}", log_path.display()))?;

    let db = open_db(config)?;
    let report = {
        let mut conn = db.connection();
        Pass::new(&mut conn, options).run(&mut reporter)?
    };
    let dur = start.elapsed().as_millis();

    if json_output {
        print_json(&serde_json::json!({
            "status": "ok",
            "data": report,
            "meta": { "duration_ms": dur, "log": log_path }
        }))?;
    } else {
        print!("{}", reporter.report_text());
        println!("Log: {}", log_path.display());
    }
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sentdup=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn progress_level(config: &AppConfig, verbose: u8) -> Result<Level> {
    let configured = Level::from_str(&config.logging.progress_level).with_context(|| {
        format!(
            "logging.progress_level `{}` is not a log level",
            config.logging.progress_level
        )
    })?;
    let requested = match verbose {
        0 => configured,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    Ok(configured.max(requested))
}

fn invalid_args(json_output: bool, message: &str) -> ! {
    if json_output {
        let _ = print_json(&serde_json::json!({
            "status": "error",
            "error": "invalid_args",
            "message": message
        }));
    } else {
        eprintln!("Error: {message}");
    }
    std::process::exit(ExitCode::InvalidArgs as i32);
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn open_db(config: &AppConfig) -> Result<Database> {
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(&db_path)?)
}
