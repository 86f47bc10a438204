//! HRRR overlay command line.
//!
//! Fetches a forecast cycle (cached after the first run) and renders one
//! field, or the default overlay set for the current UTC cycle.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use hrrr_overlay::{bootstrap, OverlayConfig, OverlayOutcome, OverlayPipeline, DEFAULT_URL_TEMPLATE};
use overlay_common::CycleId;

#[derive(Parser, Debug)]
#[command(name = "hrrr-overlay")]
#[command(about = "Render HRRR forecast fields as transparent map overlays")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory for downloaded cycle files
    #[arg(long, env = "HRRR_CACHE_DIR", default_value = "hrrr_cache")]
    cache_dir: PathBuf,

    /// Directory for rendered images
    #[arg(long, env = "HRRR_IMAGE_DIR", default_value = "hrrr_images")]
    output_dir: PathBuf,

    /// Source URL with {date} and {hour} placeholders
    #[arg(long, env = "HRRR_URL_TEMPLATE", default_value = DEFAULT_URL_TEMPLATE)]
    url_template: String,

    /// YAML file with extra parameter and level names
    #[arg(long, env = "HRRR_TABLES")]
    tables: Option<PathBuf>,

    /// Pixels per grid cell
    #[arg(long, env = "HRRR_SCALE", default_value = "1")]
    scale: usize,

    /// Whole-request timeout in seconds (unbounded if unset)
    #[arg(long, env = "HRRR_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one field of one cycle
    Render {
        /// Cycle date, YYYYMMDD
        date: String,
        /// Cycle hour, 0-23
        hour: String,
        /// Field name, e.g. "Simulated radar reflectivity"
        field: String,
        /// Output file name inside the output directory
        output: String,
    },
    /// Render the default overlays for the current UTC cycle
    Latest,
    /// List the variables in a cycle's file
    List {
        date: String,
        hour: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format)?;

    let config = OverlayConfig {
        cache_dir: args.cache_dir,
        output_dir: args.output_dir,
        url_template: args.url_template,
        tables_path: args.tables,
        scale: args.scale,
        request_timeout: args.timeout_secs.map(Duration::from_secs),
    };

    bootstrap(&config).await?;
    let pipeline = OverlayPipeline::from_config(&config)?;

    match args.command.unwrap_or(Command::Latest) {
        Command::Render {
            date,
            hour,
            field,
            output,
        } => {
            let cycle = CycleId::parse(&date, &hour)?;
            info!(cycle = %cycle, field = %field, "Rendering overlay");
            report(&field, &pipeline.run(&cycle, &field, &output).await?);
        }
        Command::Latest => {
            let cycle = CycleId::latest(Utc::now());
            info!(cycle = %cycle, "Rendering default overlays");
            for (output, outcome) in pipeline.run_defaults(&cycle).await? {
                report(&output, &outcome);
            }
        }
        Command::List { date, hour } => {
            let cycle = CycleId::parse(&date, &hour)?;
            match pipeline.list(&cycle).await? {
                Ok(variables) => {
                    for v in variables {
                        println!("{}\t{} step(s)\t{}x{}", v.key, v.steps, v.width, v.height);
                    }
                }
                Err(reason) => warn!(cycle = %cycle, reason = %reason, "Nothing to list"),
            }
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn report(label: &str, outcome: &OverlayOutcome) {
    match outcome {
        OverlayOutcome::Rendered(path) => println!("{}: {}", label, path.display()),
        OverlayOutcome::Skipped(reason) => println!("{}: skipped ({})", label, reason),
    }
}
