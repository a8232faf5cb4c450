use anyhow::{Context, Result};
use azure_resource_mcp::config::Config;
use azure_resource_mcp::mcp::{tools_list, McpServer};
use azure_resource_mcp::VERSION;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// MCP server for listing Azure resources and costs
#[derive(Parser, Debug)]
#[command(name = "azure-resource-mcp", version, about, long_about = None)]
struct Args {
    /// Default subscription for tool calls (overrides AZURE_SUBSCRIPTION_ID)
    #[arg(short, long)]
    subscription_id: Option<String>,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the tool catalogue as JSON and exit
    #[arg(long)]
    list_tools: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_directive(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

/// stdout carries MCP traffic, so logs go to stderr or a file
fn setup_logging(args: &Args) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(directive) = args.log_level.to_directive() else {
        return Ok(None);
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let (writer, guard) = match &args.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {:?}", parent))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("azure-resource-mcp {} started with log level: {:?}", VERSION, args.log_level);
    if let Some(path) = &args.log_file {
        tracing::info!("Log file: {:?}", path);
    }

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_tools {
        println!("{}", serde_json::to_string_pretty(&tools_list())?);
        return Ok(());
    }

    let _log_guard = setup_logging(&args)?;

    let config = Config::from_env()
        .context("Invalid configuration")?
        .with_subscription(args.subscription_id.clone());

    match &config.subscription_id {
        Some(id) => tracing::info!("Default subscription: {}", id),
        None => tracing::warn!(
            "No default subscription configured; tool calls must pass subscription_id"
        ),
    }

    McpServer::new(config).serve_stdio().await
}
