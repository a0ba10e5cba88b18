mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{DocumentSource, Session};
use pinpoint_core::ConfigLoader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pinpoint", version, about = "Stable selectors and grid schemas for recorded pages")]
struct Args {
    /// Configuration file (defaults to ./pinpoint.yaml, then ~/.pinpoint/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct Input {
    /// HTML document to load
    #[arg(long)]
    html: Option<PathBuf>,

    /// Recorded DOM snapshot (JSON)
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

impl Input {
    fn source(self) -> anyhow::Result<DocumentSource> {
        match (self.html, self.snapshot) {
            (Some(path), _) => Ok(DocumentSource::Html(path)),
            (None, Some(path)) => Ok(DocumentSource::Snapshot(path)),
            (None, None) => anyhow::bail!("one of --html or --snapshot is required"),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Resolve ranked selectors for the first element matching TARGET
    Resolve {
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        target: String,
    },
    /// List grid-like containers in document order
    Grids {
        #[command(flatten)]
        input: Input,
    },
    /// Infer the column schema of a grid
    Schema {
        #[command(flatten)]
        input: Input,
        /// Grid container selector (first discovered grid when omitted)
        #[arg(long)]
        container: Option<String>,
    },
    /// Re-identify a recorded element in the current document
    Recover {
        #[command(flatten)]
        input: Input,
        /// Recorded step (JSON)
        #[arg(long)]
        step: PathBuf,
    },
    /// Extract grid rows, optionally filtered
    Extract {
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        container: Option<String>,
        /// Row filters (JSON array of {column, operator, value})
        #[arg(long)]
        filters: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries results only
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await?,
        None => ConfigLoader::load_default().await?,
    };

    let output = match args.command {
        Command::Resolve { input, target } => {
            let session = Session::open(input.source()?, config).await?;
            session.resolve(&target, args.format)?
        }
        Command::Grids { input } => {
            let session = Session::open(input.source()?, config).await?;
            session.grids(args.format)?
        }
        Command::Schema { input, container } => {
            let session = Session::open(input.source()?, config).await?;
            session.schema(container.as_deref(), args.format)?
        }
        Command::Recover { input, step } => {
            let session = Session::open(input.source()?, config).await?;
            let step = tokio::fs::read_to_string(&step).await?;
            session.recover(&serde_json::from_str(&step)?, args.format)?
        }
        Command::Extract {
            input,
            container,
            filters,
        } => {
            let session = Session::open(input.source()?, config).await?;
            let filters = match filters {
                Some(path) => serde_json::from_str(&tokio::fs::read_to_string(&path).await?)?,
                None => Vec::new(),
            };
            session.extract(container.as_deref(), &filters, args.format)?
        }
    };

    print!("{}", output);
    Ok(())
}
