use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use fundcmp::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Model {
    /// Auto-order autoregressive model on the differenced series
    AutoAr,
    /// Holt's double exponential smoothing
    Holt,
}

impl From<Model> for fundcmp::ModelChoice {
    fn from(model: Model) -> fundcmp::ModelChoice {
        match model {
            Model::AutoAr => fundcmp::ModelChoice::AutoAr,
            Model::Holt => fundcmp::ModelChoice::Holt,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List funds available for comparison
    Funds,
    /// Compare historical returns of one or more funds
    Compare {
        /// Fund names, matched case-insensitively as substrings
        #[arg(required = true)]
        funds: Vec<String>,

        /// Investment date (YYYY-MM-DD)
        #[arg(short = 'd', long)]
        date: String,

        /// Initial lump sum
        #[arg(short = 'l', long)]
        lump_sum: Option<f64>,

        /// Extend each series with a +3 year forecast (needs at least
        /// 3 years of history)
        #[arg(short = 'f', long)]
        forecast: bool,

        /// Trend model backing the forecast
        #[arg(long, value_enum, default_value = "auto-ar")]
        model: Model,
    },
}

impl From<Commands> for fundcmp::AppCommand {
    fn from(cmd: Commands) -> fundcmp::AppCommand {
        match cmd {
            Commands::Funds => fundcmp::AppCommand::Funds,
            Commands::Compare {
                funds,
                date,
                lump_sum,
                forecast,
                model,
            } => fundcmp::AppCommand::Compare(fundcmp::CompareOptions {
                funds,
                start_date: date,
                lump_sum,
                forecast,
                model: model.into(),
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => fundcmp::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = fundcmp::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
provider:
  base_url: "https://www.vanguardinvestor.co.uk"

currency: "GBP"
initial_investment: 10000.0
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
