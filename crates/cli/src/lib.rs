pub mod commands;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mercado_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use rust_decimal::Decimal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "mercado",
    about = "Mercado pricing and demand engine CLI",
    long_about = "Estimate demand, suggest prices, compare proposed prices against the market, \
                  recommend products, and load the demo marketplace.",
    after_help = "Examples:\n  mercado seed\n  mercado demand 1\n  \
                  mercado market \"huevos de campo\" 3.50 --unit docena\n  mercado recommend 1"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read configuration from this TOML file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override database.url")]
    database_url: Option<String>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Override logging.format (compact|pretty|json)")]
    log_format: Option<LogFormat>,
    #[arg(long, global = true, help = "Override pricing.candidate_limit")]
    candidate_limit: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Estimate recency-weighted demand for a product")]
    Demand { product_id: i64 },
    #[command(about = "Suggest a price from recent sales trend and demand")]
    Suggest { product_id: i64 },
    #[command(about = "Compare a proposed price against similar catalog products")]
    Market {
        name: String,
        price: Decimal,
        #[arg(long, default_value = "unidad", help = "Unit the proposed price refers to")]
        unit: String,
    },
    #[command(about = "Recommend products for a consumer")]
    Recommend { consumer_id: i64 },
    #[command(about = "Convert a unit price into another unit of sale")]
    Convert {
        price: Decimal,
        from: String,
        to: String,
        #[arg(long, default_value = "", help = "Product name, for count-only families")]
        product: String,
    },
    #[command(about = "Install the schema and load the demo marketplace")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                log_level: self.log_level.clone(),
                log_format: self.log_format,
                candidate_limit: self.candidate_limit,
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    // A config that fails to load is reported by the command itself.
    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Demand { product_id } => commands::demand::run(&options, product_id),
        Command::Suggest { product_id } => commands::suggest::run(&options, product_id),
        Command::Market { name, price, unit } => {
            commands::market::run(&options, &name, price, &unit)
        }
        Command::Recommend { consumer_id } => commands::recommend::run(&options, consumer_id),
        Command::Convert { price, from, to, product } => {
            commands::convert::run(price, &from, &to, &product)
        }
        Command::Seed => commands::seed::run(&options),
        Command::Config => commands::config::run(&options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the JSON payload.
fn init_logging(config: &AppConfig) {
    use LogFormat::*;

    let filter = log_filter(&config.logging.level, env::var("RUST_LOG").ok().as_deref());
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}

/// `RUST_LOG`-style directives win when present; otherwise the configured
/// level applies to every target.
fn log_filter(level: &str, directives: Option<&str>) -> EnvFilter {
    let default_level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .parse_lossy(directives.unwrap_or_default())
}
