use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use owo_colors::OwoColorize;
use serde_json::json;

use salvage::config::RecoveryConfig;
use salvage::logging::{init_logging, LoggingConfig};
use salvage::recovery::ErrorHandler;
use salvage::taxonomy::Context;

#[derive(Parser, Debug)]
#[command(name = "salvage")]
#[command(version)]
#[command(about = "Error classification and recovery toolkit for autonomous coding agents")]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(long, short, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify error text without running recovery
    Classify {
        /// The error message to classify
        message: String,

        /// Context entries as KEY=VALUE pairs (integer values parsed as numbers)
        #[arg(long = "context", short = 'C', value_name = "KEY=VALUE")]
        context: Vec<String>,

        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify error text and run the recovery dispatcher once
    ///
    /// Exits 0 when recovery signals a retry is worthwhile, 1 otherwise.
    Recover {
        /// The error message to recover from
        message: String,

        /// Context entries as KEY=VALUE pairs (integer values parsed as numbers)
        #[arg(long = "context", short = 'C', value_name = "KEY=VALUE")]
        context: Vec<String>,

        /// Print the recovery result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default classification rules in priority order
    Rules,
}

/// Parses `--context KEY=VALUE` pairs into a context map.
fn parse_context(pairs: &[String]) -> Result<Context, String> {
    let mut context = Context::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(format!(
                "invalid context entry '{}', expected KEY=VALUE",
                pair
            ));
        };
        let value = match value.parse::<u64>() {
            Ok(number) => json!(number),
            Err(_) => json!(value),
        };
        context.insert(key.to_string(), value);
    }
    Ok(context)
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    let handler = match &cli.config {
        Some(path) => ErrorHandler::from_config(&RecoveryConfig::load(path)?),
        None => ErrorHandler::new(),
    };

    match cli.command {
        Commands::Classify {
            message,
            context,
            json,
        } => {
            let context = parse_context(&context)?;
            let classified = handler.classify(&message, context);

            if json {
                println!("{}", serde_json::to_string_pretty(&classified)?);
            } else {
                println!("{}   {}", "category:".bold(), classified.category.yellow());
                println!("{}    {}", "message:".bold(), classified.user_message);
                println!(
                    "{} {}",
                    "suggestion:".bold(),
                    classified.recovery_suggestion
                );
                println!("{}  {}", "retryable:".bold(), classified.retry_allowed);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Recover {
            message,
            context,
            json,
        } => {
            let context = parse_context(&context)?;
            let classified = handler.classify(&message, context);
            let result = handler.recover_classified(&classified).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                if result.success {
                    println!("{} {}", "retry".green().bold(), result.message);
                } else {
                    println!("{} {}", "failed".red().bold(), result.message);
                }
                if let Some(suggestion) = &result.suggestion {
                    println!("\n{}", suggestion);
                }
                if let Some(new_state) = &result.new_state {
                    println!(
                        "\n{} {}",
                        "new state:".bold(),
                        serde_json::to_string(new_state)?
                    );
                }
            }

            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Rules => {
            for (index, rule) in handler.classifier().rules().iter().enumerate() {
                println!(
                    "{:>2}. {:<18} {}",
                    index + 1,
                    rule.category().as_str().yellow(),
                    rule.description()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
