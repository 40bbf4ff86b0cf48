use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use daec::cli::{self, OutputFormat};
use daec::router::ViewName;
use daec::{config, logging};

#[derive(Debug, Parser)]
#[command(name = "daec")]
#[command(about = "Client for the distributed arithmetic expression calculator")]
struct App {
    /// Output format for listings: table (default), json
    #[arg(long, global = true, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render the active view, or navigate to VIEW first
    Open {
        /// expressions | operations | agents | login
        view: Option<ViewName>,
    },
    /// List expressions or submit a new one
    Expressions {
        #[command(subcommand)]
        action: Option<ExpressionsAction>,
    },
    /// List operation costs or change one
    Operations {
        #[command(subcommand)]
        action: Option<OperationsAction>,
    },
    /// Show worker agents and their health
    Agents,
    /// Log in and store the bearer token in the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DAEC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account (does not log in)
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DAEC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Drop the stored bearer token
    Logout,
    /// Show session state and check the service
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ExpressionsAction {
    /// List all expressions
    List,
    /// Submit an expression for evaluation
    Submit {
        /// Expression text, e.g. "2+2*3"
        text: String,
    },
}

#[derive(Debug, Subcommand)]
enum OperationsAction {
    /// List all operation types and their cost
    List,
    /// Set the execution time of one operation type
    Set {
        /// Operation type, e.g. "+"
        operation_type: String,
        /// Execution time in seconds
        cost: u64,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default ~/.daec/config.toml
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key in ~/.daec/config.toml
    Set { key: String, value: String },
    /// Overwrite ~/.daec/config.toml with defaults
    Reset,
}

fn main() -> Result<ExitCode> {
    let app = App::parse();
    let (config, warnings) = config::load();
    logging::init(&config.logging);
    for warning in &warnings {
        tracing::warn!(path = ?warning.path, "{}", warning.message);
    }

    let fmt = OutputFormat::from_str_opt(Some(&app.format));

    match app.command {
        Commands::Open { view } => cli::run_open(config, view, fmt),
        Commands::Expressions { action } => match action {
            None | Some(ExpressionsAction::List) => cli::run_expressions_list(config, fmt),
            Some(ExpressionsAction::Submit { text }) => {
                cli::run_expressions_submit(config, &text, fmt)
            }
        },
        Commands::Operations { action } => match action {
            None | Some(OperationsAction::List) => cli::run_operations_list(config, fmt),
            Some(OperationsAction::Set {
                operation_type,
                cost,
            }) => cli::run_operations_set(config, &operation_type, cost, fmt),
        },
        Commands::Agents => cli::run_agents(config, fmt),
        Commands::Login { email, password } => cli::run_login(config, &email, &password),
        Commands::Register { email, password } => cli::run_register(config, &email, &password),
        Commands::Logout => cli::run_logout(config),
        Commands::Status => cli::run_status(config),
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => cli::run_config_show(&config),
                ConfigAction::Init { force } => cli::run_config_init(force),
                ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
                ConfigAction::Reset => cli::run_config_reset(),
            }?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
