//! CLI command implementations.
//!
//! Each subcommand is one user action: it restores the session and the
//! active view, navigates where the command points, runs the action through
//! the view model and renders the result. Provides handlers for:
//! - `daec open [VIEW]`: render the active (or given) view
//! - `daec expressions [list|submit TEXT]`
//! - `daec operations [list|set TYPE COST]`
//! - `daec agents`
//! - `daec login | register | logout`
//! - `daec status`: session and service diagnostics
//! - `daec config show|init|set|reset`: configuration management

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;

use crate::api::{ApiError, Gateway, GatewayClient};
use crate::config::{self, DaecConfig};
use crate::router::{ViewName, ViewRouter};
use crate::session::SessionContext;
use crate::views::{
    AgentRow, AgentsView, AuthMode, AuthView, ExpressionRow, ExpressionsView, Notice,
    OperationRow, OperationsView,
};

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

/// Everything one invocation needs: config, client, session and router.
pub struct App {
    pub config: DaecConfig,
    pub client: GatewayClient,
    pub session: SessionContext,
    pub router: ViewRouter,
}

impl App {
    /// Restore the session ("page reload") under a resolved config.
    pub fn load(config: DaecConfig) -> Result<Self> {
        let client = GatewayClient::from_config(&config.api);
        let session = SessionContext::open(&config.session).context("failed to open session")?;
        let router = ViewRouter::restore(&session);
        Ok(Self {
            config,
            client,
            session,
            router,
        })
    }

    fn navigate(&mut self, view: ViewName) -> Result<()> {
        self.router
            .navigate(&mut self.session, view)
            .context("failed to record active view")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// daec open
// ---------------------------------------------------------------------------

/// Render the active view, navigating first when a view is given.
pub fn run_open(config: DaecConfig, view: Option<ViewName>, format: OutputFormat) -> Result<ExitCode> {
    let mut app = App::load(config)?;
    if let Some(view) = view {
        app.navigate(view)?;
    }

    match app.router.active() {
        ViewName::Expressions => show_expressions(&app, format),
        ViewName::Operations => show_operations(&app, format),
        ViewName::Agents => show_agents(&app, format),
        ViewName::Login => {
            print_header(&app);
            print_login_view(&app);
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ---------------------------------------------------------------------------
// daec expressions
// ---------------------------------------------------------------------------

pub fn run_expressions_list(config: DaecConfig, format: OutputFormat) -> Result<ExitCode> {
    let mut app = App::load(config)?;
    app.navigate(ViewName::Expressions)?;
    show_expressions(&app, format)
}

/// Submit an expression, then render the refreshed list.
pub fn run_expressions_submit(
    config: DaecConfig,
    text: &str,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut app = App::load(config)?;
    app.navigate(ViewName::Expressions)?;

    let mut view = ExpressionsView::new(app.config.expressions.clear_input);
    if let Err(e) = view.refresh(&app.client, &app.session) {
        tracing::warn!(error = %e, "could not load expressions before submitting");
    }

    view.set_input(text);
    let Some(notice) = view.submit(&app.client, &app.session) else {
        print_notice(&Notice::error("Enter an expression to calculate"), format);
        return Ok(ExitCode::FAILURE);
    };
    print_notice(&notice, format);
    if notice.is_error() {
        return Ok(ExitCode::FAILURE);
    }

    print_expressions(&view.rows(), format)?;
    Ok(ExitCode::SUCCESS)
}

fn show_expressions(app: &App, format: OutputFormat) -> Result<ExitCode> {
    let mut view = ExpressionsView::new(app.config.expressions.clear_input);
    if let Err(e) = view.refresh(&app.client, &app.session) {
        return Ok(report_fetch_error(&e));
    }
    if format == OutputFormat::Table {
        print_header(app);
    }
    print_expressions(&view.rows(), format)?;
    Ok(ExitCode::SUCCESS)
}

fn print_expressions(rows: &[ExpressionRow], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", listing_json(rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("{}", "No expressions yet. Submit one with `daec expressions submit`.".yellow());
        return Ok(());
    }

    for row in rows {
        println!(
            "  {} {} {}",
            row.icon.glyph(),
            row.title.bold(),
            format!("({})", row.description).dimmed()
        );
        println!("    {} {}", "Created:".dimmed(), format_time(row.created_at));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// daec operations
// ---------------------------------------------------------------------------

pub fn run_operations_list(config: DaecConfig, format: OutputFormat) -> Result<ExitCode> {
    let mut app = App::load(config)?;
    app.navigate(ViewName::Operations)?;
    show_operations(&app, format)
}

/// Edit one operation's cost and save it if it changed.
pub fn run_operations_set(
    config: DaecConfig,
    operation_type: &str,
    cost: u64,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut app = App::load(config)?;
    app.navigate(ViewName::Operations)?;

    let mut view = OperationsView::new();
    if let Err(e) = view.refresh(&app.client, &app.session) {
        return Ok(report_fetch_error(&e));
    }

    if !view.edit(operation_type, cost) {
        let known: Vec<&str> = view
            .rows()
            .iter()
            .map(|r| r.operation.operation_type.as_str())
            .collect();
        let message = format!(
            "Unknown operation type '{operation_type}' (known: {})",
            known.join(", ")
        );
        print_notice(&Notice::error(message), format);
        return Ok(ExitCode::FAILURE);
    }

    let Some(notice) = view.save(&app.client, &app.session, operation_type) else {
        print_notice(
            &Notice::success(format!("{operation_type} already takes {cost}s, nothing to save")),
            format,
        );
        print_operations(view.rows(), format)?;
        return Ok(ExitCode::SUCCESS);
    };
    print_notice(&notice, format);
    if notice.is_error() {
        return Ok(ExitCode::FAILURE);
    }

    print_operations(view.rows(), format)?;
    Ok(ExitCode::SUCCESS)
}

fn show_operations(app: &App, format: OutputFormat) -> Result<ExitCode> {
    let mut view = OperationsView::new();
    if let Err(e) = view.refresh(&app.client, &app.session) {
        return Ok(report_fetch_error(&e));
    }
    if format == OutputFormat::Table {
        print_header(app);
    }
    print_operations(view.rows(), format)?;
    Ok(ExitCode::SUCCESS)
}

fn print_operations(rows: &[OperationRow], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let operations: Vec<_> = rows.iter().map(|r| &r.operation).collect();
        println!("{}", listing_json(&operations)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("{}", "No operations configured.".yellow());
        return Ok(());
    }

    println!("  {:<20} {:>12}", "Operation type", "Cost (sec)");
    println!("  {}", "-".repeat(33));
    for row in rows {
        println!(
            "  {:<20} {:>12}",
            row.operation.operation_type, row.operation.execution_time
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// daec agents
// ---------------------------------------------------------------------------

pub fn run_agents(config: DaecConfig, format: OutputFormat) -> Result<ExitCode> {
    let mut app = App::load(config)?;
    app.navigate(ViewName::Agents)?;
    show_agents(&app, format)
}

fn show_agents(app: &App, format: OutputFormat) -> Result<ExitCode> {
    let mut view = AgentsView::new();
    if let Err(e) = view.refresh(&app.client, &app.session) {
        return Ok(report_fetch_error(&e));
    }
    if format == OutputFormat::Table {
        print_header(app);
    }
    print_agents(&view.rows(), format)?;
    Ok(ExitCode::SUCCESS)
}

fn print_agents(rows: &[AgentRow], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", listing_json(rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("{}", "No agents registered.".yellow());
        return Ok(());
    }

    for row in rows {
        println!("  {} {}", row.icon.glyph(), row.title.bold());
        println!("    {} {}", "Last ping:".dimmed(), format_time(row.last_ping));
        println!(
            "    {} {} ({} active)",
            "Number of parallel calculations:".dimmed(),
            row.parallel_calculations,
            row.active_calculations
        );
        println!("    {} {}", "Created:".dimmed(), format_time(row.created_at));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// daec login | register | logout
// ---------------------------------------------------------------------------

pub fn run_login(config: DaecConfig, email: &str, password: &str) -> Result<ExitCode> {
    run_auth(config, AuthMode::Login, email, password)
}

pub fn run_register(config: DaecConfig, email: &str, password: &str) -> Result<ExitCode> {
    run_auth(config, AuthMode::Registration, email, password)
}

fn run_auth(config: DaecConfig, mode: AuthMode, email: &str, password: &str) -> Result<ExitCode> {
    let mut app = App::load(config)?;
    app.navigate(ViewName::Login)?;

    let mut view = AuthView::new();
    view.switch_mode(mode);
    view.set_email(email);
    view.set_password(password);

    let Some(notice) = view.submit(&app.client, &mut app.session) else {
        print_notice(
            &Notice::error("Email and password are both required"),
            OutputFormat::Table,
        );
        return Ok(ExitCode::FAILURE);
    };
    print_notice(&notice, OutputFormat::Table);
    if notice.is_error() {
        return Ok(ExitCode::FAILURE);
    }

    if view.mode() == AuthMode::Login && mode == AuthMode::Registration {
        println!(
            "  {} Log in with `daec login --email {}`",
            "Next:".dimmed(),
            email
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Drop the stored credential.
pub fn run_logout(config: DaecConfig) -> Result<ExitCode> {
    let mut app = App::load(config)?;
    let was_authenticated = app.session.is_authenticated();
    app.session
        .clear_token()
        .context("failed to clear session token")?;
    if was_authenticated {
        print_notice(&Notice::success("Logged out"), OutputFormat::Table);
    } else {
        println!("  {} Not logged in", "·".dimmed());
    }
    Ok(ExitCode::SUCCESS)
}

fn print_login_view(app: &App) {
    if app.session.is_authenticated() {
        println!("  {} Logged in", "✓".green().bold());
        println!("    {}", "Run `daec logout` to drop the token.".dimmed());
    } else {
        println!("  {} Not logged in", "·".dimmed());
    }
    println!();
    println!("  {} daec login --email <EMAIL> --password <PASSWORD>", "Login:".bold());
    println!(
        "  {} daec register --email <EMAIL> --password <PASSWORD>",
        "Registration:".bold()
    );
}

// ---------------------------------------------------------------------------
// daec status
// ---------------------------------------------------------------------------

/// Show session state and whether the service answers.
pub fn run_status(config: DaecConfig) -> Result<ExitCode> {
    let app = App::load(config)?;

    println!("{}", "daec Status".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();

    print_status_item("Session", true, &app.session.location());
    print_status_item("Active view", true, app.router.active().as_str());
    print_status_item(
        "Token",
        app.session.is_authenticated(),
        if app.session.is_authenticated() {
            "present"
        } else {
            "not logged in"
        },
    );

    let reachable = app.client.list_agents(&app.session);
    let detail = match &reachable {
        Ok(agents) => format!("{} ({} agents)", app.client.base_url(), agents.len()),
        Err(e) => format!("{} ({})", app.client.base_url(), e.message()),
    };
    print_status_item("Service", reachable.is_ok(), &detail);

    Ok(if reachable.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_status_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<15} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// daec config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show(config: &DaecConfig) -> Result<()> {
    let toml_str = config::show_effective_config(config)?;
    println!("{}", "Effective daec Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.daec/config.toml", global_exists);
    print_source(".daec.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "DAEC_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.daec/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Navigation header with the active view underlined.
fn print_header(app: &App) {
    let tabs: Vec<String> = ViewName::ALL
        .iter()
        .map(|&view| {
            if view == app.router.active() {
                view.as_str().bold().underline().to_string()
            } else {
                view.as_str().dimmed().to_string()
            }
        })
        .collect();
    println!("{}", tabs.join("  "));
    println!();
}

/// Print a transient notification.
///
/// Errors go to stderr. Successes go to stdout for tables and to stderr
/// when stdout carries a JSON listing.
pub fn print_notice(notice: &Notice, format: OutputFormat) {
    match notice {
        Notice::Success(message) if notice_on_stdout(notice, format) => {
            println!("{} {}", "✓".green().bold(), message)
        }
        Notice::Success(message) => eprintln!("{} {}", "✓".green().bold(), message),
        Notice::Error(message) => eprintln!("{} {}", "✗".red().bold(), message),
    }
}

fn notice_on_stdout(notice: &Notice, format: OutputFormat) -> bool {
    !notice.is_error() && format == OutputFormat::Table
}

/// Pretty JSON for a listing; the only thing written to stdout in JSON mode.
fn listing_json<T: serde::Serialize + ?Sized>(rows: &T) -> Result<String> {
    serde_json::to_string_pretty(rows).context("failed to encode listing")
}

/// Report a failed fetch. There is no automatic re-authentication.
fn report_fetch_error(err: &ApiError) -> ExitCode {
    print_notice(&Notice::error(err.message()), OutputFormat::Table);
    if err.is_auth() {
        eprintln!(
            "  {} log in with `daec login --email <EMAIL> --password <PASSWORD>`",
            "Hint:".dimmed()
        );
    }
    ExitCode::FAILURE
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
