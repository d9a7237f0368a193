//! SEAP AI Alerts CLI - sign in and search public procurement reports
//!
//! The session credential is kept between invocations (in a file by default,
//! or in the OS keychain), so `login` once and then run `reports` as often as
//! needed. An expired session is refreshed silently on the next search.

use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use seap_cli::{output, App, AppOptions, CliError};
use seap_core::{
    AuthRequest, ReportFilter, ReportQuery, Settings, SortOption, StorageKind, ValueChip,
};

/// SEAP AI Alerts - public procurement alerts from the command line
#[derive(Parser, Debug)]
#[command(name = "seap-alerts")]
#[command(version)]
#[command(about = "SEAP AI Alerts - sign in and search public procurement reports")]
struct Args {
    /// Backend origin (overrides SEAP_API_BASE and settings.json)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Directory holding settings.json and the session file
    #[arg(long, env = "SEAP_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Where to keep the session: file, keychain or memory
    #[arg(long, global = true)]
    storage: Option<StorageKind>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "SEAP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and log in
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "SEAP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Check with the server whether the session is still valid
    Status,
    /// Show the user the session belongs to
    Whoami,
    /// Search reports
    Reports(ReportsArgs),
    /// Forget the stored session
    Logout,
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ClapArgs, Debug)]
struct ReportsArgs {
    /// Free-text search term
    term: Option<String>,

    /// CPV code (or prefix of one)
    #[arg(long)]
    cpv: Option<String>,

    /// Minimum value in RON
    #[arg(long)]
    min: Option<f64>,

    /// Maximum value in RON
    #[arg(long)]
    max: Option<f64>,

    /// Only deals due within this many days
    #[arg(long)]
    within: Option<i64>,

    /// Order by value: high or low
    #[arg(long)]
    value: Option<ValueChip>,

    /// deadline-asc, deadline-desc, value-asc or value-desc
    #[arg(long)]
    sort: Option<SortOption>,

    /// Number of deals to request
    #[arg(long)]
    size: Option<u32>,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Table,
    Board,
    Json,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the saved settings
    Show,
    /// Change saved settings; --api-base and --storage given here are saved too
    Set {
        /// Request timeout in seconds (0 disables it)
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Restore default settings
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(args.verbose))
        .init();

    let mut app = App::open(AppOptions {
        api_base: args.api_base.clone(),
        data_dir: args.data_dir,
        storage: args.storage,
    })
    .await?;

    match args.command {
        Command::Login { email, password } => {
            let client = app.client()?;
            let password = password_or_prompt(password)?;
            let request = AuthRequest::login(email, password);
            match client.login(&request).await? {
                Some(_) => println!("Logged in."),
                None => return Err(CliError::LoginRejected.into()),
            }
        }
        Command::Signup {
            username,
            email,
            password,
        } => {
            let client = app.client()?;
            let password = password_or_prompt(password)?;
            match client.signup(&username, &email, &password).await? {
                Some(_) => println!("Account created, logged in as {}.", username),
                None => return Err(CliError::LoginRejected.into()),
            }
        }
        Command::Status => {
            let client = app.client()?;
            let had_session = app.session().has_credential().await?;
            if client.is_logged_in().await? {
                println!("Logged in.");
            } else if had_session {
                println!("Session rejected by the server, logged out.");
            } else {
                println!("Logged out.");
            }
        }
        Command::Whoami => match app.session().get().await? {
            Some(credential) => print!("{}", output::identity(&credential, Utc::now())),
            None => return Err(CliError::NotLoggedIn.into()),
        },
        Command::Reports(reports) => run_reports(&app, reports).await?,
        Command::Logout => {
            app.logout().await?;
            println!("Logged out.");
        }
        Command::Config { action } => {
            let overrides = SavedOverrides {
                api_base: args.api_base,
                storage: args.storage,
            };
            run_config(&mut app, action, overrides).await?
        }
    }

    Ok(())
}

async fn run_reports(app: &App, args: ReportsArgs) -> Result<(), CliError> {
    let filter = ReportFilter {
        term: args.term,
        cpv: args.cpv,
        min_value: args.min,
        max_value: args.max,
        deadline_within: args.within,
        value_chip: args.value,
        sort: args.sort,
    };
    let size = args.size.unwrap_or(app.effective().page_size);
    let query = ReportQuery::from_filter(&filter, size);

    let client = app.client()?;
    let Some(response) = client.fetch_reports(&query).await? else {
        return Err(CliError::SessionExpired);
    };

    let fetched = response.into_deals();
    let deals = filter.apply(&fetched);
    info!("{} deals fetched, {} after filtering", fetched.len(), deals.len());

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&deals)?),
        Format::Board => print!("{}", output::board_view(&deals)),
        Format::Table if deals.is_empty() => println!("No deals match the current search."),
        Format::Table => print!("{}", output::table(&deals)),
    }

    Ok(())
}

/// Global flags that `config set` writes to settings.json
struct SavedOverrides {
    api_base: Option<String>,
    storage: Option<StorageKind>,
}

async fn run_config(
    app: &mut App,
    action: ConfigAction,
    overrides: SavedOverrides,
) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(app.settings.get())?);
            println!("data dir: {}", app.data_dir.display());
        }
        ConfigAction::Set { timeout, page_size } => {
            let mut settings: Settings = app.settings.get().clone();
            if let Some(base) = overrides.api_base {
                settings.api_base = base;
            }
            if let Some(secs) = timeout {
                settings.request_timeout_secs = (secs > 0).then_some(secs);
            }
            if let Some(kind) = overrides.storage {
                settings.storage = kind;
            }
            if let Some(size) = page_size {
                settings.page_size = size;
            }
            app.settings.update(settings).await?;
            println!("Settings saved.");
        }
        ConfigAction::Reset => {
            app.settings.reset().await?;
            println!("Settings reset to defaults.");
        }
    }
    Ok(())
}

/// `RUST_LOG` applies as given, warn when unset; --verbose raises everything to debug
fn log_filter(verbose: bool) -> EnvFilter {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    if verbose {
        filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        filter
    }
}

fn password_or_prompt(password: Option<String>) -> Result<String, CliError> {
    match password {
        Some(password) => Ok(password),
        None => Ok(rpassword::prompt_password("Password: ")?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_verbose_enables_debug() {
        assert!(log_filter(true).max_level_hint() >= Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_config_set_reads_global_flags() {
        let args = Args::try_parse_from([
            "seap-alerts",
            "config",
            "set",
            "--api-base",
            "https://api.seap-alerts.ro",
            "--storage",
            "keychain",
            "--page-size",
            "20",
        ])
        .unwrap();

        assert_eq!(args.api_base.as_deref(), Some("https://api.seap-alerts.ro"));
        assert_eq!(args.storage, Some(StorageKind::Keychain));
        match args.command {
            Command::Config {
                action: ConfigAction::Set { timeout, page_size },
            } => {
                assert_eq!(timeout, None);
                assert_eq!(page_size, Some(20));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
