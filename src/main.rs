use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use skywatch::app::AppContext;
use skywatch::auth::AuthError;
use skywatch::config::{ConfigError, ConsoleConfig};
use skywatch::host::Appearance;
use skywatch::state::{LoginOutcome, SessionState, Theme};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("login failed: {0}")]
    Login(#[from] AuthError),
    #[error("login was superseded by another session change")]
    Superseded,
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "skywatch", about = "Skywatch console session and appearance state")]
struct Cli {
    /// Directory holding persisted state (overrides `SKYWATCH_STATE_DIR`).
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// OS appearance to report (overrides `SKYWATCH_SYSTEM_APPEARANCE`).
    #[arg(long, value_enum)]
    system_appearance: Option<AppearanceArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with the stand-in login service.
    Login {
        username: String,
        #[arg(long, env = "SKYWATCH_PASSWORD")]
        password: String,
    },
    /// Sign out.
    Logout,
    /// Re-validate the stored token; signs out if it was rejected.
    Refresh,
    /// Print the current session as JSON.
    Whoami,
    /// Inspect or change the display theme.
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ThemeCommand {
    Show,
    Set {
        #[arg(value_enum)]
        theme: ThemeArg,
    },
    Toggle,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Light,
    Dark,
    System,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::System => Theme::System,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AppearanceArg {
    Light,
    Dark,
}

impl From<AppearanceArg> for Appearance {
    fn from(arg: AppearanceArg) -> Self {
        match arg {
            AppearanceArg::Light => Appearance::Light,
            AppearanceArg::Dark => Appearance::Dark,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ConsoleConfig::from_env()?;
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }
    if let Some(appearance) = cli.system_appearance {
        config.system_appearance = appearance.into();
    }

    let ctx = AppContext::from_config(&config);

    match cli.command {
        Command::Login { username, password } => match ctx.session.login(&username, &password).await? {
            LoginOutcome::SignedIn => print_session(&ctx.session.snapshot()),
            LoginOutcome::Superseded => return Err(CliError::Superseded),
        },
        Command::Logout => {
            ctx.session.logout();
            println!("signed out");
        }
        Command::Refresh => {
            ctx.session.refresh_token().await;
            print_session(&ctx.session.snapshot());
        }
        Command::Whoami => {
            let snapshot = ctx.session.snapshot().durable();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Theme { command } => {
            match command {
                ThemeCommand::Show => {}
                ThemeCommand::Set { theme } => ctx.preferences.set_theme(theme.into()),
                ThemeCommand::Toggle => {
                    ctx.preferences.toggle_theme();
                }
            }
            print_preferences(&ctx);
        }
    }

    Ok(())
}

fn print_session(state: &SessionState) {
    match &state.user {
        Some(user) if state.is_authenticated => {
            println!("signed in as {} <{}> ({})", user.username, user.email, user.role.label());
        }
        _ => println!("signed out"),
    }
}

fn print_preferences(ctx: &AppContext) {
    let state = ctx.preferences.snapshot();
    println!(
        "theme={} appearance={} toggle={} classes={}",
        state.theme.as_str(),
        state.appearance().as_str(),
        ctx.preferences.policy().as_str(),
        ctx.document.classes().join(" "),
    );
}
