use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use jotter_lib::{Error, Store};
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod note;
mod profile;

#[derive(Parser, Debug)]
#[command(name = "jotter")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Profile to log in as
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Password of the profile
    #[arg(short = 'w', long, global = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Operate on profiles
    #[command(subcommand)]
    Profile(profile::Command),
    /// Operate on the notes of the logged-in profile
    #[command(subcommand)]
    Note(note::Command),
}

fn main() -> ExitCode {
    // Human friendly panicking in release mode
    human_panic::setup_panic!();

    // Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not set up logging: {err}");
    }

    let cli = Cli::parse();

    let store = match Store::new() {
        Ok(store) => store,
        Err(err) => return fail(&err).into(),
    };

    let code = match &cli.command {
        Command::Profile(cmd) => profile::handle(&store, cli.password.as_deref(), cmd),
        Command::Note(cmd) => {
            match profile::login(&store, cli.profile.as_deref(), cli.password.as_deref()) {
                Ok(mut session) => note::handle(&mut session, cmd),
                Err(code) => code,
            }
        }
    };

    // The store has to be released on every path, including failed commands
    if let Err(err) = store.close() {
        return fail(&err).into();
    }

    code.into()
}

/// Report a core error to the user and pick the exit code for it.
pub(crate) fn fail(err: &Error) -> sysexits::ExitCode {
    error!("{err}");
    eprintln!("{} {err}", "error:".red().bold());

    match err {
        Error::Storage(_) | Error::Faulted | Error::Closed => sysexits::ExitCode::IoErr,
        Error::ModelVersion { .. } => sysexits::ExitCode::DataErr,
        Error::TitlesExhausted(_) => sysexits::ExitCode::Unavailable,
        Error::Unbound => sysexits::ExitCode::Software,
        Error::Config(_) | Error::NonUtf8Path(_) => sysexits::ExitCode::Config,
    }
}

/// Report a refused operation to the user.
pub(crate) fn refuse(message: &str, code: sysexits::ExitCode) -> sysexits::ExitCode {
    eprintln!("{} {message}", "error:".red().bold());
    code
}
