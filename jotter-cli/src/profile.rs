use colored::Colorize;
use jotter_lib::{ProfileSession, Store, credentials};
use sysexits::ExitCode;

use crate::{fail, refuse};

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// List profiles
    List,
    /// Create a new profile, using the global password
    Create {
        name: String,
        /// Repeat the password
        #[arg(long)]
        confirm: String,
    },
}

pub fn handle(store: &Store, password: Option<&str>, cmd: &Command) -> ExitCode {
    match cmd {
        Command::List => match store.list_profiles() {
            Ok(profiles) => {
                for profile in profiles {
                    println!("{}", profile.name());
                }
                ExitCode::Ok
            }
            Err(err) => fail(&err),
        },
        Command::Create { name, confirm } => {
            let password = password.unwrap_or_default();
            if let Err(err) = credentials::validate_signup(name, password, confirm) {
                return refuse(&err.to_string(), ExitCode::Usage);
            }

            match store.create_profile(name, password) {
                Ok(true) => {
                    println!("Created profile {}", name.bold());
                    ExitCode::Ok
                }
                Ok(false) => refuse("Name already exists.", ExitCode::CantCreat),
                Err(err) => fail(&err),
            }
        }
    }
}

/// Authenticate against the store and bind a fresh session to the profile.
pub fn login(
    store: &Store,
    name: Option<&str>,
    password: Option<&str>,
) -> Result<ProfileSession, ExitCode> {
    let Some(name) = name else {
        return Err(refuse("No profile given, pass --profile", ExitCode::Usage));
    };

    let profile = match store.read_profile(name) {
        Ok(Some(profile)) => profile,
        Ok(None) => return Err(refuse(&format!("No profile named {name}"), ExitCode::NoUser)),
        Err(err) => return Err(fail(&err)),
    };

    if let Err(err) = credentials::check_login(&profile, password.unwrap_or_default()) {
        return Err(refuse(&err.to_string(), ExitCode::NoPerm));
    }

    let mut session = ProfileSession::new(store.clone());
    session.init(profile.name(), profile.password(), profile.created_at());

    Ok(session)
}
