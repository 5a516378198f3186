use std::fmt::{Display, Formatter};
use std::io;

use clap::ArgMatches;
use log::{debug, info};
use silence_lib::backend::{output_device_names, BackendError};
use silence_lib::selector::BackendSelector;
use silence_lib::session::{self, SessionError};
use silence_lib::settings::{SettingsError, SilenceSettings};

use crate::{cli, signals};

/// Anything that ends the program with a non-zero exit code.
#[derive(Debug)]
pub enum RunError {
    Settings(SettingsError),
    Session(SessionError),
    Devices(BackendError),
    Json(serde_json::Error),
    Signals(io::Error),
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settings(err) => write!(f, "invalid settings: {}", err),
            Self::Session(err) => write!(f, "{}", err),
            Self::Devices(err) => write!(f, "cannot list devices: {}", err),
            Self::Json(err) => write!(f, "cannot encode settings: {}", err),
            Self::Signals(err) => write!(f, "cannot install signal handlers: {}", err),
        }
    }
}

impl std::error::Error for RunError {}

impl From<SettingsError> for RunError {
    fn from(err: SettingsError) -> Self {
        Self::Settings(err)
    }
}

impl From<SessionError> for RunError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

pub fn run(args: &ArgMatches) -> Result<i32, RunError> {
    match args.subcommand() {
        Some(("devices", _)) => list_devices(),
        Some(("create", create)) => match create.subcommand() {
            Some(("config-json", _)) => print_default_settings(),
            _ => Ok(2),
        },
        _ => play(args),
    }
}

fn list_devices() -> Result<i32, RunError> {
    for name in output_device_names().map_err(RunError::Devices)? {
        println!("{}", name);
    }
    Ok(0)
}

fn print_default_settings() -> Result<i32, RunError> {
    let json =
        serde_json::to_string_pretty(&SilenceSettings::default()).map_err(RunError::Json)?;
    println!("{}", json);
    Ok(0)
}

fn play(args: &ArgMatches) -> Result<i32, RunError> {
    let settings = cli::settings::from_args(args)?;
    debug!("settings: {:?}", settings);

    signals::install().map_err(RunError::Signals)?;

    let selector = BackendSelector::from_settings(&settings);
    session::run(&settings, &selector, &signals::interrupted)?;

    if let Some(signum) = signals::last_signal() {
        info!("Received signal {}; exiting", signum);
    }
    Ok(0)
}
