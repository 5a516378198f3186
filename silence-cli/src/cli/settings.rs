//! Turn parsed arguments into validated `SilenceSettings`.

use std::path::PathBuf;

use clap::ArgMatches;
use silence_lib::settings::{BackendPreference, SettingsError, SilenceSettings};

/// Defaults, then the `--config` file, then explicit flags.
///
/// # Errors
/// Returns an error if the config file cannot be loaded or the merged
/// settings fail validation.
pub fn from_args(args: &ArgMatches) -> Result<SilenceSettings, SettingsError> {
    let mut settings = match args.get_one::<PathBuf>("config") {
        Some(path) => SilenceSettings::from_json_file(path)?,
        None => SilenceSettings::default(),
    };

    apply_overrides(&mut settings, args)?;
    settings.validate()?;
    Ok(settings)
}

fn apply_overrides(settings: &mut SilenceSettings, args: &ArgMatches) -> Result<(), SettingsError> {
    if let Some(backend) = args.get_one::<String>("backend") {
        settings.backend = backend
            .parse::<BackendPreference>()
            .map_err(SettingsError::Invalid)?;
    }
    if let Some(rate) = args.get_one::<u32>("sample-rate") {
        settings.sample_rate = *rate;
    }
    if let Some(frames) = args.get_one::<usize>("chunk-size") {
        settings.chunk_size = *frames;
    }
    if let Some(device) = args.get_one::<String>("device") {
        settings.device = Some(device.clone());
    }
    if let Some(command) = args.get_one::<String>("player-command") {
        settings.player.command = command.clone();
    }
    if let Some(player_args) = args.get_many::<String>("player-arg") {
        settings.player.args = player_args.cloned().collect();
    }
    if let Some(timeout) = args.get_one::<u64>("player-timeout-ms") {
        settings.player.timeout_ms = *timeout;
    }
    if let Some(dir) = args.get_one::<PathBuf>("temp-dir") {
        settings.player.temp_dir = Some(dir.clone());
    }
    if let Some(timeout) = args.get_one::<u64>("stop-timeout-ms") {
        settings.stop_timeout_ms = *timeout;
    }
    Ok(())
}
