//! CLI argument definitions for `play-silence`.

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
///
/// Settings flags carry no clap defaults; an absent flag leaves the value
/// from the config file (or the built-in default) in place.
pub fn build_cli() -> Command {
    Command::new("play-silence")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Play silence to keep the audio output awake")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Path to a JSON settings file"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .short('b')
                .value_name("BACKEND")
                .value_parser([
                    "auto",
                    "device-stream",
                    "mixer-library",
                    "external-process",
                ])
                .help("Output backend to use"),
        )
        .arg(
            Arg::new("sample-rate")
                .long("sample-rate")
                .value_name("HZ")
                .value_parser(value_parser!(u32))
                .help("Sample rate of the generated silence"),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .value_name("FRAMES")
                .value_parser(value_parser!(usize))
                .help("Frames per device-stream write"),
        )
        .arg(
            Arg::new("device")
                .long("device")
                .value_name("NAME")
                .help("Output device for the device-stream backend"),
        )
        .arg(
            Arg::new("player-command")
                .long("player-command")
                .value_name("COMMAND")
                .help("Player used by the external-process backend"),
        )
        .arg(
            Arg::new("player-arg")
                .long("player-arg")
                .value_name("ARG")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Argument passed to the player before the file path (repeatable)"),
        )
        .arg(
            Arg::new("player-timeout-ms")
                .long("player-timeout-ms")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .help("Longest wait for one external player run"),
        )
        .arg(
            Arg::new("temp-dir")
                .long("temp-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory for staged WAV files"),
        )
        .arg(
            Arg::new("stop-timeout-ms")
                .long("stop-timeout-ms")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .help("Longest wait for the backend to stop on shutdown"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .conflicts_with("debug")
                .help("Only print errors"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .short('d')
                .action(ArgAction::SetTrue)
                .help("Show debug output"),
        )
        .subcommand(Command::new("devices").about("List output devices and exit"))
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("config-json").about("Print the default settings as JSON"),
                ),
        )
}
