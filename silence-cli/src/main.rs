//! # Play Silence
//!
//! Keeps the default audio output awake by playing silence until interrupted.

use log::error;

mod cli;
mod logging;
mod runner;
mod signals;

fn main() {
    dotenv::dotenv().ok();

    let args = cli::args::build_cli().get_matches();
    logging::init(args.get_flag("quiet"), args.get_flag("debug"));

    let code = match runner::run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            1
        }
    };

    std::process::exit(code)
}
