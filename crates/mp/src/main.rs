//! Entry point for the `mp` daemon and its control client.
//!
//! Without an action flag the process becomes the daemon; `--stop` and
//! `--reload-plugins` turn it into a short-lived client of a running daemon.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: the daemon's background threads log to stderr too.
    mp::run(std::env::args_os(), &mut io::stdout(), &mut io::stderr())
}
