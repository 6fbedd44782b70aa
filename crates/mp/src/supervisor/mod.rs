//! Daemon lifecycle supervision.
//!
//! The supervisor launches the daemon in a fixed order, serves bus requests
//! on the calling thread and tears everything down once a stop is requested
//! through a signal, the `Status.stop` hook or [`SupervisorControl::stop`].

mod control;
mod errors;
mod hooks;
mod launch;
mod record;
mod shutdown;

pub use control::{SupervisorControl, SupervisorState};
pub use errors::LaunchError;
pub use launch::{ProcessSupervisor, run_daemon};
pub use record::ProcessRecord;
pub use shutdown::{
    ShutdownError, ShutdownSignal, SignalListener, StopCallback, SystemShutdownSignal,
};

pub(crate) const SUPERVISOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::supervisor");
