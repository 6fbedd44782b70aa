//! Ordered named-event dispatch for the `mp` control plane.
//!
//! A [`HookDispatcher`] maps dot-namespaced hook names such as
//! `Status.onStartup` to an ordered list of handlers. Calling a hook runs its
//! handlers in registration order, threading each handler's result into the
//! next one as `last_return`. Handlers steer the chain explicitly through
//! [`HookFlow`]: `Continue` passes a value on, `Halt` ends the chain.
//!
//! The same dispatcher backs local lifecycle wiring (subsystem start and stop)
//! and remote control requests arriving over the bus.

mod dispatcher;
mod errors;
mod flow;
mod name;
pub mod names;

pub use dispatcher::HookDispatcher;
pub use errors::{HookError, HookNameError};
pub use flow::{HookFlow, HookHandler};
pub use name::HookName;

#[cfg(test)]
mod tests;
