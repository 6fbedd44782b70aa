//! Termination-signal sources driven by tests.

use std::io;
use std::sync::Mutex;

use crate::supervisor::{ShutdownError, ShutdownSignal, SignalListener, StopCallback};

/// Signal source raised explicitly with [`TestShutdownSignal::raise`].
#[derive(Default)]
pub(crate) struct TestShutdownSignal {
    callback: Mutex<Option<StopCallback>>,
}

impl TestShutdownSignal {
    /// Delivers a termination request; false when nothing is listening yet.
    pub(crate) fn raise(&self) -> bool {
        let callback = self.callback.lock().expect("signal mutex poisoned").clone();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn install(&self, on_signal: StopCallback) -> Result<SignalListener, ShutdownError> {
        *self.callback.lock().expect("signal mutex poisoned") = Some(on_signal);
        Ok(SignalListener::inert())
    }
}

/// Signal source that cannot be installed.
pub(crate) struct FailingShutdownSignal;

impl ShutdownSignal for FailingShutdownSignal {
    fn install(&self, _on_signal: StopCallback) -> Result<SignalListener, ShutdownError> {
        Err(ShutdownError::Register {
            source: io::Error::other("signal table full"),
        })
    }
}
