use serde_json::Value;

use crate::errors::HookError;

/// Outcome of one handler in a dispatch chain.
#[derive(Debug, Clone, PartialEq)]
pub enum HookFlow {
    /// Pass the value to the next handler as its `last_return`.
    Continue(Value),
    /// Stop the chain; the value becomes the result of the call.
    Halt(Value),
}

impl HookFlow {
    /// Value carried by either variant.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Continue(value) | Self::Halt(value) => value,
        }
    }

    /// Reports whether the chain should stop after this handler.
    #[must_use]
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt(_))
    }
}

/// A callable registered against a hook name.
///
/// Handlers receive the call's optional parameters and the value returned by
/// the previous handler in the chain (`Value::Null` for the first handler).
pub trait HookHandler: Send + Sync {
    /// Runs the handler.
    ///
    /// # Errors
    ///
    /// Returns a [`HookError`] when the handler fails; the dispatcher decides
    /// whether the rest of the chain still runs.
    fn handle(&self, params: Option<&Value>, last_return: Value) -> Result<HookFlow, HookError>;
}

impl<F> HookHandler for F
where
    F: Fn(Option<&Value>, Value) -> Result<HookFlow, HookError> + Send + Sync,
{
    fn handle(&self, params: Option<&Value>, last_return: Value) -> Result<HookFlow, HookError> {
        self(params, last_return)
    }
}
