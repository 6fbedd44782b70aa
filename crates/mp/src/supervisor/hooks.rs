//! Control hooks served to bus clients and subsystem lifecycle hooks.

use std::sync::Arc;

use mp_hooks::names::{
    PLUGINS_RELOAD, STATUS_GET_OS_PID, STATUS_GET_TIME_STARTED, STATUS_GET_UPTIME,
    STATUS_ON_SHUTDOWN, STATUS_ON_STARTUP, STATUS_STOP,
};
use mp_hooks::{HookDispatcher, HookError, HookFlow};
use serde_json::{Value, json};

use super::control::SupervisorControl;
use super::record::ProcessRecord;
use crate::subsystems::{PluginHost, Subsystem};

pub(super) fn register_control_hooks(
    dispatcher: &HookDispatcher,
    control: &Arc<SupervisorControl>,
    plugins: &Arc<dyn PluginHost>,
) {
    let reader = Arc::clone(control);
    dispatcher.register(STATUS_GET_OS_PID, move |_, _| {
        record_of(&reader).map(|record| HookFlow::Continue(json!(record.pid())))
    });

    let reader = Arc::clone(control);
    dispatcher.register(STATUS_GET_TIME_STARTED, move |_, _| {
        record_of(&reader).map(|record| HookFlow::Continue(json!(record.started_unix_seconds())))
    });

    let reader = Arc::clone(control);
    dispatcher.register(STATUS_GET_UPTIME, move |_, _| {
        record_of(&reader).map(|record| HookFlow::Continue(json!(record.uptime().as_secs_f64())))
    });

    let stopper = Arc::clone(control);
    dispatcher.register(STATUS_STOP, move |_, last_return| {
        Ok(HookFlow::Continue(stopper.stop(last_return)))
    });

    let plugins = Arc::clone(plugins);
    dispatcher.register(PLUGINS_RELOAD, move |_, last_return| {
        plugins
            .reload()
            .map_err(|error| HookError::caused("plugin reload failed", error))?;
        Ok(HookFlow::Continue(last_return))
    });
}

pub(super) fn register_subsystems(dispatcher: &HookDispatcher, subsystems: &[Arc<dyn Subsystem>]) {
    for subsystem in subsystems {
        let starting = Arc::clone(subsystem);
        dispatcher.register(STATUS_ON_STARTUP, move |_, last_return: Value| {
            starting.start().map_err(|error| {
                HookError::caused(format!("{} failed to start", starting.name()), error)
            })?;
            Ok(HookFlow::Continue(last_return))
        });

        let stopping = Arc::clone(subsystem);
        dispatcher.register(STATUS_ON_SHUTDOWN, move |_, last_return: Value| {
            stopping.stop().map_err(|error| {
                HookError::caused(format!("{} failed to stop", stopping.name()), error)
            })?;
            Ok(HookFlow::Continue(last_return))
        });
    }
}

fn record_of(control: &SupervisorControl) -> Result<ProcessRecord, HookError> {
    control
        .record()
        .copied()
        .ok_or_else(|| HookError::failed("process start has not been recorded"))
}
