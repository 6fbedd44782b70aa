//! Unit tests for the dispatcher and hook names.

use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use crate::{HookDispatcher, HookError, HookFlow, HookName, HookNameError, names};

#[fixture]
fn dispatcher() -> HookDispatcher {
    HookDispatcher::new()
}

fn push_tag(
    log: &Arc<Mutex<Vec<String>>>,
    tag: &'static str,
) -> impl Fn(Option<&Value>, Value) -> Result<HookFlow, HookError> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_params, last_return| {
        log.lock().expect("log lock").push(tag.to_owned());
        Ok(HookFlow::Continue(last_return))
    }
}

#[rstest]
fn empty_call_returns_null(dispatcher: HookDispatcher) {
    let value = dispatcher
        .call(names::STATUS_GET_OS_PID, None)
        .expect("empty call succeeds");
    assert_eq!(value, Value::Null);
    assert!(dispatcher.is_empty());
}

#[rstest]
fn handlers_run_in_registration_order(dispatcher: HookDispatcher) {
    let log = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        dispatcher.register(names::STATUS_ON_STARTUP, push_tag(&log, tag));
    }

    dispatcher
        .call(names::STATUS_ON_STARTUP, None)
        .expect("call succeeds");

    assert_eq!(*log.lock().expect("log lock"), ["first", "second", "third"]);
    assert_eq!(dispatcher.handler_count(names::STATUS_ON_STARTUP), 3);
}

#[rstest]
fn last_return_threads_through_the_chain(dispatcher: HookDispatcher) {
    dispatcher.register("Math.sum", |params: Option<&Value>, _last: Value| {
        let start = params.and_then(Value::as_i64).unwrap_or_default();
        Ok(HookFlow::Continue(json!(start)))
    });
    dispatcher.register("Math.sum", |_params: Option<&Value>, last: Value| {
        Ok(HookFlow::Continue(json!(last.as_i64().unwrap_or_default() + 10)))
    });

    let value = dispatcher
        .call("Math.sum", Some(&json!(5)))
        .expect("call succeeds");
    assert_eq!(value, json!(15));
}

#[rstest]
fn halt_stops_the_chain(dispatcher: HookDispatcher) {
    let log = Arc::new(Mutex::new(Vec::new()));
    dispatcher.register(names::STATUS_STOP, push_tag(&log, "before"));
    dispatcher.register(names::STATUS_STOP, |_params: Option<&Value>, _last: Value| {
        Ok(HookFlow::Halt(json!("halted")))
    });
    dispatcher.register(names::STATUS_STOP, push_tag(&log, "after"));

    let value = dispatcher
        .call(names::STATUS_STOP, None)
        .expect("call succeeds");

    assert_eq!(value, json!("halted"));
    assert_eq!(*log.lock().expect("log lock"), ["before"]);
}

#[rstest]
fn failing_handler_aborts_call(dispatcher: HookDispatcher) {
    let log = Arc::new(Mutex::new(Vec::new()));
    dispatcher.register(names::STATUS_ON_STARTUP, push_tag(&log, "http"));
    dispatcher.register(names::STATUS_ON_STARTUP, |_params: Option<&Value>, _last: Value| {
        Err(HookError::failed("database unavailable"))
    });
    dispatcher.register(names::STATUS_ON_STARTUP, push_tag(&log, "upnp"));

    let error = dispatcher
        .call(names::STATUS_ON_STARTUP, None)
        .expect_err("call must fail");

    assert_eq!(error.to_string(), "database unavailable");
    assert_eq!(*log.lock().expect("log lock"), ["http"]);
    assert_eq!(dispatcher.handler_count(names::STATUS_ON_STARTUP), 3);
}

#[rstest]
fn best_effort_call_runs_past_failures(dispatcher: HookDispatcher) {
    let log = Arc::new(Mutex::new(Vec::new()));
    dispatcher.register(names::STATUS_ON_SHUTDOWN, |_params: Option<&Value>, _last: Value| {
        Ok(HookFlow::Continue(json!("kept")))
    });
    dispatcher.register(names::STATUS_ON_SHUTDOWN, |_params: Option<&Value>, _last: Value| {
        Err(HookError::failed("http did not stop"))
    });
    dispatcher.register(names::STATUS_ON_SHUTDOWN, push_tag(&log, "upnp"));

    let (value, failures) = dispatcher.call_best_effort(names::STATUS_ON_SHUTDOWN, None);

    assert_eq!(value, json!("kept"));
    assert_eq!(failures.len(), 1);
    assert_eq!(*log.lock().expect("log lock"), ["upnp"]);
}

#[rstest]
fn free_drops_every_registration(dispatcher: HookDispatcher) {
    dispatcher.register(names::STATUS_GET_OS_PID, |_params: Option<&Value>, _last: Value| {
        Ok(HookFlow::Continue(json!(42)))
    });
    dispatcher.register(names::PLUGINS_RELOAD, |_params: Option<&Value>, last: Value| {
        Ok(HookFlow::Continue(last))
    });

    dispatcher.free();

    assert!(dispatcher.is_empty());
    assert_eq!(
        dispatcher
            .call(names::STATUS_GET_OS_PID, None)
            .expect("call succeeds"),
        Value::Null
    );
}

#[rstest]
fn handlers_may_call_back_into_the_dispatcher() {
    let dispatcher = Arc::new(HookDispatcher::new());
    dispatcher.register("Inner.value", |_params: Option<&Value>, _last: Value| {
        Ok(HookFlow::Continue(json!("inner")))
    });
    let reentrant = Arc::clone(&dispatcher);
    dispatcher.register("Outer.value", move |_params: Option<&Value>, _last: Value| {
        reentrant.call("Inner.value", None).map(HookFlow::Continue)
    });

    let value = dispatcher.call("Outer.value", None).expect("call succeeds");
    assert_eq!(value, json!("inner"));
}

#[rstest]
#[case::plain("Status.getOSPid", Ok(HookName::new("Status.getOSPid")))]
#[case::padded("  Plugins.reload\n", Ok(HookName::new("Plugins.reload")))]
#[case::empty("", Err(HookNameError::Blank))]
#[case::blank("   ", Err(HookNameError::Blank))]
#[case::spaced("Status stop", Err(HookNameError::Whitespace("Status stop".to_owned())))]
fn hook_names_parse_from_untrusted_text(
    #[case] input: &str,
    #[case] expected: Result<HookName, HookNameError>,
) {
    assert_eq!(input.parse::<HookName>(), expected);
}
