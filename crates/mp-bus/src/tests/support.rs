//! Shared helpers for bus tests.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use mp_config::{BusChannel, SocketEndpoint};
use mp_hooks::{HookDispatcher, HookFlow, names};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{BusClient, BusError, BusServer, BusStopHandle, ClientError};

pub(super) const TEST_CHANNEL: &str = "test_bus";
pub(super) const TEST_PID: u32 = 4242;

/// Channel backed by a socket file in a private temporary directory.
pub(super) struct TestChannel {
    _dir: TempDir,
    channel: BusChannel,
}

impl TestChannel {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("mp").join(format!("{TEST_CHANNEL}.sock"));
        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
        Self {
            _dir: dir,
            channel: BusChannel::new(TEST_CHANNEL, endpoint),
        }
    }

    pub(super) fn channel(&self) -> &BusChannel {
        &self.channel
    }
}

/// Dispatcher answering the status hooks a daemon would register.
pub(super) fn status_dispatcher() -> Arc<HookDispatcher> {
    let dispatcher = Arc::new(HookDispatcher::new());
    dispatcher.register(
        names::STATUS_GET_OS_PID,
        |_params: Option<&Value>, _last: Value| Ok(HookFlow::Continue(json!(TEST_PID))),
    );
    dispatcher.register("Echo.params", |params: Option<&Value>, _last: Value| {
        Ok(HookFlow::Continue(params.cloned().unwrap_or(Value::Null)))
    });
    dispatcher.register("Broken.hook", |_params: Option<&Value>, _last: Value| {
        Err(mp_hooks::HookError::failed("handler exploded"))
    });
    dispatcher
}

/// A bus server running its accept loop on a background thread.
pub(super) struct RunningServer {
    stop: BusStopHandle,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningServer {
    pub(super) fn start(
        channel: &BusChannel,
        dispatcher: Arc<HookDispatcher>,
    ) -> Result<Self, BusError> {
        let server = BusServer::bind(channel)?;
        let stop = server.stop_handle();
        let stop_on_request = stop.clone();
        dispatcher.register(names::STATUS_STOP, move |_params: Option<&Value>, last: Value| {
            stop_on_request.stop();
            Ok(HookFlow::Continue(last))
        });
        let thread = thread::spawn(move || server.run(&dispatcher));
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    pub(super) fn shutdown(&mut self) {
        self.stop.stop();
        if let Some(thread) = self.thread.take() {
            thread.join().expect("join bus server");
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Polls `connect` until it reports that no daemon is listening.
pub(super) fn wait_for_no_such_daemon(channel: &BusChannel, bound: Duration) -> bool {
    let deadline = Instant::now() + bound;
    while Instant::now() < deadline {
        match BusClient::connect(channel) {
            Err(ClientError::NoSuchDaemon { .. }) => return true,
            Err(_) | Ok(_) => thread::sleep(Duration::from_millis(100)),
        }
    }
    false
}
