//! Hook names shared by the daemon and its control client.

/// Returns the daemon's operating-system process id.
pub const STATUS_GET_OS_PID: &str = "Status.getOSPid";

/// Returns the daemon start time as Unix seconds.
pub const STATUS_GET_TIME_STARTED: &str = "Status.getTimeStarted";

/// Returns the seconds elapsed since the daemon started.
pub const STATUS_GET_UPTIME: &str = "Status.getUptime";

/// Asks the daemon to shut down.
pub const STATUS_STOP: &str = "Status.stop";

/// Fired once subsystems should start.
pub const STATUS_ON_STARTUP: &str = "Status.onStartup";

/// Fired once subsystems should stop.
pub const STATUS_ON_SHUTDOWN: &str = "Status.onShutdown";

/// Asks the daemon to reload its plugins.
pub const PLUGINS_RELOAD: &str = "Plugins.reload";
