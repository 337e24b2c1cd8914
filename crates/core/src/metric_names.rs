//! Live-channel event type names.
//!
//! These are the `type` discriminators of frames pushed to dashboard
//! subscribers over the WebSocket channel.

/// A device reported a new sample.
pub const EVENT_METRICS_UPDATE: &str = "metrics_update";

/// One log line from the running script.
pub const EVENT_SCRIPT_LOG: &str = "script_log";

/// Terminal event of a script run.
pub const EVENT_SCRIPT_FINISHED: &str = "script_finished";

/// Greeting sent once to a freshly connected subscriber.
pub const EVENT_CONNECTED: &str = "connected";
