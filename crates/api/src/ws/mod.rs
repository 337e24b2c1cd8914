//! Live event channel for dashboard clients.
//!
//! Each WebSocket connection is one [`EventBroadcaster`] subscriber; the
//! handler forwards events as JSON text frames and pings the client on a
//! fixed interval.
//!
//! [`EventBroadcaster`]: llmdash_events::EventBroadcaster

mod handler;

pub use handler::ws_handler;
