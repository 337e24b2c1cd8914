//! Live-update fan-out for the dashboard.
//!
//! - [`EventBroadcaster`]: in-process publish/subscribe hub with one bounded
//!   queue per subscriber.
//! - [`DashboardEvent`]: the event envelope pushed to live clients.

pub mod bus;

pub use bus::{DashboardEvent, EventBroadcaster, Subscription, SubscriberId};
