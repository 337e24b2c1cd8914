//! Operator script domain logic.
//!
//! A script is a named, ordered list of shell command templates loaded from
//! a JSON catalog. Commands are wrapped for their execution environment
//! ([`wrap`]), spawned through `sh -c` ([`executor`], [`subprocess`]), and
//! sequenced by the [`runner`]. Nothing here touches the database or the
//! live channel; the API crate's supervisor bridges runner events to
//! subscribers.

pub mod catalog;
pub mod executor;
pub mod runner;
pub mod status;
pub mod subprocess;
pub mod wrap;
