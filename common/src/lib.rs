//! # Forge Common
//!
//! Models shared by every crate in the workspace.
//!
//! * [`domain`]: the validated [`domain::Domain`] that keys all state.
//! * [`source`]: which passive reconnaissance sources a scan may use.
//! * [`record`]: scan history records and their stable identifiers.
//! * [`monitor`]: per-domain monitoring state as seen by callers.
//! * [`config`]: runtime settings for sources, probes and the scheduler.
//! * [`error`]: the error taxonomy surfaced by the core.

pub mod config;
pub mod domain;
pub mod error;
pub mod monitor;
pub mod record;
pub mod source;

pub use domain::Domain;
pub use error::ForgeError;
