//! # Forge Core
//!
//! The recon engine: source aggregation, liveness probing, scan history,
//! screenshots and the monitor loop, tied together by [`ReconService`].

pub mod aggregator;
pub mod engine;
pub mod export;
pub mod monitor;
pub mod prober;
pub mod service;
pub mod snapshot;
pub mod store;

pub use monitor::{CycleReport, DomainOutcome, MonitorHandle, MonitorScheduler};
pub use service::{MonitorOptions, ReconService, ScanOptions};
