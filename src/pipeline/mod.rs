//! Monitoring pipeline.
//!
//! - `Monitor`: fetch → extract → dedup → notify, once or on an interval

pub mod monitor;

pub use monitor::{CycleReport, Monitor, MonitorStatus, StartOutcome, StopOutcome};
