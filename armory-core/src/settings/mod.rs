//! Operator-facing configuration.

pub mod config;

pub use config::{CompatConfig, FlagsConfig, ScannerConfig, Settings, UnknownFlagPolicy};
