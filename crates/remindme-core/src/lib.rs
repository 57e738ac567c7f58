//! `remindme-core`: types shared by the submitting CLI and the scheduling
//! process: reminder descriptors and their wire parser, error types, and
//! layered configuration.

pub mod config;
pub mod descriptor;
pub mod error;

pub use config::RemindmeConfig;
pub use descriptor::{Descriptor, Destination, DurationUnit, When};
pub use error::{ParseError, RemindmeError, Result};
