//! The `remindme` command: submit reminders, or run the scheduling process
//! that fires them.

pub mod channel;
pub mod cli;
pub mod client;
pub mod error;
pub mod notify;
pub mod pidfile;
pub mod server;

pub use error::{ServerError, SubmitError};
