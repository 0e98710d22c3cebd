pub mod catalog;
pub mod config;
pub mod error;
pub mod event_log;
pub mod models;
pub mod session;
pub mod status;

pub use error::CoreError;
pub use status::{EntryStatus, Status};
